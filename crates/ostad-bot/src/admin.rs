//! Admin panel: registry CRUD, admins, texts, required channels, stats,
//! broadcast and direct messages.
//!
//! Multi-step admin dialogues are stored as `AdminFlow` in the same
//! session slot a submission uses. Every entry point, and every typed
//! answer inside a flow, re-checks the admin gate.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use ostad_db::registry::ItemRemoval;
use ostad_db::{PAGE_SIZE, is_constraint_violation};
use ostad_types::action::{Action, ListTarget};
use ostad_types::models::{ChatId, ExperienceStatus, RegistryKind, UserId};
use ostad_types::update::{Button, Keyboard, MessageRef, OutgoingMessage};
use ostad_types::{MAX_MESSAGE_LENGTH, MAX_NAME_LENGTH};

use crate::access::AdminRemoval;
use crate::dispatcher::CallbackReply;
use crate::format::clamp;
use crate::keyboards;
use crate::messenger::respond;
use crate::session::Session;
use crate::submission::machine::{ValidationError, parse_id, validate_len};
use crate::submission::validation_message;
use crate::texts::TextStore;
use crate::{AppState, BotError, BotResult};

/// Pause between two broadcast deliveries.
pub const BROADCAST_DELAY: Duration = Duration::from_millis(50);

/// What the admin is being asked to type next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminFlow {
    /// `parent_id` is the Field of a new Major or the Major of a new Course.
    NewItemName { kind: RegistryKind, parent_id: Option<i64> },
    RenameItem { kind: RegistryKind, id: i64 },
    NewAdminId,
    EditText { key: String },
    BroadcastMessage,
    DirectUserId,
    DirectMessage { user_id: UserId },
    ChannelId,
    ChannelLink { channel_id: ChatId },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub sent: usize,
    pub failed: usize,
}

fn kind_label(texts: &TextStore, kind: RegistryKind) -> String {
    texts.get(match kind {
        RegistryKind::Field => "kind_field",
        RegistryKind::Major => "kind_major",
        RegistryKind::Course => "kind_course",
        RegistryKind::Professor => "kind_professor",
    })
}

fn with_note(note: String, message: OutgoingMessage) -> OutgoingMessage {
    OutgoingMessage {
        text: clamp(&format!("{note}\n\n{}", message.text), MAX_MESSAGE_LENGTH),
        keyboard: message.keyboard,
    }
}

/// Store `flow` and ask for its first answer.
async fn begin(
    state: &AppState,
    admin_id: UserId,
    flow: AdminFlow,
    prompt: String,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.sessions.save(admin_id, &Session::Admin(flow))?;
    let message = OutgoingMessage::text(prompt).with_keyboard(keyboards::cancel_admin_flow(&state.texts));
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(())
}

async fn send(state: &AppState, chat_id: ChatId, message: OutgoingMessage) -> BotResult<()> {
    state.messenger.send(chat_id, message).await?;
    Ok(())
}

// -- Panel and listings --

pub async fn panel(state: &AppState, admin_id: UserId, origin: Option<MessageRef>) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let message = OutgoingMessage::text(state.texts.get("admin_panel_welcome"))
        .with_keyboard(keyboards::admin_panel(&state.texts));
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(())
}

pub async fn list(
    state: &AppState,
    admin_id: UserId,
    target: ListTarget,
    page: u32,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let message = list_message(state, target, page)?;
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(())
}

fn list_message(state: &AppState, target: ListTarget, page: u32) -> BotResult<OutgoingMessage> {
    match target {
        ListTarget::Registry(kind) => registry_list(state, kind, page),
        ListTarget::Admins => admin_list(state, page),
        ListTarget::Texts => text_list(state, page),
        ListTarget::Channels => channel_list(state),
    }
}

fn registry_list(state: &AppState, kind: RegistryKind, page: u32) -> BotResult<OutgoingMessage> {
    let texts = &state.texts;
    let page = state.db.page_items(kind, page, PAGE_SIZE)?;

    let mut rows: Vec<Vec<Button>> = page
        .items
        .iter()
        .map(|item| {
            vec![
                Button::action(format!("✏️ {}", item.name), Action::EditItem(kind, item.id)),
                Button::action("🗑", Action::DeleteItem(kind, item.id)),
            ]
        })
        .collect();
    rows.extend(keyboards::nav_row(texts, &page, |p| {
        Action::List(ListTarget::Registry(kind), p)
    }));
    rows.push(vec![Button::action(
        texts.format("btn_add_item", &[("kind", &kind_label(texts, kind))]),
        Action::AddItem(kind),
    )]);
    rows.push(keyboards::back_to_panel(texts));

    let header = texts.format(kind.header_key(), &[("total", &page.total)]);
    Ok(OutgoingMessage::text(header).with_keyboard(Keyboard::Inline(rows)))
}

fn admin_list(state: &AppState, page: u32) -> BotResult<OutgoingMessage> {
    let texts = &state.texts;
    let owner = state.access.owner_id();
    let page = state.db.page_admins(page, PAGE_SIZE)?;

    let mut rows: Vec<Vec<Button>> = page
        .items
        .iter()
        .map(|&id| {
            if id == owner {
                vec![Button::action(format!("👑 {id}"), Action::Noop)]
            } else {
                vec![
                    Button::action(id.to_string(), Action::Noop),
                    Button::action("🗑", Action::DeleteAdmin(id)),
                ]
            }
        })
        .collect();
    rows.extend(keyboards::nav_row(texts, &page, |p| Action::List(ListTarget::Admins, p)));
    rows.push(vec![Button::action(texts.get("btn_add_admin"), Action::AddAdmin)]);
    rows.push(keyboards::back_to_panel(texts));

    let header = texts.format("admin_manage_admins_header", &[("total", &page.total)]);
    Ok(OutgoingMessage::text(header).with_keyboard(Keyboard::Inline(rows)))
}

fn text_list(state: &AppState, page: u32) -> BotResult<OutgoingMessage> {
    let texts = &state.texts;
    let page = texts.page(page, PAGE_SIZE)?;

    let mut rows: Vec<Vec<Button>> = page
        .items
        .iter()
        .map(|t| vec![Button::action(t.key.clone(), Action::EditText(t.key.clone()))])
        .collect();
    rows.extend(keyboards::nav_row(texts, &page, |p| Action::List(ListTarget::Texts, p)));
    rows.push(keyboards::back_to_panel(texts));

    Ok(OutgoingMessage::text(texts.get("admin_manage_texts_header"))
        .with_keyboard(Keyboard::Inline(rows)))
}

fn channel_list(state: &AppState) -> BotResult<OutgoingMessage> {
    let texts = &state.texts;
    let enabled = state.db.force_subscribe()?;
    let channels = state.db.required_channels()?;

    let mut rows: Vec<Vec<Button>> = channels
        .iter()
        .map(|ch| {
            vec![
                Button::url(ch.channel_id.to_string(), ch.invite_link.clone()),
                Button::action("🗑", Action::DeleteChannel(ch.channel_id)),
            ]
        })
        .collect();
    rows.push(vec![Button::action(
        texts.get("btn_toggle_force_subscribe"),
        Action::ToggleForceSubscribe,
    )]);
    rows.push(vec![Button::action(texts.get("btn_add_channel"), Action::AddChannel)]);
    rows.push(keyboards::back_to_panel(texts));

    let status = texts.get(if enabled { "force_subscribe_on" } else { "force_subscribe_off" });
    let header = texts.format(
        "admin_manage_channels_header",
        &[("status", &status), ("total", &channels.len())],
    );
    Ok(OutgoingMessage::text(header).with_keyboard(Keyboard::Inline(rows)))
}

pub async fn review_queue(
    state: &AppState,
    admin_id: UserId,
    page: u32,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let texts = &state.texts;
    let page = state.db.page_by_status(ExperienceStatus::Pending, page, PAGE_SIZE)?;
    let header = if page.total == 0 {
        texts.get("review_queue_empty")
    } else {
        texts.format("review_queue_header", &[("total", &page.total)])
    };
    let message = OutgoingMessage::text(header).with_keyboard(keyboards::review_queue(texts, &page));
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(())
}

pub async fn stats(state: &AppState, admin_id: UserId, origin: Option<MessageRef>) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let s = state.db.stats()?;
    let text = state.texts.format(
        "admin_stats",
        &[
            ("users", &s.users),
            ("pending", &s.pending),
            ("approved", &s.approved),
            ("rejected", &s.rejected),
            ("fields", &s.fields),
            ("majors", &s.majors),
            ("courses", &s.courses),
            ("professors", &s.professors),
        ],
    );
    let message = OutgoingMessage::text(text)
        .with_keyboard(Keyboard::Inline(vec![keyboards::back_to_panel(&state.texts)]));
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(())
}

// -- Registry CRUD --

pub async fn add_item(
    state: &AppState,
    admin_id: UserId,
    kind: RegistryKind,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let texts = &state.texts;
    match kind {
        RegistryKind::Field | RegistryKind::Professor => {
            let prompt = texts.format("ask_for_new_item_name", &[("kind", &kind_label(texts, kind))]);
            begin(state, admin_id, AdminFlow::NewItemName { kind, parent_id: None }, prompt, origin).await
        }
        RegistryKind::Major | RegistryKind::Course => {
            let fields = state.db.list_fields()?;
            if fields.is_empty() {
                let message = OutgoingMessage::text(texts.get("no_fields_available"))
                    .with_keyboard(Keyboard::Inline(vec![keyboards::back_to_panel(texts)]));
                respond(&*state.messenger, admin_id, origin, message).await?;
                return Ok(());
            }
            let mut rows = keyboards::choices(
                fields.into_iter().map(|f| (f.id, f.name)),
                |id| Action::ChooseParentField(kind, id),
            );
            rows.push(vec![Button::action(texts.get("btn_cancel"), Action::CancelAdminFlow)]);
            let message =
                OutgoingMessage::text(texts.get("select_parent_field")).with_keyboard(Keyboard::Inline(rows));
            respond(&*state.messenger, admin_id, origin, message).await?;
            Ok(())
        }
    }
}

pub async fn choose_parent_field(
    state: &AppState,
    admin_id: UserId,
    kind: RegistryKind,
    field_id: i64,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let texts = &state.texts;
    if state.db.get_item(RegistryKind::Field, field_id)?.is_none() {
        return Err(BotError::NotFound(format!("field {field_id}")));
    }

    if kind != RegistryKind::Course {
        let prompt = texts.format("ask_for_new_item_name", &[("kind", &kind_label(texts, kind))]);
        let parent_id = (kind == RegistryKind::Major).then_some(field_id);
        return begin(state, admin_id, AdminFlow::NewItemName { kind, parent_id }, prompt, origin).await;
    }

    let majors = state.db.list_majors(field_id)?;
    let (key, mut rows) = if majors.is_empty() {
        ("no_majors_available", Vec::new())
    } else {
        (
            "select_parent_major",
            keyboards::choices(majors.into_iter().map(|m| (m.id, m.name)), Action::ChooseParentMajor),
        )
    };
    rows.push(vec![Button::action(texts.get("btn_cancel"), Action::CancelAdminFlow)]);
    let message = OutgoingMessage::text(texts.get(key)).with_keyboard(Keyboard::Inline(rows));
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(())
}

pub async fn choose_parent_major(
    state: &AppState,
    admin_id: UserId,
    major_id: i64,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    if state.db.get_major(major_id)?.is_none() {
        return Err(BotError::NotFound(format!("major {major_id}")));
    }
    let texts = &state.texts;
    let prompt = texts.format(
        "ask_for_new_item_name",
        &[("kind", &kind_label(texts, RegistryKind::Course))],
    );
    let flow = AdminFlow::NewItemName {
        kind: RegistryKind::Course,
        parent_id: Some(major_id),
    };
    begin(state, admin_id, flow, prompt, origin).await
}

pub async fn edit_item(
    state: &AppState,
    admin_id: UserId,
    kind: RegistryKind,
    id: i64,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let item = state
        .db
        .get_item(kind, id)?
        .ok_or_else(|| BotError::NotFound(format!("{kind:?} {id}")))?;
    let prompt = state
        .texts
        .format("ask_for_update_item_name", &[("name", &item.name)]);
    begin(state, admin_id, AdminFlow::RenameItem { kind, id }, prompt, origin).await
}

pub async fn delete_item(
    state: &AppState,
    admin_id: UserId,
    kind: RegistryKind,
    id: i64,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let item = state
        .db
        .get_item(kind, id)?
        .ok_or_else(|| BotError::NotFound(format!("{kind:?} {id}")))?;
    let key = match kind {
        RegistryKind::Field | RegistryKind::Major => "confirm_delete_cascade",
        RegistryKind::Course | RegistryKind::Professor => "confirm_delete",
    };
    let message = OutgoingMessage::text(state.texts.format(key, &[("name", &item.name)])).with_keyboard(
        keyboards::confirm_delete(
            &state.texts,
            Action::ConfirmDeleteItem(kind, id),
            Action::List(ListTarget::Registry(kind), 1),
        ),
    );
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(())
}

pub async fn confirm_delete_item(
    state: &AppState,
    admin_id: UserId,
    kind: RegistryKind,
    id: i64,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let item = state
        .db
        .get_item(kind, id)?
        .ok_or_else(|| BotError::NotFound(format!("{kind:?} {id}")))?;
    let note = match state.db.delete_item(kind, id)? {
        ItemRemoval::Deleted => {
            info!("Admin {} deleted {:?} '{}' ({})", admin_id, kind, item.name, id);
            state
                .texts
                .format("item_deleted_successfully", &[("name", &item.name)])
        }
        ItemRemoval::InUse(count) => state
            .texts
            .format("item_in_use", &[("name", &item.name), ("count", &count)]),
        ItemRemoval::NotFound => return Err(BotError::NotFound(format!("{kind:?} {id}"))),
    };
    let message = with_note(note, registry_list(state, kind, 1)?);
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(())
}

// -- Admins --

pub async fn add_admin(state: &AppState, admin_id: UserId, origin: Option<MessageRef>) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let prompt = state.texts.get("ask_admin_id");
    begin(state, admin_id, AdminFlow::NewAdminId, prompt, origin).await
}

pub async fn delete_admin(
    state: &AppState,
    admin_id: UserId,
    target: UserId,
    origin: Option<MessageRef>,
) -> BotResult<CallbackReply> {
    state.access.require_admin(admin_id)?;
    if target == state.access.owner_id() {
        return Ok(CallbackReply::Alert(state.texts.get("cannot_delete_owner")));
    }
    let message = OutgoingMessage::text(
        state
            .texts
            .format("confirm_delete", &[("name", &target)]),
    )
    .with_keyboard(keyboards::confirm_delete(
        &state.texts,
        Action::ConfirmDeleteAdmin(target),
        Action::List(ListTarget::Admins, 1),
    ));
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(CallbackReply::Ack)
}

pub async fn confirm_delete_admin(
    state: &AppState,
    admin_id: UserId,
    target: UserId,
    origin: Option<MessageRef>,
) -> BotResult<CallbackReply> {
    state.access.require_admin(admin_id)?;
    match state.access.delete_admin(target)? {
        AdminRemoval::Owner => Ok(CallbackReply::Alert(state.texts.get("cannot_delete_owner"))),
        AdminRemoval::NotAnAdmin => Ok(CallbackReply::Alert(state.texts.get("item_not_found"))),
        AdminRemoval::Removed => {
            let note = state.texts.format("admin_removed", &[("id", &target)]);
            let message = with_note(note, admin_list(state, 1)?);
            respond(&*state.messenger, admin_id, origin, message).await?;
            Ok(CallbackReply::Ack)
        }
    }
}

// -- Texts --

pub async fn edit_text(
    state: &AppState,
    admin_id: UserId,
    key: &str,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let current = state
        .db
        .get_text(key)?
        .ok_or_else(|| BotError::NotFound(format!("text '{key}'")))?;
    let prompt = clamp(
        &state
            .texts
            .format("ask_for_update_text_value", &[("key", &key), ("value", &current)]),
        MAX_MESSAGE_LENGTH,
    );
    let flow = AdminFlow::EditText { key: key.to_string() };
    begin(state, admin_id, flow, prompt, origin).await
}

// -- Channels --

pub async fn add_channel(state: &AppState, admin_id: UserId, origin: Option<MessageRef>) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let prompt = state.texts.get("ask_channel_id");
    begin(state, admin_id, AdminFlow::ChannelId, prompt, origin).await
}

pub async fn delete_channel(
    state: &AppState,
    admin_id: UserId,
    channel_id: ChatId,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    if !state.db.delete_required_channel(channel_id)? {
        return Err(BotError::NotFound(format!("channel {channel_id}")));
    }
    info!("Admin {} removed required channel {}", admin_id, channel_id);
    let note = state.texts.format("channel_removed", &[("id", &channel_id)]);
    let message = with_note(note, channel_list(state)?);
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(())
}

pub async fn toggle_force_subscribe(
    state: &AppState,
    admin_id: UserId,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let enabled = state.db.toggle_force_subscribe()?;
    info!("Admin {} set force-subscribe to {}", admin_id, enabled);
    respond(&*state.messenger, admin_id, origin, channel_list(state)?).await?;
    Ok(())
}

// -- Messaging --

pub async fn start_broadcast(state: &AppState, admin_id: UserId, origin: Option<MessageRef>) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let prompt = state.texts.get("ask_broadcast_message");
    begin(state, admin_id, AdminFlow::BroadcastMessage, prompt, origin).await
}

pub async fn start_direct_message(
    state: &AppState,
    admin_id: UserId,
    origin: Option<MessageRef>,
) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    let prompt = state.texts.get("ask_user_id");
    begin(state, admin_id, AdminFlow::DirectUserId, prompt, origin).await
}

/// Send `text` to every known user, one at a time. Failed deliveries are
/// counted and skipped.
pub async fn broadcast(state: &AppState, text: &str, delay: Duration) -> BotResult<Tally> {
    let mut tally = Tally::default();
    for user_id in state.db.all_user_ids()? {
        match state.messenger.send(user_id, OutgoingMessage::text(text)).await {
            Ok(_) => tally.sent += 1,
            Err(e) => {
                tally.failed += 1;
                warn!("Broadcast to {} failed: {}", user_id, e);
            }
        }
        tokio::time::sleep(delay).await;
    }
    info!("Broadcast finished: {} sent, {} failed", tally.sent, tally.failed);
    Ok(tally)
}

/// Run the broadcast in the background and report the tally to the admin.
fn spawn_broadcast(state: AppState, admin_id: UserId, text: String) {
    tokio::spawn(async move {
        let report = match broadcast(&state, &text, BROADCAST_DELAY).await {
            Ok(tally) => state.texts.format(
                "broadcast_finished",
                &[("sent", &tally.sent), ("failed", &tally.failed)],
            ),
            Err(e) => {
                error!("Broadcast aborted: {}", e);
                state.texts.get("error_generic")
            }
        };
        if let Err(e) = state.messenger.send(admin_id, OutgoingMessage::text(report)).await {
            warn!("Could not report broadcast result to {}: {}", admin_id, e);
        }
    });
}

pub async fn cancel_flow(state: &AppState, admin_id: UserId, origin: Option<MessageRef>) -> BotResult<()> {
    state.access.require_admin(admin_id)?;
    state.sessions.clear(admin_id)?;
    panel(state, admin_id, origin).await
}

// -- Typed answers --

/// One typed answer inside an admin flow.
pub async fn handle_text(state: &AppState, admin_id: UserId, flow: AdminFlow, text: &str) -> BotResult<()> {
    if !state.access.is_admin(admin_id)? {
        state.sessions.clear(admin_id)?;
        return Err(BotError::Unauthorized(admin_id));
    }
    let texts = &state.texts;
    let done = |text: String| {
        OutgoingMessage::text(text).with_keyboard(Keyboard::Inline(vec![keyboards::back_to_panel(texts)]))
    };

    match flow {
        AdminFlow::NewItemName { kind, parent_id } => {
            let name = match validate_len(text, MAX_NAME_LENGTH) {
                Ok(name) => name,
                Err(e) => return reprompt(state, admin_id, &e).await,
            };
            let added = match (kind, parent_id) {
                (RegistryKind::Field, _) => state.db.add_field(&name),
                (RegistryKind::Professor, _) => state.db.add_professor(&name),
                (RegistryKind::Major, Some(field_id)) => state.db.add_major(field_id, &name),
                (RegistryKind::Course, Some(major_id)) => state.db.add_course(major_id, &name),
                (RegistryKind::Major | RegistryKind::Course, None) => {
                    state.sessions.clear(admin_id)?;
                    return Err(BotError::Validation(format!("{kind:?} needs a parent")));
                }
            };
            match added {
                Ok(id) => {
                    state.sessions.clear(admin_id)?;
                    info!("Admin {} added {:?} '{}' ({})", admin_id, kind, name, id);
                    let note = texts.format("item_added_successfully", &[("name", &name)]);
                    send(state, admin_id, with_note(note, registry_list(state, kind, 1)?)).await
                }
                Err(e) if is_constraint_violation(&e) => {
                    send(state, admin_id, OutgoingMessage::text(texts.get("item_conflict"))).await
                }
                Err(e) => Err(e.into()),
            }
        }

        AdminFlow::RenameItem { kind, id } => {
            let name = match validate_len(text, MAX_NAME_LENGTH) {
                Ok(name) => name,
                Err(e) => return reprompt(state, admin_id, &e).await,
            };
            match state.db.rename_item(kind, id, &name) {
                Ok(true) => {
                    state.sessions.clear(admin_id)?;
                    let note = texts.format("item_updated_successfully", &[("name", &name)]);
                    send(state, admin_id, with_note(note, registry_list(state, kind, 1)?)).await
                }
                Ok(false) => {
                    state.sessions.clear(admin_id)?;
                    Err(BotError::NotFound(format!("{kind:?} {id}")))
                }
                Err(e) if is_constraint_violation(&e) => {
                    send(state, admin_id, OutgoingMessage::text(texts.get("item_conflict"))).await
                }
                Err(e) => Err(e.into()),
            }
        }

        AdminFlow::NewAdminId => {
            let user_id = match parse_id(text) {
                Ok(id) => id,
                Err(e) => return reprompt(state, admin_id, &e).await,
            };
            state.sessions.clear(admin_id)?;
            let key = if state.access.add_admin(user_id)? {
                info!("Admin {} granted admin to {}", admin_id, user_id);
                "admin_added"
            } else {
                "admin_already_exists"
            };
            send(state, admin_id, done(texts.format(key, &[("id", &user_id)]))).await
        }

        AdminFlow::EditText { key } => {
            let value = match validate_len(text, MAX_MESSAGE_LENGTH) {
                Ok(value) => value,
                Err(e) => return reprompt(state, admin_id, &e).await,
            };
            state.sessions.clear(admin_id)?;
            if !texts.set(&key, &value)? {
                return Err(BotError::NotFound(format!("text '{key}'")));
            }
            info!("Admin {} updated text '{}'", admin_id, key);
            send(state, admin_id, done(texts.format("text_updated", &[("key", &key)]))).await
        }

        AdminFlow::BroadcastMessage => {
            let message = match validate_len(text, MAX_MESSAGE_LENGTH) {
                Ok(message) => message,
                Err(e) => return reprompt(state, admin_id, &e).await,
            };
            state.sessions.clear(admin_id)?;
            spawn_broadcast(state.clone(), admin_id, message);
            send(state, admin_id, done(texts.get("broadcast_started"))).await
        }

        AdminFlow::DirectUserId => {
            let user_id = match parse_id(text) {
                Ok(id) => id,
                Err(e) => return reprompt(state, admin_id, &e).await,
            };
            let prompt = texts.format("ask_direct_message", &[("id", &user_id)]);
            state
                .sessions
                .save(admin_id, &Session::Admin(AdminFlow::DirectMessage { user_id }))?;
            send(
                state,
                admin_id,
                OutgoingMessage::text(prompt).with_keyboard(keyboards::cancel_admin_flow(texts)),
            )
            .await
        }

        AdminFlow::DirectMessage { user_id } => {
            let message = match validate_len(text, MAX_MESSAGE_LENGTH) {
                Ok(message) => message,
                Err(e) => return reprompt(state, admin_id, &e).await,
            };
            state.sessions.clear(admin_id)?;
            let report = match state.messenger.send(user_id, OutgoingMessage::text(message)).await {
                Ok(_) => texts.format("direct_message_sent", &[("id", &user_id)]),
                Err(e) => {
                    warn!("Direct message from {} to {} failed: {}", admin_id, user_id, e);
                    texts.format("direct_message_failed", &[("id", &user_id), ("error", &e)])
                }
            };
            send(state, admin_id, done(report)).await
        }

        AdminFlow::ChannelId => {
            let channel_id = match parse_id(text) {
                Ok(id) => id,
                Err(e) => return reprompt(state, admin_id, &e).await,
            };
            state
                .sessions
                .save(admin_id, &Session::Admin(AdminFlow::ChannelLink { channel_id }))?;
            send(
                state,
                admin_id,
                OutgoingMessage::text(texts.get("ask_channel_link"))
                    .with_keyboard(keyboards::cancel_admin_flow(texts)),
            )
            .await
        }

        AdminFlow::ChannelLink { channel_id } => {
            let link = text.trim();
            if !(link.starts_with("https://") || link.starts_with("http://")) {
                return send(state, admin_id, OutgoingMessage::text(texts.get("error_invalid_link"))).await;
            }
            state.db.add_required_channel(channel_id, link)?;
            state.sessions.clear(admin_id)?;
            info!("Admin {} added required channel {}", admin_id, channel_id);
            let note = texts.format("channel_added", &[("id", &channel_id)]);
            send(state, admin_id, with_note(note, channel_list(state)?)).await
        }
    }
}

/// Validation failed: explain and keep the flow where it is.
async fn reprompt(state: &AppState, admin_id: UserId, error: &ValidationError) -> BotResult<()> {
    let message = OutgoingMessage::text(validation_message(&state.texts, error))
        .with_keyboard(keyboards::cancel_admin_flow(&state.texts));
    send(state, admin_id, message).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation;
    use crate::testing::{OWNER, sample_experiences, seed_registry, test_state};

    async fn answer(state: &AppState, admin_id: UserId, text: &str) -> BotResult<()> {
        match state.sessions.load(admin_id).unwrap() {
            Some(Session::Admin(flow)) => handle_text(state, admin_id, flow, text).await,
            other => panic!("no admin flow in progress: {other:?}"),
        }
    }

    fn flow(state: &AppState, admin_id: UserId) -> Option<AdminFlow> {
        match state.sessions.load(admin_id).unwrap() {
            Some(Session::Admin(flow)) => Some(flow),
            _ => None,
        }
    }

    #[tokio::test]
    async fn add_major_asks_for_parent_field_first() {
        let (state, _) = test_state();
        let field = state.db.add_field("Engineering").unwrap();

        add_item(&state, OWNER, RegistryKind::Major, None).await.unwrap();
        assert_eq!(flow(&state, OWNER), None);

        choose_parent_field(&state, OWNER, RegistryKind::Major, field, None).await.unwrap();
        assert_eq!(
            flow(&state, OWNER),
            Some(AdminFlow::NewItemName {
                kind: RegistryKind::Major,
                parent_id: Some(field)
            })
        );

        answer(&state, OWNER, "  CS  ").await.unwrap();
        let majors = state.db.list_majors(field).unwrap();
        assert_eq!(majors.len(), 1);
        assert_eq!(majors[0].name, "CS");
        assert_eq!(flow(&state, OWNER), None);
    }

    #[tokio::test]
    async fn add_course_walks_field_then_major() {
        let (state, _) = test_state();
        let reg = seed_registry(&state);

        add_item(&state, OWNER, RegistryKind::Course, None).await.unwrap();
        choose_parent_field(&state, OWNER, RegistryKind::Course, reg.field, None).await.unwrap();
        assert_eq!(flow(&state, OWNER), None);
        choose_parent_major(&state, OWNER, reg.major, None).await.unwrap();
        answer(&state, OWNER, "Data Structures").await.unwrap();

        let names: Vec<_> = state
            .db
            .list_courses(reg.major)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Algorithms", "Data Structures"]);
    }

    #[tokio::test]
    async fn duplicate_name_keeps_flow_for_retry() {
        let (state, messenger) = test_state();
        state.db.add_field("Engineering").unwrap();

        add_item(&state, OWNER, RegistryKind::Field, None).await.unwrap();
        answer(&state, OWNER, "Engineering").await.unwrap();

        assert_eq!(messenger.last_to(OWNER).unwrap().text, state.texts.get("item_conflict"));
        assert!(flow(&state, OWNER).is_some());

        answer(&state, OWNER, "Science").await.unwrap();
        assert_eq!(state.db.list_fields().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn deleting_field_cascades_through_confirmation() {
        let (state, _) = test_state();
        let reg = seed_registry(&state);

        delete_item(&state, OWNER, RegistryKind::Field, reg.field, None).await.unwrap();
        assert!(state.db.get_major(reg.major).unwrap().is_some());

        confirm_delete_item(&state, OWNER, RegistryKind::Field, reg.field, None)
            .await
            .unwrap();
        assert!(state.db.get_major(reg.major).unwrap().is_none());
        assert!(state.db.get_course(reg.course).unwrap().is_none());

        assert!(matches!(
            confirm_delete_item(&state, OWNER, RegistryKind::Field, reg.field, None).await,
            Err(BotError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn published_experience_keeps_its_registry_rows() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, 9, 1)[0];
        moderation::approve(&state, OWNER, id, None).await.unwrap();
        let exp = state.db.get_experience(id).unwrap().unwrap();

        for (kind, row) in [
            (RegistryKind::Professor, exp.professor_id),
            (RegistryKind::Field, exp.field_id),
        ] {
            messenger.clear();
            confirm_delete_item(&state, OWNER, kind, row, None).await.unwrap();
            assert!(messenger.texts_to(OWNER)[0].contains("used by 1 experience"));
        }

        assert!(state.db.get_experience(id).unwrap().is_some());
        assert!(state.db.get_course(exp.course_id).unwrap().is_some());
        assert_eq!(
            moderation::redact(&state, OWNER, id, None).await.unwrap(),
            moderation::RedactOutcome::Redacted
        );
    }

    #[tokio::test]
    async fn demoted_admin_cannot_finish_flow() {
        let (state, _) = test_state();
        state.access.add_admin(5).unwrap();
        add_item(&state, 5, RegistryKind::Field, None).await.unwrap();
        state.access.delete_admin(5).unwrap();

        assert!(matches!(
            answer(&state, 5, "Engineering").await,
            Err(BotError::Unauthorized(5))
        ));
        assert!(state.db.list_fields().unwrap().is_empty());
        assert_eq!(flow(&state, 5), None);
    }

    #[tokio::test]
    async fn admin_id_must_be_numeric() {
        let (state, messenger) = test_state();
        add_admin(&state, OWNER, None).await.unwrap();

        answer(&state, OWNER, "bob").await.unwrap();
        assert_eq!(
            messenger.last_to(OWNER).unwrap().text,
            state.texts.get("error_not_a_number")
        );
        assert_eq!(flow(&state, OWNER), Some(AdminFlow::NewAdminId));

        answer(&state, OWNER, "4242").await.unwrap();
        assert!(state.access.is_admin(4242).unwrap());
        assert_eq!(flow(&state, OWNER), None);
    }

    #[tokio::test]
    async fn owner_cannot_be_deleted() {
        let (state, _) = test_state();
        let reply = delete_admin(&state, OWNER, OWNER, None).await.unwrap();
        assert_eq!(reply, CallbackReply::Alert(state.texts.get("cannot_delete_owner")));
        let reply = confirm_delete_admin(&state, OWNER, OWNER, None).await.unwrap();
        assert_eq!(reply, CallbackReply::Alert(state.texts.get("cannot_delete_owner")));
        assert!(state.db.is_admin(OWNER).unwrap());
    }

    #[tokio::test]
    async fn broadcast_tolerates_failures() {
        let (state, messenger) = test_state();
        for user in [10, 11, 12] {
            state.db.upsert_user(user, None).unwrap();
        }
        messenger.make_unreachable(11);

        let tally = broadcast(&state, "Hello all", Duration::ZERO).await.unwrap();
        assert_eq!(tally, Tally { sent: 2, failed: 1 });
        assert_eq!(messenger.texts_to(12), ["Hello all"]);
    }

    #[tokio::test]
    async fn text_edit_changes_value() {
        let (state, _) = test_state();
        edit_text(&state, OWNER, "welcome", None).await.unwrap();
        answer(&state, OWNER, "Salam!").await.unwrap();
        assert_eq!(state.texts.get("welcome"), "Salam!");
    }

    #[tokio::test]
    async fn required_channel_flow_validates_link() {
        let (state, messenger) = test_state();
        add_channel(&state, OWNER, None).await.unwrap();
        answer(&state, OWNER, "-100123").await.unwrap();
        assert_eq!(
            flow(&state, OWNER),
            Some(AdminFlow::ChannelLink { channel_id: -100123 })
        );

        answer(&state, OWNER, "not a link").await.unwrap();
        assert_eq!(
            messenger.last_to(OWNER).unwrap().text,
            state.texts.get("error_invalid_link")
        );

        answer(&state, OWNER, "https://t.me/+invite").await.unwrap();
        let channels = state.db.required_channels().unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].channel_id, -100123);
        assert_eq!(flow(&state, OWNER), None);
    }

    #[tokio::test]
    async fn direct_message_reports_delivery() {
        let (state, messenger) = test_state();
        start_direct_message(&state, OWNER, None).await.unwrap();
        answer(&state, OWNER, "77").await.unwrap();
        answer(&state, OWNER, "Your review needs a course name").await.unwrap();

        assert_eq!(messenger.texts_to(77), ["Your review needs a course name"]);
        assert_eq!(
            messenger.last_to(OWNER).unwrap().text,
            state.texts.format("direct_message_sent", &[("id", &77)])
        );
    }

    #[tokio::test]
    async fn professor_listing_pages_by_name() {
        let (state, messenger) = test_state();
        for i in 0..12 {
            state.db.add_professor(&format!("Prof {i:02}")).unwrap();
        }

        list(&state, OWNER, ListTarget::Registry(RegistryKind::Professor), 2, None)
            .await
            .unwrap();
        let listing = messenger.last_to(OWNER).unwrap();
        let actions = listing.keyboard.as_ref().unwrap().actions();
        let edits: Vec<_> = actions
            .iter()
            .filter(|a| matches!(a, Action::EditItem(..)))
            .collect();
        assert_eq!(edits.len(), 2);
        assert!(actions.contains(&&Action::List(ListTarget::Registry(RegistryKind::Professor), 1)));
        assert!(!actions.contains(&&Action::List(ListTarget::Registry(RegistryKind::Professor), 3)));
    }

    #[tokio::test]
    async fn stats_and_queue_reflect_pending_work() {
        let (state, messenger) = test_state();
        let ids = sample_experiences(&state, 9, 3);

        stats(&state, OWNER, None).await.unwrap();
        let text = messenger.last_to(OWNER).unwrap().text;
        assert!(text.contains('3'), "{text}");

        review_queue(&state, OWNER, 1, None).await.unwrap();
        let queue = messenger.last_to(OWNER).unwrap();
        let first = queue.keyboard.as_ref().unwrap().actions()[0].clone();
        assert_eq!(first, Action::ViewExperience(ids[2]));
    }

    #[tokio::test]
    async fn non_admin_sees_nothing() {
        let (state, messenger) = test_state();
        assert!(matches!(
            panel(&state, 66, None).await,
            Err(BotError::Unauthorized(66))
        ));
        assert!(matches!(
            toggle_force_subscribe(&state, 66, None).await,
            Err(BotError::Unauthorized(66))
        ));
        assert!(!state.db.force_subscribe().unwrap());
        assert!(messenger.log().is_empty());
    }
}

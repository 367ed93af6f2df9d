//! Routes every decoded update to its handler.
//!
//! Updates from one user are handled one at a time under that user's
//! session lock. Handler errors never escape: they are logged and turned
//! into a short message (or callback alert) for the user.

use tracing::{debug, error, warn};

use ostad_types::action::Action;
use ostad_types::models::UserId;
use ostad_types::update::{MessageRef, OutgoingMessage, Sender, Update};

use crate::access::Gate;
use crate::format::status_label;
use crate::keyboards;
use crate::moderation::{self, Decision, RedactOutcome};
use crate::session::Session;
use crate::{AppState, BotError, BotResult, admin, search, submission};

/// How a button press is acknowledged. Every callback gets exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackReply {
    Ack,
    /// Brief notice at the top of the chat.
    Toast(String),
    /// Modal popup the user has to dismiss.
    Alert(String),
}

impl CallbackReply {
    fn parts(&self) -> (Option<&str>, bool) {
        match self {
            Self::Ack => (None, false),
            Self::Toast(text) => (Some(text), false),
            Self::Alert(text) => (Some(text), true),
        }
    }
}

pub async fn handle_update(state: &AppState, update: Update) {
    let user_id = update.sender().id;
    let _guard = state.sessions.lock(user_id).await;

    match update {
        Update::Message { from, chat_id, text } => {
            if chat_id != from.id {
                debug!("Ignoring message from {} in non-private chat {}", from.id, chat_id);
                return;
            }
            if let Err(e) = on_message(state, &from, &text).await {
                let notice = error_text(state, user_id, e);
                if let Err(e) = state.messenger.send(user_id, OutgoingMessage::text(notice)).await {
                    warn!("Could not report error to {}: {}", user_id, e);
                }
            }
        }

        Update::Callback {
            id,
            from,
            message,
            action,
        } => {
            let reply = match action {
                Some(action) => match on_callback(state, from.id, action, message).await {
                    Ok(reply) => reply,
                    Err(e) => CallbackReply::Alert(error_text(state, user_id, e)),
                },
                None => CallbackReply::Alert(state.texts.get("button_expired")),
            };
            let (text, alert) = reply.parts();
            if let Err(e) = state.messenger.answer_callback(&id, text, alert).await {
                debug!("Callback {} could not be answered: {}", id, e);
            }
        }

        Update::InlineQuery { id, from, query } => {
            if let Err(e) = on_inline_query(state, from.id, &id, &query).await {
                warn!("Inline query from {} failed: {}", from.id, e);
            }
        }
    }
}

/// Text shown to the user for a handler error.
fn error_text(state: &AppState, user_id: UserId, err: BotError) -> String {
    let texts = &state.texts;
    match err {
        BotError::Unauthorized(_) => texts.get("not_an_admin"),
        BotError::NotFound(what) => {
            debug!("User {} asked for missing {}", user_id, what);
            texts.get("item_not_found")
        }
        BotError::Validation(reason) => {
            debug!("Invalid input from {}: {}", user_id, reason);
            texts.get("error_invalid_input")
        }
        BotError::Storage(e) => {
            error!("Storage error while serving {}: {:#}", user_id, e);
            if let Err(e) = state.sessions.clear(user_id) {
                error!("Could not reset session of {}: {}", user_id, e);
            }
            texts.get("error_generic")
        }
        BotError::Messenger(e) => {
            warn!("Delivery failed while serving {}: {}", user_id, e);
            texts.get("error_generic")
        }
    }
}

/// `/cmd@botname args` -> (`/cmd`, `args`). `None` for plain text.
fn split_command(text: &str) -> Option<(&str, &str)> {
    if !text.starts_with('/') {
        return None;
    }
    let (head, args) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let command = head.split_once('@').map_or(head, |(cmd, _)| cmd);
    Some((command, args.trim()))
}

// -- Messages --

async fn on_message(state: &AppState, from: &Sender, text: &str) -> BotResult<()> {
    let user_id = from.id;
    let texts = &state.texts;
    let text = text.trim();
    state.db.upsert_user(user_id, from.first_name.as_deref())?;

    let command = split_command(text);
    if matches!(command, Some(("/cancel", _))) || texts.matches("btn_cancel", text) {
        return submission::cancel(state, user_id, None).await;
    }

    if !pass_gate(state, user_id).await? {
        return Ok(());
    }

    if let Some((command, args)) = command {
        match command {
            "/start" => {
                state.sessions.clear(user_id)?;
                let welcome = OutgoingMessage::text(texts.get("welcome"))
                    .with_keyboard(keyboards::main_menu(texts));
                state.messenger.send(user_id, welcome).await?;
                return Ok(());
            }
            "/admin" => {
                state.sessions.clear(user_id)?;
                return admin::panel(state, user_id, None).await;
            }
            "/search" => return search::user_search(state, user_id, args).await,
            "/find" => return search::admin_find(state, user_id, args).await,
            "/rules" => return send_rules(state, user_id).await,
            _ => {}
        }
    } else if texts.matches("btn_submit_experience", text) {
        return submission::start(state, user_id).await;
    } else if texts.matches("btn_my_experiences", text) {
        state.sessions.clear(user_id)?;
        return moderation::list_own(state, user_id, None).await;
    } else if texts.matches("btn_rules", text) {
        return send_rules(state, user_id).await;
    }

    match state.sessions.load(user_id)? {
        Some(Session::Submission(s)) if command.is_none() => submission::handle_text(state, s, text).await,
        Some(Session::Admin(flow)) if command.is_none() => admin::handle_text(state, user_id, flow, text).await,
        _ => {
            let message = OutgoingMessage::text(texts.get("unknown_command"))
                .with_keyboard(keyboards::main_menu(texts));
            state.messenger.send(user_id, message).await?;
            Ok(())
        }
    }
}

async fn send_rules(state: &AppState, user_id: UserId) -> BotResult<()> {
    state
        .messenger
        .send(user_id, OutgoingMessage::text(state.texts.get("rules")))
        .await?;
    Ok(())
}

/// Inline answers carry published content, so they sit behind the same
/// gate. A blocked user gets an empty result list; inline mode has no
/// room for the join prompt.
async fn on_inline_query(state: &AppState, user_id: UserId, query_id: &str, query: &str) -> BotResult<()> {
    match state.access.check_subscription(user_id).await? {
        Gate::Open => search::inline(state, query_id, query).await,
        Gate::Blocked(missing) => {
            debug!("Inline query from {} blocked by {} channel(s)", user_id, missing.len());
            state.messenger.answer_inline(query_id, Vec::new()).await?;
            Ok(())
        }
    }
}

/// Force-subscribe gate. On a block, the join prompt goes out and
/// `false` comes back.
async fn pass_gate(state: &AppState, user_id: UserId) -> BotResult<bool> {
    match state.access.check_subscription(user_id).await? {
        Gate::Open => Ok(true),
        Gate::Blocked(missing) => {
            debug!("User {} blocked by {} required channel(s)", user_id, missing.len());
            let prompt = OutgoingMessage::text(state.texts.get("join_required"))
                .with_keyboard(keyboards::join_channels(&state.texts, &missing));
            state.messenger.send(user_id, prompt).await?;
            Ok(false)
        }
    }
}

// -- Callbacks --

async fn on_callback(
    state: &AppState,
    user_id: UserId,
    action: Action,
    origin: Option<MessageRef>,
) -> BotResult<CallbackReply> {
    let texts = &state.texts;

    if action == Action::CheckMembership {
        return match state.access.check_subscription(user_id).await? {
            Gate::Open => {
                let welcome = OutgoingMessage::text(texts.get("welcome"))
                    .with_keyboard(keyboards::main_menu(texts));
                state.messenger.send(user_id, welcome).await?;
                Ok(CallbackReply::Toast(texts.get("membership_confirmed")))
            }
            Gate::Blocked(_) => Ok(CallbackReply::Alert(texts.get("still_not_member"))),
        };
    }

    if !pass_gate(state, user_id).await? {
        return Ok(CallbackReply::Alert(texts.get("join_required")));
    }

    let ack = |_: ()| CallbackReply::Ack;
    let found = |shown: bool| {
        if shown {
            CallbackReply::Ack
        } else {
            CallbackReply::Alert(texts.get("experience_not_found"))
        }
    };

    let reply = match action {
        Action::SelectField(_)
        | Action::SelectMajor(_)
        | Action::SelectCourse(_)
        | Action::SelectProfessor(_)
        | Action::AddNewProfessor
        | Action::Attendance(_) => submission::handle_action(state, user_id, &action, origin).await?,
        Action::CancelSubmission => ack(submission::cancel(state, user_id, origin).await?),
        Action::CheckMembership => CallbackReply::Ack,

        Action::MyExperiences => ack(moderation::list_own(state, user_id, origin).await?),
        Action::ViewOwnExperience(id) => found(moderation::view_own(state, user_id, id, origin).await?),
        Action::Resubmit(id) => match moderation::resubmit(state, user_id, id, origin).await? {
            Decision::AlreadyDecided(_) => CallbackReply::Alert(texts.get("already_pending")),
            other => decision_reply(state, other),
        },
        Action::EditExperience(id) => {
            edit_reply(state, moderation::request_edit(state, user_id, id, origin).await?)
        }
        Action::ConfirmEditExperience(id) => {
            edit_reply(state, moderation::confirm_edit(state, user_id, id, origin).await?)
        }

        Action::ViewExperience(id) => found(moderation::view(state, user_id, id, origin).await?),
        Action::Approve(id) => decision_reply(state, moderation::approve(state, user_id, id, origin).await?),
        Action::Reject(id) => {
            decision_reply(state, moderation::reject_prompt(state, user_id, id, origin).await?)
        }
        Action::RejectWithReason(id, reason) => decision_reply(
            state,
            moderation::reject(state, user_id, id, reason, origin).await?,
        ),
        Action::Redact(id) => match moderation::redact(state, user_id, id, origin).await? {
            RedactOutcome::Redacted => CallbackReply::Toast(texts.get("redact_success")),
            RedactOutcome::AlreadyRedacted => CallbackReply::Alert(texts.get("already_redacted")),
            RedactOutcome::NotPublished => CallbackReply::Alert(texts.get("redact_not_published")),
            RedactOutcome::NotFound => CallbackReply::Alert(texts.get("experience_not_found")),
        },
        Action::ReviewQueue(page) => ack(admin::review_queue(state, user_id, page, origin).await?),

        Action::AdminPanel => {
            state.sessions.clear(user_id)?;
            ack(admin::panel(state, user_id, origin).await?)
        }
        Action::List(target, page) => ack(admin::list(state, user_id, target, page, origin).await?),
        Action::AddItem(kind) => ack(admin::add_item(state, user_id, kind, origin).await?),
        Action::ChooseParentField(kind, id) => {
            ack(admin::choose_parent_field(state, user_id, kind, id, origin).await?)
        }
        Action::ChooseParentMajor(id) => ack(admin::choose_parent_major(state, user_id, id, origin).await?),
        Action::EditItem(kind, id) => ack(admin::edit_item(state, user_id, kind, id, origin).await?),
        Action::DeleteItem(kind, id) => ack(admin::delete_item(state, user_id, kind, id, origin).await?),
        Action::ConfirmDeleteItem(kind, id) => {
            ack(admin::confirm_delete_item(state, user_id, kind, id, origin).await?)
        }
        Action::AddAdmin => ack(admin::add_admin(state, user_id, origin).await?),
        Action::DeleteAdmin(target) => admin::delete_admin(state, user_id, target, origin).await?,
        Action::ConfirmDeleteAdmin(target) => {
            admin::confirm_delete_admin(state, user_id, target, origin).await?
        }
        Action::EditText(key) => ack(admin::edit_text(state, user_id, &key, origin).await?),
        Action::AddChannel => ack(admin::add_channel(state, user_id, origin).await?),
        Action::DeleteChannel(id) => ack(admin::delete_channel(state, user_id, id, origin).await?),
        Action::ToggleForceSubscribe => {
            admin::toggle_force_subscribe(state, user_id, origin).await?;
            CallbackReply::Toast(texts.get("force_subscribe_toggled"))
        }
        Action::Stats => ack(admin::stats(state, user_id, origin).await?),
        Action::Broadcast => ack(admin::start_broadcast(state, user_id, origin).await?),
        Action::DirectMessage => ack(admin::start_direct_message(state, user_id, origin).await?),
        Action::CancelAdminFlow => ack(admin::cancel_flow(state, user_id, origin).await?),

        Action::Noop => CallbackReply::Ack,
    };
    Ok(reply)
}

fn decision_reply(state: &AppState, decision: Decision) -> CallbackReply {
    match decision {
        Decision::Applied => CallbackReply::Ack,
        Decision::AlreadyDecided(status) => CallbackReply::Alert(state.texts.format(
            "already_decided",
            &[("status", &status_label(&state.texts, status))],
        )),
        Decision::NotFound => CallbackReply::Alert(state.texts.get("experience_not_found")),
    }
}

fn edit_reply(state: &AppState, decision: Decision) -> CallbackReply {
    match decision {
        Decision::AlreadyDecided(_) => CallbackReply::Alert(state.texts.get("edit_not_pending")),
        other => decision_reply(state, other),
    }
}

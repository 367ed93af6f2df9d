//! Moderation lifecycle: pending -> approved | rejected, resubmission,
//! edit-resubmission and redaction of published posts.
//!
//! Every status write goes through a conditional update in `ostad-db`
//! that re-reads the row inside the same transaction, so two admins
//! deciding on the same experience cannot both win.

use tracing::{debug, info, warn};

use ostad_db::experiences::StatusChange;
use ostad_types::MAX_MESSAGE_LENGTH;
use ostad_types::models::{Experience, ExperienceStatus, RejectionReason, UserId};
use ostad_types::update::{MessageRef, OutgoingMessage};

use crate::format::{clamp, moderation_view, render_experience, render_redacted, status_label};
use crate::keyboards;
use crate::messenger::{MessengerError, respond};
use crate::submission;
use crate::{AppState, BotError, BotResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Applied,
    /// The experience is no longer in the state the action expects.
    AlreadyDecided(ExperienceStatus),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactOutcome {
    Redacted,
    AlreadyRedacted,
    /// Only approved experiences with a channel post can be redacted.
    NotPublished,
    NotFound,
}

impl From<StatusChange> for Decision {
    fn from(change: StatusChange) -> Self {
        match change {
            StatusChange::Applied => Self::Applied,
            StatusChange::Conflict(status) => Self::AlreadyDecided(status),
            StatusChange::Missing => Self::NotFound,
        }
    }
}

// -- Admin side --

/// Fan the moderation prompt out to every admin. The first delivered
/// message is remembered on the experience. Returns how many admins were
/// reached.
pub async fn submit(state: &AppState, id: i64) -> BotResult<usize> {
    let Some(exp) = state.db.get_experience(id)? else {
        return Err(BotError::NotFound(format!("experience {id}")));
    };

    let texts = &state.texts;
    let text = format!(
        "{}\n\n{}",
        texts.format("admin_new_experience_notification", &[("id", &id)]),
        moderation_view(texts, &exp)
    );
    let message = OutgoingMessage::text(clamp(&text, MAX_MESSAGE_LENGTH))
        .with_keyboard(keyboards::approval(texts, id));

    let mut delivered = 0;
    for admin_id in state.db.list_admins()? {
        match state.messenger.send(admin_id, message.clone()).await {
            Ok(sent) => {
                if delivered == 0 {
                    state.db.set_admin_message(id, sent)?;
                }
                delivered += 1;
            }
            Err(e) => warn!("Could not notify admin {} about experience {}: {}", admin_id, id, e),
        }
    }

    info!("Experience {} sent for review to {} admin(s)", id, delivered);
    Ok(delivered)
}

/// Show one experience with the controls its status allows.
pub async fn view(state: &AppState, admin_id: UserId, id: i64, origin: Option<MessageRef>) -> BotResult<bool> {
    state.access.require_admin(admin_id)?;
    let Some(exp) = state.db.get_experience(id)? else {
        return Ok(false);
    };
    respond(&*state.messenger, admin_id, origin, admin_view(state, &exp, None)).await?;
    Ok(true)
}

pub async fn approve(
    state: &AppState,
    admin_id: UserId,
    id: i64,
    origin: Option<MessageRef>,
) -> BotResult<Decision> {
    state.access.require_admin(admin_id)?;
    let Some(exp) = state.db.get_experience(id)? else {
        return Ok(Decision::NotFound);
    };
    if exp.status != ExperienceStatus::Pending {
        refresh_admin_views(state, &exp, origin, None).await;
        return Ok(Decision::AlreadyDecided(exp.status));
    }

    let post = state
        .messenger
        .send(
            state.config.channel_id,
            OutgoingMessage::text(clamp(&render_experience(&state.texts, &exp), MAX_MESSAGE_LENGTH)),
        )
        .await?;

    // Status and channel pointer land in one commit. If another admin got
    // there first the post just made is taken down again.
    let change = match state.db.approve_experience(id, post.message_id) {
        Ok(change) => change,
        Err(e) => {
            retract(state, post).await;
            return Err(e.into());
        }
    };
    if change != StatusChange::Applied {
        retract(state, post).await;
        return Ok(change.into());
    }
    info!(
        "Experience {} approved by {} (channel message {})",
        id, admin_id, post.message_id
    );

    if let Some(old) = exp.channel_message_id {
        retract(
            state,
            MessageRef {
                chat_id: state.config.channel_id,
                message_id: old,
            },
        )
        .await;
    }

    notify_submitter(
        state,
        exp.user_id,
        state.texts.format(
            "user_approval_notification",
            &[("course", &exp.course_name), ("professor", &exp.professor_name)],
        ),
    )
    .await;

    let note = state.texts.format("admin_approval_success", &[("id", &id), ("admin", &admin_id)]);
    let fresh = state.db.get_experience(id)?.unwrap_or(exp);
    refresh_admin_views(state, &fresh, origin, Some(note)).await;
    Ok(Decision::Applied)
}

/// Swap the approve/reject buttons for the list of rejection reasons.
pub async fn reject_prompt(
    state: &AppState,
    admin_id: UserId,
    id: i64,
    origin: Option<MessageRef>,
) -> BotResult<Decision> {
    state.access.require_admin(admin_id)?;
    let Some(exp) = state.db.get_experience(id)? else {
        return Ok(Decision::NotFound);
    };
    if exp.status != ExperienceStatus::Pending {
        return Ok(Decision::AlreadyDecided(exp.status));
    }

    let texts = &state.texts;
    let text = format!(
        "{}\n\n{}",
        texts.get("rejection_reason_prompt"),
        moderation_view(texts, &exp)
    );
    let message = OutgoingMessage::text(clamp(&text, MAX_MESSAGE_LENGTH))
        .with_keyboard(keyboards::rejection_reasons(texts, id));
    respond(&*state.messenger, admin_id, origin, message).await?;
    Ok(Decision::Applied)
}

pub async fn reject(
    state: &AppState,
    admin_id: UserId,
    id: i64,
    reason: RejectionReason,
    origin: Option<MessageRef>,
) -> BotResult<Decision> {
    state.access.require_admin(admin_id)?;
    let Some(exp) = state.db.get_experience(id)? else {
        return Ok(Decision::NotFound);
    };

    let change = state.db.reject_experience(id)?;
    if change != StatusChange::Applied {
        if let Some(current) = state.db.get_experience(id)? {
            refresh_admin_views(state, &current, origin, None).await;
        }
        return Ok(change.into());
    }
    info!("Experience {} rejected by {} ({})", id, admin_id, reason.code());

    let reason_label = state.texts.get(&reason.text_key());
    notify_submitter(
        state,
        exp.user_id,
        state.texts.format(
            "user_rejection_notification",
            &[
                ("course", &exp.course_name),
                ("professor", &exp.professor_name),
                ("reason", &reason_label),
            ],
        ),
    )
    .await;

    let note = state.texts.format(
        "admin_rejection_success",
        &[("id", &id), ("admin", &admin_id), ("reason", &reason_label)],
    );
    let fresh = state.db.get_experience(id)?.unwrap_or(exp);
    refresh_admin_views(state, &fresh, origin, Some(note)).await;
    Ok(Decision::Applied)
}

/// Replace the free-text sections of a published post with the
/// placeholder. A second call reports `AlreadyRedacted`.
pub async fn redact(
    state: &AppState,
    admin_id: UserId,
    id: i64,
    origin: Option<MessageRef>,
) -> BotResult<RedactOutcome> {
    state.access.require_admin(admin_id)?;
    let Some(exp) = state.db.get_experience(id)? else {
        return Ok(RedactOutcome::NotFound);
    };
    let (ExperienceStatus::Approved, Some(message_id)) = (exp.status, exp.channel_message_id) else {
        return Ok(RedactOutcome::NotPublished);
    };
    if exp.redacted {
        return Ok(RedactOutcome::AlreadyRedacted);
    }

    let post = MessageRef {
        chat_id: state.config.channel_id,
        message_id,
    };
    let body = clamp(&render_redacted(&state.texts, &exp), MAX_MESSAGE_LENGTH);
    match state.messenger.edit(post, OutgoingMessage::text(body)).await {
        Ok(()) => {}
        Err(MessengerError::NotModified) => {
            state.db.mark_redacted(id)?;
            return Ok(RedactOutcome::AlreadyRedacted);
        }
        Err(e) => return Err(e.into()),
    }

    if !state.db.mark_redacted(id)? {
        return Ok(RedactOutcome::AlreadyRedacted);
    }
    info!("Experience {} redacted by {}", id, admin_id);

    let note = state.texts.format("admin_redact_success", &[("id", &id)]);
    let fresh = state.db.get_experience(id)?.unwrap_or(exp);
    refresh_admin_views(state, &fresh, origin, Some(note)).await;
    Ok(RedactOutcome::Redacted)
}

fn admin_view(state: &AppState, exp: &Experience, note: Option<&str>) -> OutgoingMessage {
    let view = moderation_view(&state.texts, exp);
    let text = match note {
        Some(note) => format!("{note}\n\n{view}"),
        None => view,
    };
    let message = OutgoingMessage::text(clamp(&text, MAX_MESSAGE_LENGTH));
    match keyboards::moderation(&state.texts, exp) {
        Some(keyboard) => message.with_keyboard(keyboard),
        None => message,
    }
}

/// Bring the pressed message and the stored moderation message up to
/// date. Failures only cost a stale view.
async fn refresh_admin_views(
    state: &AppState,
    exp: &Experience,
    pressed: Option<MessageRef>,
    note: Option<String>,
) {
    let stored = match (exp.admin_chat_id, exp.admin_message_id) {
        (Some(chat_id), Some(message_id)) => Some(MessageRef { chat_id, message_id }),
        _ => None,
    };
    let mut targets: Vec<MessageRef> = pressed.into_iter().collect();
    if let Some(stored) = stored.filter(|s| !targets.contains(s)) {
        targets.push(stored);
    }

    let message = admin_view(state, exp, note.as_deref());
    for target in targets {
        match state.messenger.edit(target, message.clone()).await {
            Ok(()) | Err(MessengerError::NotModified) => {}
            Err(e) => warn!(
                "Could not update moderation view {}/{}: {}",
                target.chat_id, target.message_id, e
            ),
        }
    }
}

async fn retract(state: &AppState, post: MessageRef) {
    if let Err(e) = state.messenger.delete(post).await {
        warn!("Could not delete channel post {}: {}", post.message_id, e);
    }
}

async fn notify_submitter(state: &AppState, user_id: UserId, text: String) {
    if let Err(e) = state.messenger.send(user_id, OutgoingMessage::text(text)).await {
        warn!("Could not notify submitter {}: {}", user_id, e);
    }
}

// -- Submitter side --

pub async fn list_own(state: &AppState, user_id: UserId, origin: Option<MessageRef>) -> BotResult<()> {
    let texts = &state.texts;
    let exps = state.db.experiences_by_user(user_id)?;
    let message = if exps.is_empty() {
        OutgoingMessage::text(texts.get("my_experiences_empty"))
    } else {
        OutgoingMessage::text(texts.get("my_experiences_header"))
            .with_keyboard(keyboards::own_experiences(texts, &exps))
    };
    respond(&*state.messenger, user_id, origin, message).await?;
    Ok(())
}

pub async fn view_own(
    state: &AppState,
    user_id: UserId,
    id: i64,
    origin: Option<MessageRef>,
) -> BotResult<bool> {
    let Some(exp) = own_experience(state, user_id, id)? else {
        return Ok(false);
    };
    let texts = &state.texts;
    let text = format!(
        "{}\n\n{}",
        texts.format("own_experience_status", &[("status", &status_label(texts, exp.status))]),
        render_experience(texts, &exp)
    );
    let message = OutgoingMessage::text(clamp(&text, MAX_MESSAGE_LENGTH))
        .with_keyboard(keyboards::own_experience(texts, &exp));
    respond(&*state.messenger, user_id, origin, message).await?;
    Ok(true)
}

/// `approved | rejected -> pending` and a fresh round of notifications.
pub async fn resubmit(
    state: &AppState,
    user_id: UserId,
    id: i64,
    origin: Option<MessageRef>,
) -> BotResult<Decision> {
    let change = state.db.reset_for_review(id, user_id)?;
    if change != StatusChange::Applied {
        return Ok(change.into());
    }
    info!("Experience {} sent back for review by user {}", id, user_id);

    submit(state, id).await?;
    respond(
        &*state.messenger,
        user_id,
        origin,
        OutgoingMessage::text(state.texts.get("resubmit_success")),
    )
    .await?;
    Ok(Decision::Applied)
}

/// First half of edit-resubmission: ask before throwing the row away.
pub async fn request_edit(
    state: &AppState,
    user_id: UserId,
    id: i64,
    origin: Option<MessageRef>,
) -> BotResult<Decision> {
    let Some(exp) = own_experience(state, user_id, id)? else {
        return Ok(Decision::NotFound);
    };
    if exp.status != ExperienceStatus::Pending {
        return Ok(Decision::AlreadyDecided(exp.status));
    }

    let message = OutgoingMessage::text(state.texts.get("confirm_edit_experience"))
        .with_keyboard(keyboards::confirm_edit(&state.texts, id));
    respond(&*state.messenger, user_id, origin, message).await?;
    Ok(Decision::Applied)
}

/// Delete the pending row and run the submission dialogue again.
pub async fn confirm_edit(
    state: &AppState,
    user_id: UserId,
    id: i64,
    origin: Option<MessageRef>,
) -> BotResult<Decision> {
    let Some(exp) = own_experience(state, user_id, id)? else {
        return Ok(Decision::NotFound);
    };

    let change = state.db.delete_pending_experience(id, user_id)?;
    if change != StatusChange::Applied {
        return Ok(change.into());
    }

    if let (Some(chat_id), Some(message_id)) = (exp.admin_chat_id, exp.admin_message_id) {
        let notice = state.texts.format("admin_experience_withdrawn", &[("id", &id)]);
        if let Err(e) = state
            .messenger
            .edit(MessageRef { chat_id, message_id }, OutgoingMessage::text(notice))
            .await
        {
            debug!("Could not mark moderation message of {} as withdrawn: {}", id, e);
        }
    }

    if let Some(origin) = origin {
        if let Err(e) = respond(
            &*state.messenger,
            user_id,
            Some(origin),
            OutgoingMessage::text(state.texts.get("edit_started")),
        )
        .await
        {
            debug!("Could not confirm edit of {} to user {}: {}", id, user_id, e);
        }
    }
    submission::start(state, user_id).await?;
    Ok(Decision::Applied)
}

fn own_experience(state: &AppState, user_id: UserId, id: i64) -> BotResult<Option<Experience>> {
    Ok(state.db.get_experience(id)?.filter(|exp| exp.user_id == user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::Messenger;
    use crate::session::Session;
    use crate::submission::machine::Step;
    use crate::testing::{CHANNEL, OWNER, sample_experiences, test_state};

    const SUBMITTER: UserId = 300;

    #[tokio::test]
    async fn approving_seven_publishes_and_stamps_channel_message() {
        let (state, messenger) = test_state();
        let ids = sample_experiences(&state, SUBMITTER, 7);
        let id = ids[6];
        assert_eq!(id, 7);

        assert_eq!(approve(&state, OWNER, id, None).await.unwrap(), Decision::Applied);

        let posts = messenger.sent_refs_to(CHANNEL);
        assert_eq!(posts.len(), 1);
        let exp = state.db.get_experience(id).unwrap().unwrap();
        assert_eq!(exp.status, ExperienceStatus::Approved);
        assert_eq!(exp.channel_message_id, Some(posts[0].message_id));
        assert!(messenger.content(posts[0]).unwrap().contains("#Dr._Smith"));

        let note = messenger.last_to(SUBMITTER).unwrap().text;
        assert!(note.contains("Algorithms"), "{note}");
    }

    #[tokio::test]
    async fn rejecting_forty_two_as_insulting_tells_submitter() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 42)[41];
        assert_eq!(id, 42);

        let decision = reject(&state, OWNER, id, RejectionReason::Insulting, None)
            .await
            .unwrap();
        assert_eq!(decision, Decision::Applied);
        assert_eq!(
            state.db.get_experience(id).unwrap().unwrap().status,
            ExperienceStatus::Rejected
        );

        let note = messenger.last_to(SUBMITTER).unwrap().text;
        assert!(note.contains(&state.texts.get("btn_reject_reason_insulting")), "{note}");
        assert!(note.to_lowercase().contains("insulting"), "{note}");
        assert!(note.contains("Algorithms"), "{note}");
        assert!(messenger.sent_refs_to(CHANNEL).is_empty());
    }

    #[tokio::test]
    async fn approve_and_reject_are_mutually_exclusive() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];

        approve(&state, OWNER, id, None).await.unwrap();
        messenger.clear();

        let second = reject(&state, OWNER, id, RejectionReason::Incomplete, None)
            .await
            .unwrap();
        assert_eq!(second, Decision::AlreadyDecided(ExperienceStatus::Approved));
        assert_eq!(
            approve(&state, OWNER, id, None).await.unwrap(),
            Decision::AlreadyDecided(ExperienceStatus::Approved)
        );

        assert_eq!(
            state.db.get_experience(id).unwrap().unwrap().status,
            ExperienceStatus::Approved
        );
        assert!(messenger.texts_to(SUBMITTER).is_empty());
        assert!(messenger.sent_refs_to(CHANNEL).is_empty());
    }

    #[tokio::test]
    async fn approving_rejected_experience_posts_nothing() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];
        reject(&state, OWNER, id, RejectionReason::Irrelevant, None).await.unwrap();

        assert_eq!(
            approve(&state, OWNER, id, None).await.unwrap(),
            Decision::AlreadyDecided(ExperienceStatus::Rejected)
        );
        assert!(messenger.sent_refs_to(CHANNEL).is_empty());
        assert_eq!(approve(&state, OWNER, 999, None).await.unwrap(), Decision::NotFound);
    }

    #[tokio::test]
    async fn non_admins_cannot_decide() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];

        assert!(matches!(
            approve(&state, SUBMITTER, id, None).await,
            Err(BotError::Unauthorized(SUBMITTER))
        ));
        assert_eq!(
            state.db.get_experience(id).unwrap().unwrap().status,
            ExperienceStatus::Pending
        );
        assert!(messenger.log().is_empty());
    }

    #[tokio::test]
    async fn redacting_twice_reports_already_redacted() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];
        approve(&state, OWNER, id, None).await.unwrap();
        let post = messenger.sent_refs_to(CHANNEL)[0];

        assert_eq!(redact(&state, OWNER, id, None).await.unwrap(), RedactOutcome::Redacted);
        let body = messenger.content(post).unwrap();
        assert!(body.contains(&state.texts.get("redacted_placeholder")));
        assert!(body.contains("#Algorithms"));
        assert!(!body.contains("Good"));

        assert_eq!(
            redact(&state, OWNER, id, None).await.unwrap(),
            RedactOutcome::AlreadyRedacted
        );
    }

    #[tokio::test]
    async fn unchanged_channel_post_counts_as_already_redacted() {
        let (state, _) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];
        approve(&state, OWNER, id, None).await.unwrap();
        redact(&state, OWNER, id, None).await.unwrap();

        // flag lost, post already shows the placeholder
        state
            .db
            .with_conn(|conn| Ok(conn.execute("UPDATE experiences SET redacted = 0", [])?))
            .unwrap();

        assert_eq!(
            redact(&state, OWNER, id, None).await.unwrap(),
            RedactOutcome::AlreadyRedacted
        );
        assert!(state.db.get_experience(id).unwrap().unwrap().redacted);
    }

    #[tokio::test]
    async fn pending_experience_cannot_be_redacted() {
        let (state, _) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];
        assert_eq!(
            redact(&state, OWNER, id, None).await.unwrap(),
            RedactOutcome::NotPublished
        );
    }

    #[tokio::test]
    async fn fan_out_survives_unreachable_admin() {
        let (state, messenger) = test_state();
        state.access.add_admin(2).unwrap();
        state.access.add_admin(3).unwrap();
        messenger.make_unreachable(OWNER);
        let id = sample_experiences(&state, SUBMITTER, 1)[0];

        assert_eq!(submit(&state, id).await.unwrap(), 2);
        let exp = state.db.get_experience(id).unwrap().unwrap();
        assert_eq!(exp.admin_chat_id, Some(2));
        assert_eq!(messenger.messages_to(3).len(), 1);
    }

    #[tokio::test]
    async fn decision_updates_stored_admin_message() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];
        submit(&state, id).await.unwrap();
        let stored = messenger.sent_refs_to(OWNER)[0];

        reject(&state, OWNER, id, RejectionReason::Incomplete, None).await.unwrap();

        let edits = messenger.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, stored);
        assert!(edits[0].1.keyboard.is_none());
    }

    #[tokio::test]
    async fn resubmission_resets_to_pending_and_renotifies() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];
        reject(&state, OWNER, id, RejectionReason::Incomplete, None).await.unwrap();

        assert_eq!(resubmit(&state, SUBMITTER, id, None).await.unwrap(), Decision::Applied);
        assert_eq!(
            state.db.get_experience(id).unwrap().unwrap().status,
            ExperienceStatus::Pending
        );
        assert_eq!(messenger.messages_to(OWNER).len(), 1);

        assert_eq!(
            resubmit(&state, SUBMITTER, id, None).await.unwrap(),
            Decision::AlreadyDecided(ExperienceStatus::Pending)
        );
        // someone else's experience
        assert_eq!(resubmit(&state, 999, id, None).await.unwrap(), Decision::NotFound);
        assert_eq!(state.db.experiences_by_user(SUBMITTER).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reapproval_replaces_old_channel_post() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];
        approve(&state, OWNER, id, None).await.unwrap();
        let first_post = messenger.sent_refs_to(CHANNEL)[0];

        resubmit(&state, SUBMITTER, id, None).await.unwrap();
        approve(&state, OWNER, id, None).await.unwrap();

        let posts = messenger.sent_refs_to(CHANNEL);
        assert_eq!(posts.len(), 2);
        assert!(messenger.deletions().contains(&first_post));
        assert_eq!(
            state.db.get_experience(id).unwrap().unwrap().channel_message_id,
            Some(posts[1].message_id)
        );
    }

    #[tokio::test]
    async fn edit_requires_confirmation_then_restarts_dialogue() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];
        submit(&state, id).await.unwrap();
        let admin_msg = messenger.sent_refs_to(OWNER)[0];

        assert_eq!(
            request_edit(&state, SUBMITTER, id, None).await.unwrap(),
            Decision::Applied
        );
        // nothing happens until confirmed
        assert!(state.db.get_experience(id).unwrap().is_some());

        assert_eq!(
            confirm_edit(&state, SUBMITTER, id, None).await.unwrap(),
            Decision::Applied
        );
        assert!(state.db.get_experience(id).unwrap().is_none());
        assert!(matches!(
            state.sessions.load(SUBMITTER).unwrap(),
            Some(Session::Submission(sub)) if sub.step == Step::SelectingField
        ));
        assert_eq!(
            messenger.content(admin_msg).unwrap(),
            state.texts.format("admin_experience_withdrawn", &[("id", &id)])
        );
    }

    #[tokio::test]
    async fn unreachable_submitter_still_withdraws_for_editing() {
        let (state, messenger) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];
        submit(&state, id).await.unwrap();
        let admin_msg = messenger.sent_refs_to(OWNER)[0];
        let origin = messenger
            .send(SUBMITTER, OutgoingMessage::text("own experience"))
            .await
            .unwrap();
        messenger.make_unreachable(SUBMITTER);

        assert!(matches!(
            confirm_edit(&state, SUBMITTER, id, Some(origin)).await,
            Err(BotError::Messenger(_))
        ));
        assert!(state.db.get_experience(id).unwrap().is_none());
        assert_eq!(
            messenger.content(admin_msg).unwrap(),
            state.texts.format("admin_experience_withdrawn", &[("id", &id)])
        );
    }

    #[tokio::test]
    async fn decided_experience_cannot_be_edited() {
        let (state, _) = test_state();
        let id = sample_experiences(&state, SUBMITTER, 1)[0];
        approve(&state, OWNER, id, None).await.unwrap();

        assert_eq!(
            request_edit(&state, SUBMITTER, id, None).await.unwrap(),
            Decision::AlreadyDecided(ExperienceStatus::Approved)
        );
        assert_eq!(
            confirm_edit(&state, SUBMITTER, id, None).await.unwrap(),
            Decision::AlreadyDecided(ExperienceStatus::Approved)
        );
        assert!(state.db.get_experience(id).unwrap().is_some());
    }
}

//! Guided experience submission.
//!
//! Each update loads the user's `Submission` from the session store,
//! applies one input to it and saves it back. Nothing reaches the
//! experiences table until the last answer is in.

pub mod machine;

use tracing::{debug, info, warn};

use ostad_types::action::Action;
use ostad_types::models::{NewExperience, RegistryKind, UserId};
use ostad_types::update::{MessageRef, OutgoingMessage};

use crate::dispatcher::CallbackReply;
use crate::keyboards;
use crate::messenger::respond;
use crate::moderation;
use crate::session::Session;
use crate::texts::TextStore;
use crate::{AppState, BotError, BotResult};

use machine::{Advance, Input, Step, StepError, Submission, ValidationError};

/// Whether an input was consumed or belonged to an older prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Done,
    Stale,
}

/// Begin a fresh submission, dropping any conversation in progress.
pub async fn start(state: &AppState, user_id: UserId) -> BotResult<()> {
    if state.db.list_fields()?.is_empty() {
        state.sessions.clear(user_id)?;
        state
            .messenger
            .send(user_id, OutgoingMessage::text(state.texts.get("no_fields_available")))
            .await?;
        return Ok(());
    }

    let submission = Submission::new(user_id);
    state.sessions.save(user_id, &Session::Submission(submission.clone()))?;
    debug!("User {} started a submission", user_id);
    prompt(state, &submission, None).await
}

/// Abandon the conversation. Safe to call with nothing in progress.
pub async fn cancel(state: &AppState, user_id: UserId, origin: Option<MessageRef>) -> BotResult<()> {
    if state.sessions.clear(user_id)? {
        debug!("User {} cancelled their conversation", user_id);
    }

    let message = OutgoingMessage::text(state.texts.get("operation_cancelled"));
    match origin {
        Some(_) => respond(&*state.messenger, user_id, origin, message).await?,
        None => {
            state
                .messenger
                .send(user_id, message.with_keyboard(keyboards::main_menu(&state.texts)))
                .await?;
        }
    }
    Ok(())
}

/// A button press belonging to the submission dialogue.
pub async fn handle_action(
    state: &AppState,
    user_id: UserId,
    action: &Action,
    origin: Option<MessageRef>,
) -> BotResult<CallbackReply> {
    let Some(Session::Submission(submission)) = state.sessions.load(user_id)? else {
        return Ok(CallbackReply::Alert(state.texts.get("button_expired")));
    };

    let input = match *action {
        Action::SelectField(id) => Input::Field(id),
        Action::SelectMajor(id) => Input::Major(id),
        Action::SelectCourse(id) => Input::Course(id),
        Action::SelectProfessor(id) => Input::Professor(id),
        Action::AddNewProfessor => Input::AddProfessor,
        Action::Attendance(required) => Input::Attendance(required),
        _ => return Ok(CallbackReply::Alert(state.texts.get("button_expired"))),
    };

    if !in_scope(state, &submission, &input)? {
        prompt(state, &submission, origin).await?;
        return Ok(CallbackReply::Alert(state.texts.get("button_expired")));
    }

    match advance(state, submission, input, origin).await? {
        Applied::Done => Ok(CallbackReply::Ack),
        Applied::Stale => Ok(CallbackReply::Alert(state.texts.get("button_expired"))),
    }
}

/// Typed text while a submission is in progress.
pub async fn handle_text(state: &AppState, submission: Submission, text: &str) -> BotResult<()> {
    if !submission.step.expects_text() {
        state
            .messenger
            .send(submission.user_id, OutgoingMessage::text(state.texts.get("use_buttons")))
            .await?;
        return prompt(state, &submission, None).await;
    }

    if advance(state, submission.clone(), Input::Text(text.to_string()), None).await? == Applied::Stale {
        prompt(state, &submission, None).await?;
    }
    Ok(())
}

async fn advance(
    state: &AppState,
    mut submission: Submission,
    input: Input,
    origin: Option<MessageRef>,
) -> BotResult<Applied> {
    let user_id = submission.user_id;

    let outcome = match submission.apply(input) {
        Ok(Advance::CreateProfessor(name)) => {
            let (id, created) = state.db.get_or_create_professor(&name)?;
            if created {
                info!("User {} added professor '{}' ({})", user_id, name, id);
            }
            submission.apply(Input::Professor(id))
        }
        other => other,
    };

    match outcome {
        Ok(Advance::Next(_)) => {
            state.sessions.save(user_id, &Session::Submission(submission.clone()))?;
            prompt(state, &submission, origin).await?;
            Ok(Applied::Done)
        }
        Ok(Advance::Complete(record)) => {
            complete(state, record).await?;
            Ok(Applied::Done)
        }
        Ok(Advance::CreateProfessor(_)) => Ok(Applied::Stale),
        Err(StepError::Invalid(e)) => {
            state
                .messenger
                .send(user_id, OutgoingMessage::text(validation_message(&state.texts, &e)))
                .await?;
            prompt(state, &submission, None).await?;
            Ok(Applied::Done)
        }
        Err(StepError::Unexpected { step }) => {
            debug!("User {} sent input that does not fit step {:?}", user_id, step);
            Ok(Applied::Stale)
        }
    }
}

/// Persist the finished record and hand it to moderation.
async fn complete(state: &AppState, record: NewExperience) -> BotResult<()> {
    let user_id = record.user_id;
    let id = state.db.insert_experience(&record)?;
    state.sessions.clear(user_id)?;

    let notified = moderation::submit(state, id).await?;
    if notified == 0 {
        warn!("Experience {} could not be delivered to any admin", id);
    }

    state
        .messenger
        .send(
            user_id,
            OutgoingMessage::text(state.texts.get("submission_success"))
                .with_keyboard(keyboards::main_menu(&state.texts)),
        )
        .await?;
    Ok(())
}

/// A selection button must still point at a row under the current
/// choices; registry rows can be deleted while a user is mid-dialogue.
fn in_scope(state: &AppState, submission: &Submission, input: &Input) -> BotResult<bool> {
    let draft = &submission.draft;
    Ok(match *input {
        Input::Field(id) => state.db.get_item(RegistryKind::Field, id)?.is_some(),
        Input::Major(id) => state
            .db
            .get_major(id)?
            .is_some_and(|m| Some(m.field_id) == draft.field_id),
        Input::Course(id) => state
            .db
            .get_course(id)?
            .is_some_and(|c| Some(c.major_id) == draft.major_id),
        Input::Professor(id) => state.db.get_item(RegistryKind::Professor, id)?.is_some(),
        Input::AddProfessor | Input::Attendance(_) | Input::Text(_) => true,
    })
}

async fn prompt(state: &AppState, submission: &Submission, origin: Option<MessageRef>) -> BotResult<()> {
    let message = prompt_message(state, submission)?;
    respond(&*state.messenger, submission.user_id, origin, message).await?;
    Ok(())
}

fn prompt_message(state: &AppState, submission: &Submission) -> BotResult<OutgoingMessage> {
    let texts = &state.texts;
    let draft = &submission.draft;
    let ask = |key: &str| {
        OutgoingMessage::text(texts.get(key)).with_keyboard(keyboards::cancel_submission(texts))
    };

    let message = match submission.step {
        Step::SelectingField => {
            let rows = keyboards::choices(
                state.db.list_fields()?.into_iter().map(|f| (f.id, f.name)),
                Action::SelectField,
            );
            OutgoingMessage::text(texts.get("submission_start"))
                .with_keyboard(keyboards::selection(texts, rows))
        }
        Step::SelectingMajor => {
            let field_id = draft.field_id.ok_or_else(|| BotError::NotFound("field".into()))?;
            let majors = state.db.list_majors(field_id)?;
            let key = if majors.is_empty() { "no_majors_available" } else { "choose_major" };
            let rows = keyboards::choices(majors.into_iter().map(|m| (m.id, m.name)), Action::SelectMajor);
            OutgoingMessage::text(texts.get(key)).with_keyboard(keyboards::selection(texts, rows))
        }
        Step::SelectingCourse => {
            let major_id = draft.major_id.ok_or_else(|| BotError::NotFound("major".into()))?;
            let courses = state.db.list_courses(major_id)?;
            let key = if courses.is_empty() { "no_courses_available" } else { "choose_course" };
            let rows = keyboards::choices(courses.into_iter().map(|c| (c.id, c.name)), Action::SelectCourse);
            OutgoingMessage::text(texts.get(key)).with_keyboard(keyboards::selection(texts, rows))
        }
        Step::SelectingProfessor => {
            let rows = keyboards::choices(
                state.db.list_professors()?.into_iter().map(|p| (p.id, p.name)),
                Action::SelectProfessor,
            );
            OutgoingMessage::text(texts.get("choose_professor"))
                .with_keyboard(keyboards::professors(texts, rows))
        }
        Step::AddingProfessor => ask("add_new_professor_prompt"),
        Step::GettingTeaching => ask("ask_teaching_style"),
        Step::GettingNotes => ask("ask_notes"),
        Step::GettingProject => ask("ask_project"),
        Step::GettingAttendanceChoice => OutgoingMessage::text(texts.get("ask_attendance_choice"))
            .with_keyboard(keyboards::attendance(texts)),
        Step::GettingAttendanceDetails => ask("ask_attendance_details"),
        Step::GettingExam => ask("ask_exam"),
        Step::GettingConclusion => ask("ask_conclusion"),
    };
    Ok(message)
}

pub(crate) fn validation_message(texts: &TextStore, error: &ValidationError) -> String {
    match error {
        ValidationError::Empty => texts.get("error_text_empty"),
        ValidationError::TooLong { max, actual } => {
            texts.format("error_text_too_long", &[("max", max), ("actual", actual)])
        }
        ValidationError::NotANumber => texts.get("error_not_a_number"),
    }
}

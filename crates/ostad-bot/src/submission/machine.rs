//! The submission dialogue as a pure state machine.
//!
//! `Submission::apply` takes one input and either advances, reports a
//! recoverable validation failure (the step does not change), or returns
//! the finished record. No I/O happens here; the handler in the parent
//! module does the lookups and persistence around it.

use serde::{Deserialize, Serialize};

use ostad_types::models::{NewExperience, UserId};
use ostad_types::{MAX_NAME_LENGTH, MAX_TEXT_LENGTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    SelectingField,
    SelectingMajor,
    SelectingCourse,
    SelectingProfessor,
    AddingProfessor,
    GettingTeaching,
    GettingNotes,
    GettingProject,
    GettingAttendanceChoice,
    GettingAttendanceDetails,
    GettingExam,
    GettingConclusion,
}

impl Step {
    /// Steps answered by typing rather than by pressing a button.
    pub fn expects_text(self) -> bool {
        matches!(
            self,
            Self::AddingProfessor
                | Self::GettingTeaching
                | Self::GettingNotes
                | Self::GettingProject
                | Self::GettingAttendanceDetails
                | Self::GettingExam
                | Self::GettingConclusion
        )
    }
}

/// Everything collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub field_id: Option<i64>,
    pub major_id: Option<i64>,
    pub course_id: Option<i64>,
    pub professor_id: Option<i64>,
    pub teaching_style: Option<String>,
    pub notes: Option<String>,
    pub project: Option<String>,
    pub attendance_required: Option<bool>,
    pub attendance_details: Option<String>,
    pub exam: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Field(i64),
    Major(i64),
    Course(i64),
    Professor(i64),
    AddProfessor,
    Attendance(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next(Step),
    /// A valid new professor name was typed. The caller resolves it to a
    /// row and feeds back `Input::Professor`.
    CreateProfessor(String),
    Complete(NewExperience),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("text is empty")]
    Empty,
    #[error("text is {actual} characters, the limit is {max}")]
    TooLong { max: usize, actual: usize },
    #[error("not a number")]
    NotANumber,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The input does not belong to the current step, e.g. a stale button.
    #[error("unexpected input at {step:?}")]
    Unexpected { step: Step },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub user_id: UserId,
    pub step: Step,
    pub draft: Draft,
}

impl Submission {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            step: Step::SelectingField,
            draft: Draft::default(),
        }
    }

    pub fn apply(&mut self, input: Input) -> Result<Advance, StepError> {
        let step = self.step;
        let unexpected = StepError::Unexpected { step };
        let draft = &mut self.draft;

        let next = match (step, input) {
            (Step::SelectingField, Input::Field(id)) => {
                draft.field_id = Some(id);
                Step::SelectingMajor
            }
            (Step::SelectingMajor, Input::Major(id)) => {
                draft.major_id = Some(id);
                Step::SelectingCourse
            }
            (Step::SelectingCourse, Input::Course(id)) => {
                draft.course_id = Some(id);
                Step::SelectingProfessor
            }
            (Step::SelectingProfessor, Input::Professor(id))
            | (Step::AddingProfessor, Input::Professor(id)) => {
                draft.professor_id = Some(id);
                Step::GettingTeaching
            }
            (Step::SelectingProfessor, Input::AddProfessor) => Step::AddingProfessor,
            (Step::AddingProfessor, Input::Text(name)) => {
                return Ok(Advance::CreateProfessor(validate_professor_name(&name)?));
            }
            (Step::GettingTeaching, Input::Text(text)) => {
                draft.teaching_style = Some(validate_text(&text)?);
                Step::GettingNotes
            }
            (Step::GettingNotes, Input::Text(text)) => {
                draft.notes = Some(validate_text(&text)?);
                Step::GettingProject
            }
            (Step::GettingProject, Input::Text(text)) => {
                draft.project = Some(validate_text(&text)?);
                Step::GettingAttendanceChoice
            }
            (Step::GettingAttendanceChoice, Input::Attendance(required)) => {
                draft.attendance_required = Some(required);
                Step::GettingAttendanceDetails
            }
            (Step::GettingAttendanceDetails, Input::Text(text)) => {
                draft.attendance_details = Some(validate_text(&text)?);
                Step::GettingExam
            }
            (Step::GettingExam, Input::Text(text)) => {
                draft.exam = Some(validate_text(&text)?);
                Step::GettingConclusion
            }
            (Step::GettingConclusion, Input::Text(text)) => {
                let conclusion = validate_text(&text)?;
                return self.finish(conclusion).map(Advance::Complete);
            }
            _ => return Err(unexpected),
        };

        self.step = next;
        Ok(Advance::Next(next))
    }

    fn finish(&self, conclusion: String) -> Result<NewExperience, StepError> {
        let missing = || StepError::Unexpected { step: self.step };
        let d = &self.draft;
        Ok(NewExperience {
            user_id: self.user_id,
            field_id: d.field_id.ok_or_else(missing)?,
            major_id: d.major_id.ok_or_else(missing)?,
            course_id: d.course_id.ok_or_else(missing)?,
            professor_id: d.professor_id.ok_or_else(missing)?,
            teaching_style: d.teaching_style.clone().ok_or_else(missing)?,
            notes: d.notes.clone().ok_or_else(missing)?,
            project: d.project.clone().ok_or_else(missing)?,
            attendance_required: d.attendance_required.ok_or_else(missing)?,
            attendance_details: d.attendance_details.clone().ok_or_else(missing)?,
            exam: d.exam.clone().ok_or_else(missing)?,
            conclusion,
        })
    }
}

/// Trimmed, non-empty, at most `MAX_TEXT_LENGTH` characters.
pub fn validate_text(text: &str) -> Result<String, ValidationError> {
    validate_len(text, MAX_TEXT_LENGTH)
}

pub fn validate_professor_name(name: &str) -> Result<String, ValidationError> {
    validate_len(name, MAX_NAME_LENGTH)
}

pub(crate) fn validate_len(text: &str, max: usize) -> Result<String, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::Empty);
    }
    let actual = text.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { max, actual });
    }
    Ok(text.to_string())
}

pub fn parse_id(text: &str) -> Result<i64, ValidationError> {
    text.trim().parse().map_err(|_| ValidationError::NotANumber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Input {
        Input::Text(s.to_string())
    }

    /// Inputs that walk a fresh submission to completion via "add new
    /// professor", with the professor row id supplied as 4.
    fn full_run() -> Vec<Input> {
        vec![
            Input::Field(1),
            Input::Major(2),
            Input::Course(3),
            Input::AddProfessor,
            text("Dr. Smith"),
            Input::Professor(4),
            text("Good"),
            text("Good"),
            text("Good"),
            Input::Attendance(true),
            text("Good"),
            text("Good"),
            text("Good"),
        ]
    }

    #[test]
    fn full_dialogue_produces_pending_record() {
        let mut s = Submission::new(77);
        let mut result = None;
        for input in full_run() {
            match s.apply(input).unwrap() {
                Advance::Complete(exp) => result = Some(exp),
                Advance::CreateProfessor(name) => assert_eq!(name, "Dr. Smith"),
                Advance::Next(_) => {}
            }
        }

        let exp = result.expect("dialogue should complete");
        assert_eq!(exp.user_id, 77);
        assert_eq!((exp.field_id, exp.major_id, exp.course_id, exp.professor_id), (1, 2, 3, 4));
        assert!(exp.attendance_required);
        for section in [
            &exp.teaching_style,
            &exp.notes,
            &exp.project,
            &exp.attendance_details,
            &exp.exam,
            &exp.conclusion,
        ] {
            assert_eq!(section, "Good");
        }
    }

    #[test]
    fn existing_professor_skips_name_prompt() {
        let mut s = Submission::new(1);
        s.apply(Input::Field(1)).unwrap();
        s.apply(Input::Major(1)).unwrap();
        s.apply(Input::Course(1)).unwrap();
        assert_eq!(
            s.apply(Input::Professor(9)).unwrap(),
            Advance::Next(Step::GettingTeaching)
        );
        assert_eq!(s.draft.professor_id, Some(9));
    }

    #[test]
    fn too_long_text_reprompts_same_step() {
        let mut s = Submission::new(1);
        s.step = Step::GettingNotes;
        let long = "x".repeat(MAX_TEXT_LENGTH + 1);

        assert_eq!(
            s.apply(Input::Text(long)),
            Err(StepError::Invalid(ValidationError::TooLong {
                max: MAX_TEXT_LENGTH,
                actual: MAX_TEXT_LENGTH + 1
            }))
        );
        assert_eq!(s.step, Step::GettingNotes);
        assert!(s.draft.notes.is_none());

        let exact = "y".repeat(MAX_TEXT_LENGTH);
        assert_eq!(s.apply(Input::Text(exact)).unwrap(), Advance::Next(Step::GettingProject));
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        let persian = "س".repeat(MAX_TEXT_LENGTH);
        assert!(validate_text(&persian).is_ok());
    }

    #[test]
    fn invalid_professor_names_keep_step() {
        let mut s = Submission::new(1);
        s.step = Step::AddingProfessor;
        assert_eq!(
            s.apply(text("   ")),
            Err(StepError::Invalid(ValidationError::Empty))
        );
        assert!(matches!(
            s.apply(Input::Text("p".repeat(MAX_NAME_LENGTH + 1))),
            Err(StepError::Invalid(ValidationError::TooLong { .. }))
        ));
        assert_eq!(s.step, Step::AddingProfessor);
    }

    #[test]
    fn buttons_from_other_steps_are_unexpected() {
        let mut s = Submission::new(1);
        assert_eq!(
            s.apply(Input::Major(5)),
            Err(StepError::Unexpected { step: Step::SelectingField })
        );
        assert_eq!(
            s.apply(text("Engineering")),
            Err(StepError::Unexpected { step: Step::SelectingField })
        );
        assert_eq!(s.step, Step::SelectingField);
    }

    #[test]
    fn parse_id_rejects_non_numbers() {
        assert_eq!(parse_id(" 42 "), Ok(42));
        assert_eq!(parse_id("abc"), Err(ValidationError::NotANumber));
    }
}

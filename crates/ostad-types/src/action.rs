//! Button actions.
//!
//! Every inline button carries one `Action`, encoded into the short
//! colon-separated payload Telegram hands back on a press. Payloads are
//! decoded exactly once, at the edge, and everything past that point
//! matches on the enum.

use std::fmt;
use std::str::FromStr;

use crate::models::{ChatId, RegistryKind, RejectionReason, UserId};

/// Telegram rejects callback payloads longer than this.
pub const MAX_CALLBACK_DATA_LENGTH: usize = 64;

/// Paginated admin listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListTarget {
    Registry(RegistryKind),
    Admins,
    Texts,
    Channels,
}

impl ListTarget {
    fn code(self) -> &'static str {
        match self {
            Self::Registry(kind) => kind.code(),
            Self::Admins => "a",
            Self::Texts => "t",
            Self::Channels => "ch",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "a" => Some(Self::Admins),
            "t" => Some(Self::Texts),
            "ch" => Some(Self::Channels),
            other => RegistryKind::from_code(other).map(Self::Registry),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // -- Submission --
    SelectField(i64),
    SelectMajor(i64),
    SelectCourse(i64),
    SelectProfessor(i64),
    AddNewProfessor,
    Attendance(bool),
    CancelSubmission,
    CheckMembership,

    // -- Submitter's own experiences --
    MyExperiences,
    ViewOwnExperience(i64),
    Resubmit(i64),
    EditExperience(i64),
    ConfirmEditExperience(i64),

    // -- Moderation --
    ViewExperience(i64),
    Approve(i64),
    Reject(i64),
    RejectWithReason(i64, RejectionReason),
    Redact(i64),
    ReviewQueue(u32),

    // -- Admin panel --
    AdminPanel,
    List(ListTarget, u32),
    AddItem(RegistryKind),
    ChooseParentField(RegistryKind, i64),
    ChooseParentMajor(i64),
    EditItem(RegistryKind, i64),
    DeleteItem(RegistryKind, i64),
    ConfirmDeleteItem(RegistryKind, i64),
    AddAdmin,
    DeleteAdmin(UserId),
    ConfirmDeleteAdmin(UserId),
    EditText(String),
    AddChannel,
    DeleteChannel(ChatId),
    ToggleForceSubscribe,
    Stats,
    Broadcast,
    DirectMessage,
    CancelAdminFlow,

    /// Label-only button.
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParseError(pub String);

impl fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised callback payload '{}'", self.0)
    }
}

impl std::error::Error for ActionParseError {}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectField(id) => write!(f, "sf:{id}"),
            Self::SelectMajor(id) => write!(f, "sm:{id}"),
            Self::SelectCourse(id) => write!(f, "sc:{id}"),
            Self::SelectProfessor(id) => write!(f, "sp:{id}"),
            Self::AddNewProfessor => f.write_str("np"),
            Self::Attendance(yes) => write!(f, "att:{}", if *yes { "y" } else { "n" }),
            Self::CancelSubmission => f.write_str("cancel"),
            Self::CheckMembership => f.write_str("chk"),

            Self::MyExperiences => f.write_str("my"),
            Self::ViewOwnExperience(id) => write!(f, "my:{id}"),
            Self::Resubmit(id) => write!(f, "rs:{id}"),
            Self::EditExperience(id) => write!(f, "ed:{id}"),
            Self::ConfirmEditExperience(id) => write!(f, "edok:{id}"),

            Self::ViewExperience(id) => write!(f, "x:v:{id}"),
            Self::Approve(id) => write!(f, "x:a:{id}"),
            Self::Reject(id) => write!(f, "x:r:{id}"),
            Self::RejectWithReason(id, reason) => write!(f, "x:rr:{id}:{}", reason.code()),
            Self::Redact(id) => write!(f, "x:d:{id}"),
            Self::ReviewQueue(page) => write!(f, "q:{page}"),

            Self::AdminPanel => f.write_str("ap"),
            Self::List(target, page) => write!(f, "l:{}:{page}", target.code()),
            Self::AddItem(kind) => write!(f, "add:{}", kind.code()),
            Self::ChooseParentField(kind, id) => write!(f, "pf:{}:{id}", kind.code()),
            Self::ChooseParentMajor(id) => write!(f, "pm:{id}"),
            Self::EditItem(kind, id) => write!(f, "e:{}:{id}", kind.code()),
            Self::DeleteItem(kind, id) => write!(f, "d:{}:{id}", kind.code()),
            Self::ConfirmDeleteItem(kind, id) => write!(f, "dd:{}:{id}", kind.code()),
            Self::AddAdmin => f.write_str("add:a"),
            Self::DeleteAdmin(id) => write!(f, "d:a:{id}"),
            Self::ConfirmDeleteAdmin(id) => write!(f, "dd:a:{id}"),
            Self::EditText(key) => write!(f, "t:{key}"),
            Self::AddChannel => f.write_str("add:ch"),
            Self::DeleteChannel(id) => write!(f, "d:ch:{id}"),
            Self::ToggleForceSubscribe => f.write_str("fs"),
            Self::Stats => f.write_str("st"),
            Self::Broadcast => f.write_str("bc"),
            Self::DirectMessage => f.write_str("dm"),
            Self::CancelAdminFlow => f.write_str("ac"),

            Self::Noop => f.write_str("-"),
        }
    }
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ActionParseError(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();
        let id = |i: usize| -> Result<i64, ActionParseError> {
            parts.get(i).and_then(|p| p.parse().ok()).ok_or_else(err)
        };
        let kind = |i: usize| -> Result<RegistryKind, ActionParseError> {
            parts.get(i).and_then(|p| RegistryKind::from_code(p)).ok_or_else(err)
        };
        let page = |i: usize| -> Result<u32, ActionParseError> {
            parts.get(i).and_then(|p| p.parse().ok()).ok_or_else(err)
        };

        let action = match parts.as_slice() {
            ["sf", _] => Self::SelectField(id(1)?),
            ["sm", _] => Self::SelectMajor(id(1)?),
            ["sc", _] => Self::SelectCourse(id(1)?),
            ["sp", _] => Self::SelectProfessor(id(1)?),
            ["np"] => Self::AddNewProfessor,
            ["att", "y"] => Self::Attendance(true),
            ["att", "n"] => Self::Attendance(false),
            ["cancel"] => Self::CancelSubmission,
            ["chk"] => Self::CheckMembership,

            ["my"] => Self::MyExperiences,
            ["my", _] => Self::ViewOwnExperience(id(1)?),
            ["rs", _] => Self::Resubmit(id(1)?),
            ["ed", _] => Self::EditExperience(id(1)?),
            ["edok", _] => Self::ConfirmEditExperience(id(1)?),

            ["x", "v", _] => Self::ViewExperience(id(2)?),
            ["x", "a", _] => Self::Approve(id(2)?),
            ["x", "r", _] => Self::Reject(id(2)?),
            ["x", "rr", _, reason] => Self::RejectWithReason(
                id(2)?,
                RejectionReason::from_code(reason).ok_or_else(err)?,
            ),
            ["x", "d", _] => Self::Redact(id(2)?),
            ["q", _] => Self::ReviewQueue(page(1)?),

            ["ap"] => Self::AdminPanel,
            ["l", target, _] => {
                Self::List(ListTarget::from_code(target).ok_or_else(err)?, page(2)?)
            }
            ["add", "a"] => Self::AddAdmin,
            ["add", "ch"] => Self::AddChannel,
            ["add", _] => Self::AddItem(kind(1)?),
            ["pf", _, _] => Self::ChooseParentField(kind(1)?, id(2)?),
            ["pm", _] => Self::ChooseParentMajor(id(1)?),
            ["e", _, _] => Self::EditItem(kind(1)?, id(2)?),
            ["d", "a", _] => Self::DeleteAdmin(id(2)?),
            ["d", "ch", _] => Self::DeleteChannel(id(2)?),
            ["d", _, _] => Self::DeleteItem(kind(1)?, id(2)?),
            ["dd", "a", _] => Self::ConfirmDeleteAdmin(id(2)?),
            ["dd", _, _] => Self::ConfirmDeleteItem(kind(1)?, id(2)?),
            ["t", key] if !key.is_empty() => Self::EditText((*key).to_string()),
            ["fs"] => Self::ToggleForceSubscribe,
            ["st"] => Self::Stats,
            ["bc"] => Self::Broadcast,
            ["dm"] => Self::DirectMessage,
            ["ac"] => Self::CancelAdminFlow,

            ["-"] => Self::Noop,
            _ => return Err(err()),
        };

        Ok(action)
    }
}

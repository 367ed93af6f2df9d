use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type ChatId = i64;

// -- Registry --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Major {
    pub id: i64,
    pub name: String,
    pub field_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub major_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    pub id: i64,
    pub name: String,
}

/// The four kinds of registry rows an admin can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryKind {
    Field,
    Major,
    Course,
    Professor,
}

impl RegistryKind {
    pub const ALL: [RegistryKind; 4] = [Self::Field, Self::Major, Self::Course, Self::Professor];

    /// Short tag used inside callback payloads.
    pub fn code(self) -> &'static str {
        match self {
            Self::Field => "f",
            Self::Major => "m",
            Self::Course => "c",
            Self::Professor => "p",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "f" => Some(Self::Field),
            "m" => Some(Self::Major),
            "c" => Some(Self::Course),
            "p" => Some(Self::Professor),
            _ => None,
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Self::Field => "fields",
            Self::Major => "majors",
            Self::Course => "courses",
            Self::Professor => "professors",
        }
    }

    /// Text key of the admin panel header for this kind.
    pub fn header_key(self) -> &'static str {
        match self {
            Self::Field => "admin_manage_field_header",
            Self::Major => "admin_manage_major_header",
            Self::Course => "admin_manage_course_header",
            Self::Professor => "admin_manage_professor_header",
        }
    }
}

/// A registry row reduced to what listings and keyboards need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedItem {
    pub id: i64,
    pub name: String,
}

// -- Experiences --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceStatus {
    Pending,
    Approved,
    Rejected,
}

impl ExperienceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn text_key(self) -> &'static str {
        match self {
            Self::Pending => "status_pending",
            Self::Approved => "status_approved",
            Self::Rejected => "status_rejected",
        }
    }
}

impl fmt::Display for ExperienceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown experience status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ExperienceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Fixed set of reasons an admin can give when rejecting an experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionReason {
    Incomplete,
    Insulting,
    Irrelevant,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 3] = [Self::Incomplete, Self::Insulting, Self::Irrelevant];

    pub fn code(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Insulting => "insulting",
            Self::Irrelevant => "irrelevant",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    /// Text key holding the localized label of this reason.
    pub fn text_key(self) -> String {
        format!("btn_reject_reason_{}", self.code())
    }
}

/// Fully collected submission, ready to be stored as a pending experience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExperience {
    pub user_id: UserId,
    pub field_id: i64,
    pub major_id: i64,
    pub course_id: i64,
    pub professor_id: i64,
    pub teaching_style: String,
    pub notes: String,
    pub project: String,
    pub attendance_required: bool,
    pub attendance_details: String,
    pub exam: String,
    pub conclusion: String,
}

/// A stored experience joined with the names of its registry rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub id: i64,
    pub user_id: UserId,
    pub field_id: i64,
    pub field_name: String,
    pub major_id: i64,
    pub major_name: String,
    pub course_id: i64,
    pub course_name: String,
    pub professor_id: i64,
    pub professor_name: String,
    pub teaching_style: String,
    pub notes: String,
    pub project: String,
    pub attendance_required: bool,
    pub attendance_details: String,
    pub exam: String,
    pub conclusion: String,
    pub status: ExperienceStatus,
    pub admin_chat_id: Option<ChatId>,
    pub admin_message_id: Option<i64>,
    pub channel_message_id: Option<i64>,
    pub redacted: bool,
    pub created_at: DateTime<Utc>,
}

// -- Access --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredChannel {
    pub channel_id: ChatId,
    pub invite_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub first_name: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotText {
    pub key: String,
    pub value: String,
}

/// Counters shown on the admin stats screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub users: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub fields: u64,
    pub majors: u64,
    pub courses: u64,
    pub professors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_its_own_spelling() {
        for status in [
            ExperienceStatus::Pending,
            ExperienceStatus::Approved,
            ExperienceStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ExperienceStatus>().unwrap(), status);
        }
        assert!("archived".parse::<ExperienceStatus>().is_err());
    }

    #[test]
    fn rejection_reason_keys() {
        assert_eq!(RejectionReason::from_code("insulting"), Some(RejectionReason::Insulting));
        assert_eq!(RejectionReason::from_code("rude"), None);
        assert_eq!(RejectionReason::Insulting.text_key(), "btn_reject_reason_insulting");
    }
}

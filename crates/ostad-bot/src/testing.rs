//! In-memory stand-ins for the collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ostad_db::Database;
use ostad_types::models::{ChatId, NewExperience, UserId};
use ostad_types::update::{InlineArticle, Membership, MessageRef, OutgoingMessage, Sender};

use crate::messenger::{Messenger, MessengerError};
use crate::{AppState, AppStateInner, BotConfig};

pub const OWNER: UserId = 1;
pub const CHANNEL: ChatId = -100;
pub const BACKUP_CHAT: ChatId = -200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message { target: MessageRef, message: OutgoingMessage },
    Edit { target: MessageRef, message: OutgoingMessage },
    Delete(MessageRef),
    Callback { id: String, text: Option<String>, alert: bool },
    Inline { query_id: String, results: Vec<InlineArticle> },
}

/// Records every call and behaves like a small chat server: message ids
/// are sequential, identical edits report `NotModified`.
#[derive(Default)]
pub struct RecordingMessenger {
    log: Mutex<Vec<Sent>>,
    next_id: AtomicI64,
    contents: Mutex<HashMap<MessageRef, String>>,
    unreachable: Mutex<HashSet<ChatId>>,
    members: Mutex<HashSet<(ChatId, UserId)>>,
    broken_channels: Mutex<HashSet<ChatId>>,
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sends to `chat_id` fail from now on.
    pub fn make_unreachable(&self, chat_id: ChatId) {
        self.unreachable.lock().unwrap().insert(chat_id);
    }

    pub fn add_member(&self, channel_id: ChatId, user_id: UserId) {
        self.members.lock().unwrap().insert((channel_id, user_id));
    }

    /// Membership lookups for `channel_id` fail with a transport error.
    pub fn break_membership_checks(&self, channel_id: ChatId) {
        self.broken_channels.lock().unwrap().insert(channel_id);
    }

    pub fn log(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    /// Texts of every new message delivered to `chat_id`.
    pub fn texts_to(&self, chat_id: ChatId) -> Vec<String> {
        self.messages_to(chat_id).into_iter().map(|m| m.text).collect()
    }

    pub fn messages_to(&self, chat_id: ChatId) -> Vec<OutgoingMessage> {
        self.log()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { target, message } if target.chat_id == chat_id => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn last_to(&self, chat_id: ChatId) -> Option<OutgoingMessage> {
        self.messages_to(chat_id).pop()
    }

    pub fn sent_refs_to(&self, chat_id: ChatId) -> Vec<MessageRef> {
        self.log()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { target, .. } if target.chat_id == chat_id => Some(target),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(MessageRef, OutgoingMessage)> {
        self.log()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Edit { target, message } => Some((target, message)),
                _ => None,
            })
            .collect()
    }

    pub fn deletions(&self) -> Vec<MessageRef> {
        self.log()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Delete(target) => Some(target),
                _ => None,
            })
            .collect()
    }

    /// Current text of a delivered message, after edits.
    pub fn content(&self, target: MessageRef) -> Option<String> {
        self.contents.lock().unwrap().get(&target).cloned()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, chat_id: ChatId, message: OutgoingMessage) -> Result<MessageRef, MessengerError> {
        if self.unreachable.lock().unwrap().contains(&chat_id) {
            return Err(MessengerError::Forbidden("bot was blocked by the user".into()));
        }
        let target = MessageRef {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.contents.lock().unwrap().insert(target, message.text.clone());
        self.log.lock().unwrap().push(Sent::Message { target, message });
        Ok(target)
    }

    async fn edit(&self, target: MessageRef, message: OutgoingMessage) -> Result<(), MessengerError> {
        if self.unreachable.lock().unwrap().contains(&target.chat_id) {
            return Err(MessengerError::Forbidden("bot was blocked by the user".into()));
        }
        {
            let mut contents = self.contents.lock().unwrap();
            if contents.get(&target) == Some(&message.text) {
                return Err(MessengerError::NotModified);
            }
            contents.insert(target, message.text.clone());
        }
        self.log.lock().unwrap().push(Sent::Edit { target, message });
        Ok(())
    }

    async fn delete(&self, target: MessageRef) -> Result<(), MessengerError> {
        self.contents.lock().unwrap().remove(&target);
        self.log.lock().unwrap().push(Sent::Delete(target));
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), MessengerError> {
        self.log.lock().unwrap().push(Sent::Callback {
            id: callback_id.to_string(),
            text: text.map(str::to_string),
            alert,
        });
        Ok(())
    }

    async fn membership(&self, channel_id: ChatId, user_id: UserId) -> Result<Membership, MessengerError> {
        if self.broken_channels.lock().unwrap().contains(&channel_id) {
            return Err(MessengerError::Transport("connection reset".into()));
        }
        if self.members.lock().unwrap().contains(&(channel_id, user_id)) {
            Ok(Membership::Member)
        } else {
            Ok(Membership::NotMember)
        }
    }

    async fn answer_inline(&self, query_id: &str, results: Vec<InlineArticle>) -> Result<(), MessengerError> {
        self.log.lock().unwrap().push(Sent::Inline {
            query_id: query_id.to_string(),
            results,
        });
        Ok(())
    }
}

pub fn test_state() -> (AppState, Arc<RecordingMessenger>) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let messenger = RecordingMessenger::new();
    let state = AppStateInner::new(
        db,
        messenger.clone(),
        BotConfig {
            owner_id: OWNER,
            channel_id: CHANNEL,
            backup_chat_id: BACKUP_CHAT,
        },
    )
    .unwrap();
    (state, messenger)
}

pub fn sender(id: UserId) -> Sender {
    Sender {
        id,
        first_name: Some(format!("user{id}")),
    }
}

/// Field "Engineering" > Major "CS" > Course "Algorithms".
pub struct Registry {
    pub field: i64,
    pub major: i64,
    pub course: i64,
}

pub fn seed_registry(state: &AppState) -> Registry {
    let field = state.db.add_field("Engineering").unwrap();
    let major = state.db.add_major(field, "CS").unwrap();
    let course = state.db.add_course(major, "Algorithms").unwrap();
    Registry { field, major, course }
}

/// Seed the registry and store `count` pending experiences by `user_id`
/// about "Dr. Smith" teaching "Algorithms". Returns their ids in order.
pub fn sample_experiences(state: &AppState, user_id: UserId, count: usize) -> Vec<i64> {
    let reg = seed_registry(state);
    let (professor, _) = state.db.get_or_create_professor("Dr. Smith").unwrap();
    (0..count)
        .map(|_| {
            state
                .db
                .insert_experience(&NewExperience {
                    user_id,
                    field_id: reg.field,
                    major_id: reg.major,
                    course_id: reg.course,
                    professor_id: professor,
                    teaching_style: "Good".into(),
                    notes: "Good".into(),
                    project: "Good".into(),
                    attendance_required: true,
                    attendance_details: "Good".into(),
                    exam: "Good".into(),
                    conclusion: "Good".into(),
                })
                .unwrap()
        })
        .collect()
}

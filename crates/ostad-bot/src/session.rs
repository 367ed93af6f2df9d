use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::warn;

use ostad_db::Database;
use ostad_types::models::UserId;

use crate::BotResult;
use crate::admin::AdminFlow;
use crate::submission::machine::Submission;

/// The one conversation a user can be in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flow", content = "state", rename_all = "snake_case")]
pub enum Session {
    Submission(Submission),
    Admin(AdminFlow),
}

/// Durable per-user conversation state plus the per-user lock that keeps
/// two updates from the same user from running at once.
pub struct SessionStore {
    db: Arc<Database>,
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until no other update of `user_id` is being handled.
    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let user_lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Drop entries nobody is holding or waiting on.
            locks.retain(|id, lock| *id == user_id || Arc::strong_count(lock) > 1);
            locks.entry(user_id).or_default().clone()
        };
        user_lock.lock_owned().await
    }

    /// A stored session that no longer decodes is discarded.
    pub fn load(&self, user_id: UserId) -> BotResult<Option<Session>> {
        let Some(raw) = self.db.load_session(user_id)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Dropping unreadable session of user {}: {}", user_id, e);
                self.db.delete_session(user_id)?;
                Ok(None)
            }
        }
    }

    pub fn save(&self, user_id: UserId, session: &Session) -> BotResult<()> {
        let raw = serde_json::to_string(session).map_err(anyhow::Error::from)?;
        self.db.save_session(user_id, &raw)?;
        Ok(())
    }

    /// Returns true when there was a session to drop.
    pub fn clear(&self, user_id: UserId) -> BotResult<bool> {
        Ok(self.db.delete_session(user_id)?)
    }
}

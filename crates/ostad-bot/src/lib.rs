pub mod access;
pub mod admin;
pub mod backup;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod keyboards;
pub mod messenger;
pub mod moderation;
pub mod queue;
pub mod search;
pub mod session;
pub mod submission;
pub mod texts;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use ostad_db::Database;
use ostad_types::models::{ChatId, UserId};

use crate::access::AccessControl;
use crate::messenger::Messenger;
use crate::session::SessionStore;
use crate::texts::TextStore;

pub use crate::error::{BotError, BotResult};

/// Deployment-specific ids the core needs.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub owner_id: UserId,
    pub channel_id: ChatId,
    pub backup_chat_id: ChatId,
}

pub type AppState = Arc<AppStateInner>;

/// Services shared by every handler. Built once at start-up and passed
/// explicitly; nothing here is global.
pub struct AppStateInner {
    pub db: Arc<Database>,
    pub messenger: Arc<dyn Messenger>,
    pub texts: Arc<TextStore>,
    pub access: AccessControl,
    pub sessions: SessionStore,
    pub config: BotConfig,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, messenger: Arc<dyn Messenger>, config: BotConfig) -> BotResult<AppState> {
        let texts = Arc::new(TextStore::new(db.clone()));
        let access = AccessControl::new(db.clone(), messenger.clone(), texts.clone(), config.owner_id);
        access.ensure_owner()?;
        let sessions = SessionStore::new(db.clone());

        Ok(Arc::new(Self {
            db,
            messenger,
            texts,
            access,
            sessions,
            config,
        }))
    }
}

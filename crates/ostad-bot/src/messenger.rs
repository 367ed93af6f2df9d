//! The messaging collaborator.
//!
//! The core only needs to deliver content and look up channel
//! membership; the Telegram transport in the server crate implements
//! this trait, tests use a recording fake.

use async_trait::async_trait;
use tracing::debug;

use ostad_types::models::{ChatId, UserId};
use ostad_types::update::{InlineArticle, Keyboard, Membership, MessageRef, OutgoingMessage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessengerError {
    /// An edit would leave the message exactly as it is.
    #[error("message is not modified")]
    NotModified,

    /// The bot may not act on this chat (blocked, kicked, not a member).
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("api error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: ChatId, message: OutgoingMessage) -> Result<MessageRef, MessengerError>;

    async fn edit(&self, target: MessageRef, message: OutgoingMessage) -> Result<(), MessengerError>;

    async fn delete(&self, target: MessageRef) -> Result<(), MessengerError>;

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), MessengerError>;

    async fn membership(&self, channel_id: ChatId, user_id: UserId) -> Result<Membership, MessengerError>;

    async fn answer_inline(&self, query_id: &str, results: Vec<InlineArticle>) -> Result<(), MessengerError>;
}

/// Replace the message a button was pressed on, or send a new one when
/// there is none to edit. Reply keyboards can only travel on new messages.
pub async fn respond(
    messenger: &dyn Messenger,
    chat_id: ChatId,
    origin: Option<MessageRef>,
    message: OutgoingMessage,
) -> Result<(), MessengerError> {
    let editable = !matches!(message.keyboard, Some(Keyboard::Reply(_)) | Some(Keyboard::Remove));
    if let (Some(target), true) = (origin, editable) {
        match messenger.edit(target, message.clone()).await {
            Ok(()) | Err(MessengerError::NotModified) => return Ok(()),
            Err(e) => debug!("Edit of message {} failed ({}), sending instead", target.message_id, e),
        }
    }
    messenger.send(chat_id, message).await.map(|_| ())
}

use ostad_types::models::UserId;

use crate::messenger::MessengerError;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("user {0} is not an admin")]
    Unauthorized(UserId),

    #[error(transparent)]
    Messenger(#[from] MessengerError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type BotResult<T> = Result<T, BotError>;

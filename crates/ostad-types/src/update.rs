use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::models::{ChatId, UserId};

// -- Incoming --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: UserId,
    pub first_name: Option<String>,
}

/// Everything the core reacts to, already decoded from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Free text typed in a private chat, commands included.
    Message {
        from: Sender,
        chat_id: ChatId,
        text: String,
    },

    /// A press on an inline button. `action` is `None` when the payload
    /// did not decode, e.g. a button from an older release.
    Callback {
        id: String,
        from: Sender,
        message: Option<MessageRef>,
        action: Option<Action>,
    },

    /// Live search typed after the bot's @username.
    InlineQuery {
        id: String,
        from: Sender,
        query: String,
    },
}

impl Update {
    pub fn sender(&self) -> &Sender {
        match self {
            Self::Message { from, .. } => from,
            Self::Callback { from, .. } => from,
            Self::InlineQuery { from, .. } => from,
        }
    }
}

// -- Outgoing --

/// Address of a message that was already delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonTarget {
    Callback(Action),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub target: ButtonTarget,
}

impl Button {
    pub fn action(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Callback(action),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Url(url.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Buttons attached under the message.
    Inline(Vec<Vec<Button>>),
    /// Persistent menu replacing the user's keyboard.
    Reply(Vec<Vec<String>>),
    /// Remove a previously shown reply keyboard.
    Remove,
}

impl Keyboard {
    /// All callback actions on an inline keyboard, row by row.
    pub fn actions(&self) -> Vec<&Action> {
        match self {
            Self::Inline(rows) => rows
                .iter()
                .flatten()
                .filter_map(|b| match &b.target {
                    ButtonTarget::Callback(action) => Some(action),
                    ButtonTarget::Url(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// One entry of an inline-query answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub body: String,
}

/// Result of a channel membership lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Member,
    NotMember,
}

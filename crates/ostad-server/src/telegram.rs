//! Telegram Bot API over HTTPS JSON.
//!
//! `TelegramClient` implements the core's `Messenger` trait. The `Tg*`
//! types mirror the subset of the update payload the bot reads, and turn
//! into core `Update` values at the edge.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use ostad_bot::messenger::{Messenger, MessengerError};
use ostad_types::action::Action;
use ostad_types::models::{ChatId, UserId};
use ostad_types::update::{
    ButtonTarget, InlineArticle, Keyboard, Membership, MessageRef, OutgoingMessage, Sender, Update,
};

/// Seconds a `getUpdates` call may block waiting for news.
pub const POLL_TIMEOUT_SECS: u64 = 30;

const UPDATE_KINDS: [&str; 3] = ["message", "callback_query", "inline_query"];

pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
    #[serde(default)]
    is_member: bool,
}

impl TelegramClient {
    pub fn new(token: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("https://api.telegram.org/bot{token}"),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, MessengerError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| MessengerError::Transport(e.without_url().to_string()))?;

        let reply: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| MessengerError::Transport(e.without_url().to_string()))?;

        match reply {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                ..
            } => Err(api_error(
                error_code.unwrap_or_default(),
                description.unwrap_or_default(),
            )),
        }
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<TgUpdate>, MessengerError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": UPDATE_KINDS,
            }),
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str, secret: &str) -> Result<(), MessengerError> {
        let _: bool = self
            .call(
                "setWebhook",
                &json!({
                    "url": url,
                    "secret_token": secret,
                    "allowed_updates": UPDATE_KINDS,
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), MessengerError> {
        let _: bool = self.call("deleteWebhook", &json!({})).await?;
        Ok(())
    }
}

fn api_error(code: i64, description: String) -> MessengerError {
    if description.contains("message is not modified") {
        MessengerError::NotModified
    } else if code == 403 {
        MessengerError::Forbidden(description)
    } else {
        MessengerError::Api { code, description }
    }
}

fn reply_markup(keyboard: &Keyboard) -> Value {
    match keyboard {
        Keyboard::Inline(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| match &button.target {
                            ButtonTarget::Callback(action) => {
                                json!({ "text": button.label, "callback_data": action.to_string() })
                            }
                            ButtonTarget::Url(url) => json!({ "text": button.label, "url": url }),
                        })
                        .collect()
                })
                .collect();
            json!({ "inline_keyboard": rows })
        }
        Keyboard::Reply(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| row.iter().map(|label| json!({ "text": label })).collect())
                .collect();
            json!({ "keyboard": rows, "resize_keyboard": true })
        }
        Keyboard::Remove => json!({ "remove_keyboard": true }),
    }
}

fn message_body(message: &OutgoingMessage) -> Value {
    let mut body = json!({
        "text": message.text,
        "link_preview_options": { "is_disabled": true },
    });
    if let Some(keyboard) = &message.keyboard {
        body["reply_markup"] = reply_markup(keyboard);
    }
    body
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, chat_id: ChatId, message: OutgoingMessage) -> Result<MessageRef, MessengerError> {
        let mut body = message_body(&message);
        body["chat_id"] = json!(chat_id);
        let sent: TgMessage = self.call("sendMessage", &body).await?;
        Ok(MessageRef {
            chat_id: sent.chat.id,
            message_id: sent.message_id,
        })
    }

    async fn edit(&self, target: MessageRef, message: OutgoingMessage) -> Result<(), MessengerError> {
        let mut body = message_body(&message);
        body["chat_id"] = json!(target.chat_id);
        body["message_id"] = json!(target.message_id);
        // editMessageText answers with the Message, or `true` for inline messages
        let _: Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn delete(&self, target: MessageRef) -> Result<(), MessengerError> {
        let _: bool = self
            .call(
                "deleteMessage",
                &json!({ "chat_id": target.chat_id, "message_id": target.message_id }),
            )
            .await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), MessengerError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({
                    "callback_query_id": callback_id,
                    "text": text,
                    "show_alert": alert,
                }),
            )
            .await?;
        Ok(())
    }

    async fn membership(&self, channel_id: ChatId, user_id: UserId) -> Result<Membership, MessengerError> {
        let member: ChatMember = self
            .call(
                "getChatMember",
                &json!({ "chat_id": channel_id, "user_id": user_id }),
            )
            .await?;
        Ok(membership_of(&member))
    }

    async fn answer_inline(&self, query_id: &str, results: Vec<InlineArticle>) -> Result<(), MessengerError> {
        let results: Vec<Value> = results
            .into_iter()
            .map(|article| {
                json!({
                    "type": "article",
                    "id": article.id,
                    "title": article.title,
                    "description": article.description,
                    "input_message_content": { "message_text": article.body },
                })
            })
            .collect();
        let _: bool = self
            .call(
                "answerInlineQuery",
                &json!({
                    "inline_query_id": query_id,
                    "results": results,
                    "cache_time": 10,
                }),
            )
            .await?;
        Ok(())
    }
}

fn membership_of(member: &ChatMember) -> Membership {
    match member.status.as_str() {
        "creator" | "administrator" | "member" => Membership::Member,
        "restricted" if member.is_member => Membership::Member,
        _ => Membership::NotMember,
    }
}

// -- Incoming payloads --

#[derive(Debug, Clone, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    pub message: Option<TgMessage>,
    pub callback_query: Option<TgCallbackQuery>,
    pub inline_query: Option<TgInlineQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub chat: TgChat,
    pub from: Option<TgUser>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: UserId,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgCallbackQuery {
    pub id: String,
    pub from: TgUser,
    pub message: Option<TgMessage>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgInlineQuery {
    pub id: String,
    pub from: TgUser,
    pub query: String,
}

impl From<TgUser> for Sender {
    fn from(user: TgUser) -> Self {
        Sender {
            id: user.id,
            first_name: user.first_name,
        }
    }
}

impl TgUpdate {
    /// The core's view of this update. Kinds the bot does not handle,
    /// and messages without text or sender, yield `None`.
    pub fn into_update(self) -> Option<Update> {
        if let Some(query) = self.callback_query {
            let action = query.data.as_deref().and_then(|data| match data.parse::<Action>() {
                Ok(action) => Some(action),
                Err(e) => {
                    debug!("{}", e);
                    None
                }
            });
            return Some(Update::Callback {
                id: query.id,
                from: query.from.into(),
                message: query.message.map(|m| MessageRef {
                    chat_id: m.chat.id,
                    message_id: m.message_id,
                }),
                action,
            });
        }

        if let Some(query) = self.inline_query {
            return Some(Update::InlineQuery {
                id: query.id,
                from: query.from.into(),
                query: query.query,
            });
        }

        let message = self.message?;
        Some(Update::Message {
            from: message.from?.into(),
            chat_id: message.chat.id,
            text: message.text?,
        })
    }
}

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use sha2::{Digest, Sha256};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use ostad_bot::AppState;
use ostad_bot::queue::UpdateQueue;

use crate::config::{WEBHOOK_PATH, WebhookConfig};
use crate::telegram::{TelegramClient, TgUpdate};

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
struct WebhookState {
    queue: Arc<UpdateQueue>,
    secret: Arc<str>,
}

/// Secret Telegram echoes back on every webhook call, derived from the
/// bot token so it needs no configuration of its own.
pub fn webhook_secret(bot_token: &str) -> String {
    hex::encode(Sha256::digest(format!("ostadbank-webhook:{bot_token}")))
}

pub fn router(app: AppState, secret: &str) -> Router {
    let state = WebhookState {
        queue: UpdateQueue::new(app),
        secret: Arc::from(secret),
    };
    Router::new()
        .route(WEBHOOK_PATH, post(receive))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn receive(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Json(update): Json<TgUpdate>,
) -> StatusCode {
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if presented != Some(&*state.secret) {
        warn!("Webhook call {} rejected: bad secret", update.update_id);
        return StatusCode::UNAUTHORIZED;
    }

    // Queued before answering, so each user's updates keep Telegram's order.
    if let Some(update) = update.into_update() {
        state.queue.push(update);
    }
    StatusCode::OK
}

pub async fn serve(
    telegram: Arc<TelegramClient>,
    app: AppState,
    webhook: &WebhookConfig,
    bot_token: &str,
) -> anyhow::Result<()> {
    let secret = webhook_secret(bot_token);
    telegram.set_webhook(&webhook.url, &secret).await?;

    let addr: SocketAddr = format!("{}:{}", webhook.host, webhook.port).parse()?;
    info!("Webhook registered at {}, listening on {}", webhook.url, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(app, &secret)).await?;

    Ok(())
}

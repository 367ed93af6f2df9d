use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, warn};

use ostad_bot::{AppState, dispatcher};
use ostad_types::models::UserId;
use ostad_types::update::Update;

use crate::telegram::{TelegramClient, TgUpdate};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-poll `getUpdates` forever.
pub async fn run_polling(telegram: Arc<TelegramClient>, state: AppState) -> anyhow::Result<()> {
    telegram.delete_webhook().await?;
    info!("Long polling for updates");

    let mut offset = 0;
    loop {
        match telegram.get_updates(offset).await {
            Ok(updates) => {
                if let Some(last) = updates.iter().map(|u| u.update_id).max() {
                    offset = last + 1;
                }
                handle_batch(&state, updates).await;
            }
            Err(e) => {
                warn!("getUpdates failed: {}", e);
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

/// Users are served concurrently; one user's updates run in arrival order.
async fn handle_batch(state: &AppState, updates: Vec<TgUpdate>) {
    let mut by_user: HashMap<UserId, Vec<Update>> = HashMap::new();
    for update in updates.into_iter().filter_map(TgUpdate::into_update) {
        by_user.entry(update.sender().id).or_default().push(update);
    }

    let mut tasks = JoinSet::new();
    for (_, queue) in by_user {
        let state = state.clone();
        tasks.spawn(async move {
            for update in queue {
                dispatcher::handle_update(&state, update).await;
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!("Update task panicked: {}", e);
        }
    }
}

mod config;
mod polling;
mod telegram;
mod webhook;

use std::sync::Arc;

use tracing::info;

use ostad_bot::{AppStateInner, backup};
use ostad_db::Database;

use crate::config::Config;
use crate::telegram::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ostadbank=debug,ostad_bot=debug,ostad_db=info,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    // Shared state
    let telegram = Arc::new(TelegramClient::new(&config.bot_token)?);
    let state = AppStateInner::new(db, telegram.clone(), config.bot_config())?;

    // Spawn backup task
    tokio::spawn(backup::run_backup_loop(
        state.clone(),
        config.backup_dir.clone(),
        config.backup_interval,
        config.backup_keep,
    ));

    info!("ostadbank {} starting", env!("CARGO_PKG_VERSION"));
    match &config.webhook {
        Some(hook) => webhook::serve(telegram, state, hook, &config.bot_token).await,
        None => polling::run_polling(telegram, state).await,
    }
}

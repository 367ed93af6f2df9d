use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use ostad_bot::BotConfig;
use ostad_types::models::{ChatId, UserId};

/// Path Telegram posts updates to in webhook mode.
pub const WEBHOOK_PATH: &str = "/webhook";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub owner_id: UserId,
    pub channel_id: ChatId,
    pub backup_chat_id: ChatId,
    pub db_path: PathBuf,
    pub backup_dir: PathBuf,
    pub backup_interval: Duration,
    /// Snapshots kept in `backup_dir`; older ones are deleted.
    pub backup_keep: usize,
    /// `None` means long polling.
    pub webhook: Option<WebhookConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Public URL registered with Telegram, `WEBHOOK_PATH` included.
    pub url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| get(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| get(name).with_context(|| format!("{name} must be set"));
        let id = |name: &str| -> Result<i64> {
            required(name)?
                .trim()
                .parse()
                .with_context(|| format!("{name} must be a numeric id"))
        };

        let backup_mins: u64 = match get("OSTAD_BACKUP_INTERVAL_MINS") {
            Some(v) => v
                .trim()
                .parse()
                .context("OSTAD_BACKUP_INTERVAL_MINS must be a whole number of minutes")?,
            None => 30,
        };
        if backup_mins == 0 {
            anyhow::bail!("OSTAD_BACKUP_INTERVAL_MINS must be at least 1");
        }

        let backup_keep: usize = match get("OSTAD_BACKUP_KEEP") {
            Some(v) => v
                .trim()
                .parse()
                .context("OSTAD_BACKUP_KEEP must be a whole number")?,
            None => 48,
        };
        if backup_keep == 0 {
            anyhow::bail!("OSTAD_BACKUP_KEEP must be at least 1");
        }

        let public_base = get("WEBHOOK_URL").or_else(|| get("DOMAIN_NAME").map(|d| format!("https://{d}")));
        let webhook = match public_base {
            Some(base) => Some(WebhookConfig {
                url: format!("{}{WEBHOOK_PATH}", base.trim_end_matches('/')),
                host: get("WEBHOOK_HOST").unwrap_or_else(|| "0.0.0.0".into()),
                port: get("WEBHOOK_PORT")
                    .unwrap_or_else(|| "8443".into())
                    .parse()
                    .context("WEBHOOK_PORT must be a port number")?,
            }),
            None => None,
        };

        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
            owner_id: id("OWNER_ID")?,
            channel_id: id("CHANNEL_ID")?,
            backup_chat_id: id("BACKUP_CHANNEL_ID")?,
            db_path: PathBuf::from(get("OSTAD_DB_PATH").unwrap_or_else(|| "ostadbank.db".into())),
            backup_dir: PathBuf::from(get("OSTAD_BACKUP_DIR").unwrap_or_else(|| "./backups".into())),
            backup_interval: Duration::from_secs(backup_mins * 60),
            backup_keep,
            webhook,
        })
    }

    pub fn bot_config(&self) -> BotConfig {
        BotConfig {
            owner_id: self.owner_id,
            channel_id: self.channel_id,
            backup_chat_id: self.backup_chat_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const MINIMAL: [(&str, &str); 4] = [
        ("BOT_TOKEN", "123:abc"),
        ("OWNER_ID", "42"),
        ("CHANNEL_ID", "-1001"),
        ("BACKUP_CHANNEL_ID", "-1002"),
    ];

    #[test]
    fn defaults_apply_and_polling_is_default() {
        let config = Config::from_lookup(lookup(&MINIMAL)).unwrap();
        assert_eq!(config.owner_id, 42);
        assert_eq!(config.channel_id, -1001);
        assert_eq!(config.db_path, PathBuf::from("ostadbank.db"));
        assert_eq!(config.backup_interval, Duration::from_secs(30 * 60));
        assert_eq!(config.backup_keep, 48);
        assert!(config.webhook.is_none());
    }

    #[test]
    fn missing_or_bad_ids_fail() {
        let err = Config::from_lookup(lookup(&MINIMAL[..3])).unwrap_err();
        assert!(err.to_string().contains("BACKUP_CHANNEL_ID"));

        let mut vars = MINIMAL.to_vec();
        vars[1] = ("OWNER_ID", "owner");
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("OWNER_ID"));
    }

    #[test]
    fn domain_name_enables_webhook() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("DOMAIN_NAME", "bot.example.org"));
        vars.push(("WEBHOOK_PORT", "9000"));
        let webhook = Config::from_lookup(lookup(&vars)).unwrap().webhook.unwrap();
        assert_eq!(
            webhook,
            WebhookConfig {
                url: "https://bot.example.org/webhook".into(),
                host: "0.0.0.0".into(),
                port: 9000,
            }
        );
    }

    #[test]
    fn webhook_url_wins_over_domain() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("DOMAIN_NAME", "bot.example.org"));
        vars.push(("WEBHOOK_URL", "https://hooks.example.org/"));
        let webhook = Config::from_lookup(lookup(&vars)).unwrap().webhook.unwrap();
        assert_eq!(webhook.url, "https://hooks.example.org/webhook");
    }

    #[test]
    fn backup_retention_is_configurable() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("OSTAD_BACKUP_KEEP", "5"));
        assert_eq!(Config::from_lookup(lookup(&vars)).unwrap().backup_keep, 5);

        vars.pop();
        vars.push(("OSTAD_BACKUP_KEEP", "0"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("OSTAD_BACKUP_KEEP"));
    }
}

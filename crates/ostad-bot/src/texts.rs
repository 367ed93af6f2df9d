use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, RwLock};

use tracing::{error, warn};

use ostad_db::{Database, Page};
use ostad_types::models::BotText;

use crate::BotResult;

/// Key-value lookup for every user-facing string.
///
/// Values are cached after the first read and the cache is updated on
/// every edit, so admins see their changes immediately. A key that does
/// not exist renders as `⚠️[key]` instead of failing the handler.
pub struct TextStore {
    db: Arc<Database>,
    cache: RwLock<HashMap<String, String>>,
}

impl TextStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> String {
        if let Some(value) = self.cached(key) {
            return value;
        }

        match self.db.get_text(key) {
            Ok(Some(value)) => {
                if let Ok(mut cache) = self.cache.write() {
                    cache.insert(key.to_string(), value.clone());
                }
                value
            }
            Ok(None) => {
                warn!("Missing bot text '{}'", key);
                missing(key)
            }
            Err(e) => {
                error!("Failed to load bot text '{}': {}", key, e);
                missing(key)
            }
        }
    }

    /// Look up `key` and substitute each `{name}` placeholder.
    pub fn format(&self, key: &str, params: &[(&str, &(dyn Display + Sync))]) -> String {
        render(&self.get(key), params)
    }

    /// True when `input` is exactly the current value of `key`. Used to
    /// recognise presses on the reply-keyboard menu.
    pub fn matches(&self, key: &str, input: &str) -> bool {
        self.get(key) == input.trim()
    }

    /// Replace the value of an existing key. Returns false for unknown keys.
    pub fn set(&self, key: &str, value: &str) -> BotResult<bool> {
        let updated = self.db.set_text(key, value)?;
        if updated {
            if let Ok(mut cache) = self.cache.write() {
                cache.insert(key.to_string(), value.to_string());
            }
        }
        Ok(updated)
    }

    pub fn page(&self, page: u32, page_size: u32) -> BotResult<Page<BotText>> {
        Ok(self.db.page_texts(page, page_size)?)
    }

    fn cached(&self, key: &str) -> Option<String> {
        self.cache.read().ok()?.get(key).cloned()
    }
}

/// Single pass over `template`: substituted values are never scanned
/// again, so a name containing `{reason}` stays literal. Unknown
/// placeholders are left as written.
fn render(template: &str, params: &[(&str, &(dyn Display + Sync))]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            params
                .iter()
                .find(|(param, _)| *param == name)
                .map(|(_, value)| (value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(&value.to_string());
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn missing(key: &str) -> String {
    format!("⚠️[{key}]")
}

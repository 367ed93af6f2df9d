use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::info;

use ostad_types::models::BotText;

use crate::defaults::DEFAULT_TEXTS;
use crate::{Database, OptionalExt, Page, page_window, total_pages};

/// Insert every default text whose key is not stored yet. Edited values
/// are never overwritten.
pub(crate) fn seed_defaults(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO bot_texts (key, value) VALUES (?1, ?2)")?;
    let mut added = 0;
    for (key, value) in DEFAULT_TEXTS {
        added += stmt.execute(params![key, value])?;
    }
    if added > 0 {
        info!("Seeded {} default bot texts", added);
    }
    Ok(())
}

impl Database {
    pub fn get_text(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT value FROM bot_texts WHERE key = ?1", [key], |r| r.get(0))
                .optional()
        })
    }

    /// Update an existing text. Unknown keys are left alone and reported
    /// as `false`.
    pub fn set_text(&self, key: &str, value: &str) -> Result<bool> {
        self.with_tx(|conn| {
            let changed = conn.execute(
                "UPDATE bot_texts SET value = ?1 WHERE key = ?2",
                params![value, key],
            )?;
            Ok(changed > 0)
        })
    }

    /// Texts ordered by key.
    pub fn page_texts(&self, page: u32, page_size: u32) -> Result<Page<BotText>> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM bot_texts", [], |r| r.get(0))?;
            let total = total as u64;
            let items = match page_window(total, page, page_size) {
                Some((limit, offset)) => {
                    let mut stmt = conn.prepare(
                        "SELECT key, value FROM bot_texts ORDER BY key LIMIT ?1 OFFSET ?2",
                    )?;
                    stmt.query_map(params![limit, offset], |row| {
                        Ok(BotText {
                            key: row.get(0)?,
                            value: row.get(1)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => Vec::new(),
            };
            Ok(Page {
                items,
                page,
                total_pages: total_pages(total, page_size),
                total,
            })
        })
    }
}

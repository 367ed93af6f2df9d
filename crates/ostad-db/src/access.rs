use anyhow::Result;
use rusqlite::params;
use tracing::info;

use ostad_types::models::{ChatId, ExperienceStatus, RequiredChannel, Stats, User, UserId};

use crate::{Database, OptionalExt, Page, page_window, parse_timestamp, total_pages};

pub const FORCE_SUBSCRIBE_KEY: &str = "force_subscribe";

impl Database {
    // -- Admins --

    pub fn is_admin(&self, user_id: UserId) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM admins WHERE user_id = ?1", [user_id], |r| r.get(0))
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Insert the admin if absent. Returns true when a row was added.
    pub fn add_admin(&self, user_id: UserId) -> Result<bool> {
        self.with_tx(|conn| {
            let added = conn.execute("INSERT OR IGNORE INTO admins (user_id) VALUES (?1)", [user_id])?;
            if added > 0 {
                info!("Admin {} added", user_id);
            }
            Ok(added > 0)
        })
    }

    pub fn delete_admin(&self, user_id: UserId) -> Result<bool> {
        self.with_tx(|conn| Ok(conn.execute("DELETE FROM admins WHERE user_id = ?1", [user_id])? > 0))
    }

    pub fn list_admins(&self) -> Result<Vec<UserId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT user_id FROM admins ORDER BY user_id")?;
            let ids = stmt
                .query_map([], |r| r.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    pub fn page_admins(&self, page: u32, page_size: u32) -> Result<Page<UserId>> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM admins", [], |r| r.get(0))?;
            let total = total as u64;
            let items = match page_window(total, page, page_size) {
                Some((limit, offset)) => {
                    let mut stmt = conn.prepare(
                        "SELECT user_id FROM admins ORDER BY user_id LIMIT ?1 OFFSET ?2",
                    )?;
                    stmt.query_map(params![limit, offset], |r| r.get(0))?
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

    // -- Users --

    pub fn upsert_user(&self, user_id: UserId, first_name: Option<&str>) -> Result<()> {
        self.with_tx(|conn| {
            conn.execute(
                "INSERT INTO users (user_id, first_name) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET first_name = excluded.first_name",
                params![user_id, first_name],
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id, first_name, joined_at FROM users WHERE user_id = ?1",
                [user_id],
                |row| {
                    let joined_at: String = row.get(2)?;
                    Ok(User {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        joined_at: parse_timestamp(&joined_at),
                    })
                },
            )
            .optional()
        })
    }

    pub fn all_user_ids(&self) -> Result<Vec<UserId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT user_id FROM users ORDER BY joined_at, user_id")?;
            let ids = stmt
                .query_map([], |r| r.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    // -- Settings --

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT value FROM settings WHERE key = ?1", [key], |r| r.get(0))
                .optional()
        })
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.with_tx(|conn| {
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
    }

    pub fn force_subscribe(&self) -> Result<bool> {
        Ok(self
            .get_setting(FORCE_SUBSCRIBE_KEY)?
            .is_some_and(|v| v == "true"))
    }

    /// Flip the force-subscribe flag and return the new value.
    pub fn toggle_force_subscribe(&self) -> Result<bool> {
        let enabled = !self.force_subscribe()?;
        self.set_setting(FORCE_SUBSCRIBE_KEY, if enabled { "true" } else { "false" })?;
        info!("force_subscribe set to {}", enabled);
        Ok(enabled)
    }

    // -- Required channels --

    pub fn add_required_channel(&self, channel_id: ChatId, invite_link: &str) -> Result<()> {
        self.with_tx(|conn| {
            conn.execute(
                "INSERT INTO required_channels (channel_id, invite_link) VALUES (?1, ?2)
                 ON CONFLICT(channel_id) DO UPDATE SET invite_link = excluded.invite_link",
                params![channel_id, invite_link],
            )?;
            Ok(())
        })
    }

    pub fn delete_required_channel(&self, channel_id: ChatId) -> Result<bool> {
        self.with_tx(|conn| {
            Ok(conn.execute("DELETE FROM required_channels WHERE channel_id = ?1", [channel_id])? > 0)
        })
    }

    pub fn required_channels(&self) -> Result<Vec<RequiredChannel>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT channel_id, invite_link FROM required_channels ORDER BY channel_id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(RequiredChannel {
                        channel_id: row.get(0)?,
                        invite_link: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Stats --

    pub fn stats(&self) -> Result<Stats> {
        let count = |table: &str| -> Result<u64> {
            self.with_conn(|conn| {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
                Ok(n as u64)
            })
        };

        Ok(Stats {
            users: count("users")?,
            pending: self.count_by_status(ExperienceStatus::Pending)?,
            approved: self.count_by_status(ExperienceStatus::Approved)?,
            rejected: self.count_by_status(ExperienceStatus::Rejected)?,
            fields: count("fields")?,
            majors: count("majors")?,
            courses: count("courses")?,
            professors: count("professors")?,
        })
    }
}

use anyhow::Result;
use rusqlite::params;

use ostad_types::models::UserId;

use crate::{Database, OptionalExt};

/// Serialized conversation state, one row per user mid-dialogue.
impl Database {
    pub fn load_session(&self, user_id: UserId) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT state FROM sessions WHERE user_id = ?1", [user_id], |r| r.get(0))
                .optional()
        })
    }

    pub fn save_session(&self, user_id: UserId, state: &str) -> Result<()> {
        self.with_tx(|conn| {
            conn.execute(
                "INSERT INTO sessions (user_id, state, updated_at) VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(user_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
                params![user_id, state],
            )?;
            Ok(())
        })
    }

    pub fn delete_session(&self, user_id: UserId) -> Result<bool> {
        self.with_tx(|conn| Ok(conn.execute("DELETE FROM sessions WHERE user_id = ?1", [user_id])? > 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trip_and_delete() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_session(3).unwrap().is_none());

        db.save_session(3, "{\"a\":1}").unwrap();
        db.save_session(3, "{\"a\":2}").unwrap();
        assert_eq!(db.load_session(3).unwrap().as_deref(), Some("{\"a\":2}"));

        assert!(db.delete_session(3).unwrap());
        assert!(!db.delete_session(3).unwrap());
        assert!(db.load_session(3).unwrap().is_none());
    }
}

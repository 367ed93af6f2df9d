use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                user_id     INTEGER PRIMARY KEY,
                first_name  TEXT,
                joined_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE admins (
                user_id     INTEGER PRIMARY KEY
            );

            CREATE TABLE bot_texts (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL
            );

            CREATE TABLE settings (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL
            );

            CREATE TABLE required_channels (
                channel_id  INTEGER PRIMARY KEY,
                invite_link TEXT NOT NULL
            );

            CREATE TABLE fields (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE
            );

            CREATE TABLE majors (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                field_id    INTEGER NOT NULL REFERENCES fields(id) ON DELETE CASCADE,
                UNIQUE(field_id, name)
            );

            CREATE TABLE courses (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                major_id    INTEGER NOT NULL REFERENCES majors(id) ON DELETE CASCADE,
                UNIQUE(major_id, name)
            );

            CREATE TABLE professors (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE
            );

            -- AUTOINCREMENT: stale moderation buttons carry experience ids,
            -- so an id must never be handed out twice. Registry rows in use
            -- by an experience cannot be deleted (RESTRICT).
            CREATE TABLE experiences (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id             INTEGER NOT NULL,
                field_id            INTEGER NOT NULL REFERENCES fields(id) ON DELETE RESTRICT,
                major_id            INTEGER NOT NULL REFERENCES majors(id) ON DELETE RESTRICT,
                course_id           INTEGER NOT NULL REFERENCES courses(id) ON DELETE RESTRICT,
                professor_id        INTEGER NOT NULL REFERENCES professors(id) ON DELETE RESTRICT,
                teaching_style      TEXT NOT NULL,
                notes               TEXT NOT NULL,
                project             TEXT NOT NULL,
                attendance_required INTEGER NOT NULL,
                attendance_details  TEXT NOT NULL,
                exam                TEXT NOT NULL,
                conclusion          TEXT NOT NULL,
                status              TEXT NOT NULL DEFAULT 'pending'
                                    CHECK (status IN ('pending', 'approved', 'rejected')),
                admin_chat_id       INTEGER,
                admin_message_id    INTEGER,
                channel_message_id  INTEGER,
                redacted            INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_experiences_status ON experiences(status, id);
            CREATE INDEX idx_experiences_user ON experiences(user_id);

            INSERT OR IGNORE INTO settings (key, value) VALUES ('force_subscribe', 'false');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (conversation sessions)");
        conn.execute_batch(
            "
            CREATE TABLE sessions (
                user_id     INTEGER PRIMARY KEY,
                state       TEXT NOT NULL,
                updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", CURRENT_SCHEMA_VERSION);
    Ok(())
}

use anyhow::{Result, bail};
use rusqlite::{Connection, Row, params};
use tracing::info;

use ostad_types::models::{Experience, ExperienceStatus, NewExperience, UserId};
use ostad_types::update::MessageRef;

use crate::{Database, OptionalExt, Page, like_pattern, page_window, parse_timestamp, total_pages};

const EXPERIENCE_SELECT: &str = "
    SELECT e.id, e.user_id,
           e.field_id, f.name, e.major_id, m.name,
           e.course_id, c.name, e.professor_id, p.name,
           e.teaching_style, e.notes, e.project,
           e.attendance_required, e.attendance_details, e.exam, e.conclusion,
           e.status, e.admin_chat_id, e.admin_message_id, e.channel_message_id,
           e.redacted, e.created_at
    FROM experiences e
    JOIN fields f ON f.id = e.field_id
    JOIN majors m ON m.id = e.major_id
    JOIN courses c ON c.id = e.course_id
    JOIN professors p ON p.id = e.professor_id";

/// Outcome of a conditional status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The row was in an allowed state and has been updated.
    Applied,
    /// The row exists but its status did not allow the change.
    Conflict(ExperienceStatus),
    /// No such row (or not owned by the caller).
    Missing,
}

impl Database {
    /// Store a completed submission as `pending`. The course must sit under
    /// the major, and the major under the field.
    pub fn insert_experience(&self, exp: &NewExperience) -> Result<i64> {
        self.with_tx(|conn| {
            let consistent: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM courses c JOIN majors m ON m.id = c.major_id
                     WHERE c.id = ?1 AND m.id = ?2 AND m.field_id = ?3",
                    params![exp.course_id, exp.major_id, exp.field_id],
                    |r| r.get(0),
                )
                .optional()?;
            if consistent.is_none() {
                bail!(
                    "course {} is not under major {} / field {}",
                    exp.course_id,
                    exp.major_id,
                    exp.field_id
                );
            }

            conn.execute(
                "INSERT INTO experiences (
                    user_id, field_id, major_id, course_id, professor_id,
                    teaching_style, notes, project, attendance_required,
                    attendance_details, exam, conclusion, status
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 'pending')",
                params![
                    exp.user_id,
                    exp.field_id,
                    exp.major_id,
                    exp.course_id,
                    exp.professor_id,
                    exp.teaching_style,
                    exp.notes,
                    exp.project,
                    exp.attendance_required,
                    exp.attendance_details,
                    exp.exam,
                    exp.conclusion,
                ],
            )?;
            let id = conn.last_insert_rowid();
            info!("Experience {} stored for user {}", id, exp.user_id);
            Ok(id)
        })
    }

    pub fn get_experience(&self, id: i64) -> Result<Option<Experience>> {
        self.with_conn(|conn| query_experience(conn, id))
    }

    pub fn experiences_by_user(&self, user_id: UserId) -> Result<Vec<Experience>> {
        let sql = format!("{EXPERIENCE_SELECT} WHERE e.user_id = ?1 ORDER BY e.id DESC");
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_experience)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Remember the moderation message so it can be edited later.
    pub fn set_admin_message(&self, id: i64, message: MessageRef) -> Result<()> {
        self.with_tx(|conn| {
            conn.execute(
                "UPDATE experiences SET admin_chat_id = ?1, admin_message_id = ?2 WHERE id = ?3",
                params![message.chat_id, message.message_id, id],
            )?;
            Ok(())
        })
    }

    /// `pending -> approved`, stamping the channel post in the same commit.
    pub fn approve_experience(&self, id: i64, channel_message_id: i64) -> Result<StatusChange> {
        self.with_tx(|conn| {
            let change = check_status(conn, id, None, &[ExperienceStatus::Pending])?;
            if change == StatusChange::Applied {
                conn.execute(
                    "UPDATE experiences
                     SET status = 'approved', channel_message_id = ?1, redacted = 0
                     WHERE id = ?2",
                    params![channel_message_id, id],
                )?;
            }
            Ok(change)
        })
    }

    /// `pending -> rejected`.
    pub fn reject_experience(&self, id: i64) -> Result<StatusChange> {
        self.with_tx(|conn| {
            let change = check_status(conn, id, None, &[ExperienceStatus::Pending])?;
            if change == StatusChange::Applied {
                conn.execute("UPDATE experiences SET status = 'rejected' WHERE id = ?1", [id])?;
            }
            Ok(change)
        })
    }

    /// `approved | rejected -> pending`, only for the submitter's own row.
    pub fn reset_for_review(&self, id: i64, user_id: UserId) -> Result<StatusChange> {
        self.with_tx(|conn| {
            let change = check_status(
                conn,
                id,
                Some(user_id),
                &[ExperienceStatus::Approved, ExperienceStatus::Rejected],
            )?;
            if change == StatusChange::Applied {
                conn.execute("UPDATE experiences SET status = 'pending' WHERE id = ?1", [id])?;
            }
            Ok(change)
        })
    }

    /// Delete the submitter's own row while it is still `pending`.
    pub fn delete_pending_experience(&self, id: i64, user_id: UserId) -> Result<StatusChange> {
        self.with_tx(|conn| {
            let change = check_status(conn, id, Some(user_id), &[ExperienceStatus::Pending])?;
            if change == StatusChange::Applied {
                conn.execute("DELETE FROM experiences WHERE id = ?1", [id])?;
                info!("Experience {} withdrawn by user {} for editing", id, user_id);
            }
            Ok(change)
        })
    }

    /// Flag the channel post as redacted. Returns false when it already was.
    pub fn mark_redacted(&self, id: i64) -> Result<bool> {
        self.with_tx(|conn| {
            let changed = conn.execute(
                "UPDATE experiences SET redacted = 1 WHERE id = ?1 AND redacted = 0",
                [id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Experiences in one status, newest first.
    pub fn page_by_status(
        &self,
        status: ExperienceStatus,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Experience>> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM experiences WHERE status = ?1",
                [status.as_str()],
                |r| r.get(0),
            )?;
            let total = total as u64;
            let items = match page_window(total, page, page_size) {
                Some((limit, offset)) => {
                    let sql = format!(
                        "{EXPERIENCE_SELECT} WHERE e.status = ?1 ORDER BY e.id DESC LIMIT ?2 OFFSET ?3"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map(params![status.as_str(), limit, offset], map_experience)?
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

    /// Substring match on professor or course name, newest first.
    /// `approved_only` restricts to published content.
    pub fn search_experiences(
        &self,
        needle: &str,
        approved_only: bool,
        limit: u32,
    ) -> Result<Vec<Experience>> {
        let status_filter = if approved_only {
            " AND e.status = 'approved'"
        } else {
            ""
        };
        let sql = format!(
            "{EXPERIENCE_SELECT}
             WHERE (p.name LIKE ?1 ESCAPE '\\' OR c.name LIKE ?1 ESCAPE '\\'){status_filter}
             ORDER BY e.id DESC
             LIMIT ?2"
        );
        let pattern = like_pattern(needle.trim());
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![pattern, limit], map_experience)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_by_status(&self, status: ExperienceStatus) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM experiences WHERE status = ?1",
                [status.as_str()],
                |r| r.get(0),
            )?;
            Ok(n as u64)
        })
    }
}

/// Re-read the row inside the caller's transaction and decide whether a
/// transition from one of `allowed` may proceed.
fn check_status(
    conn: &Connection,
    id: i64,
    owner: Option<UserId>,
    allowed: &[ExperienceStatus],
) -> Result<StatusChange> {
    let row: Option<(String, UserId)> = conn
        .query_row(
            "SELECT status, user_id FROM experiences WHERE id = ?1",
            [id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;

    let Some((status, user_id)) = row else {
        return Ok(StatusChange::Missing);
    };
    if owner.is_some_and(|owner| owner != user_id) {
        return Ok(StatusChange::Missing);
    }

    let status: ExperienceStatus = status.parse()?;
    if allowed.contains(&status) {
        Ok(StatusChange::Applied)
    } else {
        Ok(StatusChange::Conflict(status))
    }
}

fn query_experience(conn: &Connection, id: i64) -> Result<Option<Experience>> {
    let sql = format!("{EXPERIENCE_SELECT} WHERE e.id = ?1");
    conn.query_row(&sql, [id], map_experience).optional()
}

fn map_experience(row: &Row<'_>) -> rusqlite::Result<Experience> {
    let status: String = row.get(17)?;
    let status = status.parse::<ExperienceStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(17, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: String = row.get(22)?;

    Ok(Experience {
        id: row.get(0)?,
        user_id: row.get(1)?,
        field_id: row.get(2)?,
        field_name: row.get(3)?,
        major_id: row.get(4)?,
        major_name: row.get(5)?,
        course_id: row.get(6)?,
        course_name: row.get(7)?,
        professor_id: row.get(8)?,
        professor_name: row.get(9)?,
        teaching_style: row.get(10)?,
        notes: row.get(11)?,
        project: row.get(12)?,
        attendance_required: row.get(13)?,
        attendance_details: row.get(14)?,
        exam: row.get(15)?,
        conclusion: row.get(16)?,
        status,
        admin_chat_id: row.get(18)?,
        admin_message_id: row.get(19)?,
        channel_message_id: row.get(20)?,
        redacted: row.get(21)?,
        created_at: parse_timestamp(&created_at),
    })
}

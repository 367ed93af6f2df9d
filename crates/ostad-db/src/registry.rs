use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::info;

use ostad_types::models::{Course, Field, Major, NamedItem, Professor, RegistryKind};

use crate::{Database, OptionalExt, Page, page_window, total_pages};

impl Database {
    // -- Fields --

    pub fn list_fields(&self) -> Result<Vec<Field>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM fields ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Field {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn add_field(&self, name: &str) -> Result<i64> {
        self.with_tx(|conn| {
            conn.execute("INSERT INTO fields (name) VALUES (?1)", [name])?;
            Ok(conn.last_insert_rowid())
        })
    }

    // -- Majors --

    pub fn list_majors(&self, field_id: i64) -> Result<Vec<Major>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, field_id FROM majors WHERE field_id = ?1 ORDER BY name")?;
            let rows = stmt
                .query_map([field_id], |row| {
                    Ok(Major {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        field_id: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_major(&self, id: i64) -> Result<Option<Major>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, field_id FROM majors WHERE id = ?1",
                [id],
                |row| {
                    Ok(Major {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        field_id: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn add_major(&self, field_id: i64, name: &str) -> Result<i64> {
        self.with_tx(|conn| {
            conn.execute(
                "INSERT INTO majors (name, field_id) VALUES (?1, ?2)",
                params![name, field_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    // -- Courses --

    pub fn list_courses(&self, major_id: i64) -> Result<Vec<Course>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, major_id FROM courses WHERE major_id = ?1 ORDER BY name")?;
            let rows = stmt
                .query_map([major_id], |row| {
                    Ok(Course {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        major_id: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_course(&self, id: i64) -> Result<Option<Course>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, major_id FROM courses WHERE id = ?1",
                [id],
                |row| {
                    Ok(Course {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        major_id: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn add_course(&self, major_id: i64, name: &str) -> Result<i64> {
        self.with_tx(|conn| {
            conn.execute(
                "INSERT INTO courses (name, major_id) VALUES (?1, ?2)",
                params![name, major_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    // -- Professors --

    pub fn list_professors(&self) -> Result<Vec<Professor>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM professors ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Professor {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn add_professor(&self, name: &str) -> Result<i64> {
        self.with_tx(|conn| {
            conn.execute("INSERT INTO professors (name) VALUES (?1)", [name])?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Professor names are globally unique: reuse the row when the name
    /// already exists. Returns `(id, created)`.
    pub fn get_or_create_professor(&self, name: &str) -> Result<(i64, bool)> {
        self.with_tx(|conn| {
            let existing: Option<i64> = conn
                .query_row("SELECT id FROM professors WHERE name = ?1", [name], |r| r.get(0))
                .optional()?;
            if let Some(id) = existing {
                return Ok((id, false));
            }
            conn.execute("INSERT INTO professors (name) VALUES (?1)", [name])?;
            let id = conn.last_insert_rowid();
            info!("Created professor {} ({})", name, id);
            Ok((id, true))
        })
    }

    // -- Generic admin operations --

    pub fn get_item(&self, kind: RegistryKind, id: i64) -> Result<Option<NamedItem>> {
        let sql = format!("SELECT id, name FROM {} WHERE id = ?1", kind.table());
        self.with_conn(|conn| {
            conn.query_row(&sql, [id], |row| {
                Ok(NamedItem {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()
        })
    }

    /// Items of one kind ordered by name.
    pub fn page_items(&self, kind: RegistryKind, page: u32, page_size: u32) -> Result<Page<NamedItem>> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", kind.table()),
                [],
                |r| r.get(0),
            )?;
            let total = total as u64;
            let items = match page_window(total, page, page_size) {
                Some((limit, offset)) => query_named_page(conn, kind, limit, offset)?,
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

    pub fn rename_item(&self, kind: RegistryKind, id: i64, name: &str) -> Result<bool> {
        let sql = format!("UPDATE {} SET name = ?1 WHERE id = ?2", kind.table());
        self.with_tx(|conn| Ok(conn.execute(&sql, params![name, id])? > 0))
    }

    /// Delete one registry row. A Field takes its Majors and a Major its
    /// Courses, but nothing is removed while an experience still refers to
    /// the row or to anything below it.
    pub fn delete_item(&self, kind: RegistryKind, id: i64) -> Result<ItemRemoval> {
        let removal = self.with_tx(|conn| {
            let in_use: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM experiences WHERE {} = ?1", experience_column(kind)),
                [id],
                |r| r.get(0),
            )?;
            if in_use > 0 {
                return Ok(ItemRemoval::InUse(in_use as u64));
            }
            let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
            Ok(if conn.execute(&sql, [id])? > 0 {
                ItemRemoval::Deleted
            } else {
                ItemRemoval::NotFound
            })
        })?;
        match removal {
            ItemRemoval::Deleted => info!("Deleted {:?} {}", kind, id),
            ItemRemoval::InUse(n) => info!("Kept {:?} {}: used by {} experience(s)", kind, id, n),
            ItemRemoval::NotFound => {}
        }
        Ok(removal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRemoval {
    Deleted,
    NotFound,
    /// Number of experiences still referring to the row.
    InUse(u64),
}

// Every experience carries its whole path, so one column covers the
// rows a cascade would reach.
fn experience_column(kind: RegistryKind) -> &'static str {
    match kind {
        RegistryKind::Field => "field_id",
        RegistryKind::Major => "major_id",
        RegistryKind::Course => "course_id",
        RegistryKind::Professor => "professor_id",
    }
}

fn query_named_page(
    conn: &Connection,
    kind: RegistryKind,
    limit: i64,
    offset: i64,
) -> Result<Vec<NamedItem>> {
    let sql = format!(
        "SELECT id, name FROM {} ORDER BY name, id LIMIT ?1 OFFSET ?2",
        kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![limit, offset], |row| {
            Ok(NamedItem {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_constraint_violation;

    fn seeded() -> (Database, i64, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let field = db.add_field("Engineering").unwrap();
        let major = db.add_major(field, "CS").unwrap();
        let course = db.add_course(major, "Algorithms").unwrap();
        (db, field, major, course)
    }

    #[test]
    fn deleting_field_cascades_to_majors_and_courses() {
        let (db, field, major, course) = seeded();
        let other_field = db.add_field("Science").unwrap();
        let other_major = db.add_major(other_field, "Physics").unwrap();

        assert_eq!(db.delete_item(RegistryKind::Field, field).unwrap(), ItemRemoval::Deleted);

        assert!(db.get_major(major).unwrap().is_none());
        assert!(db.get_course(course).unwrap().is_none());
        assert!(db.get_major(other_major).unwrap().is_some());

        let orphans: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM majors WHERE field_id NOT IN (SELECT id FROM fields)",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn rows_used_by_experiences_are_kept() {
        let db = Database::open_in_memory().unwrap();
        let id = crate::experiences::tests::sample(&db, 10);
        db.approve_experience(id, 555).unwrap();
        let exp = db.get_experience(id).unwrap().unwrap();

        for (kind, row) in [
            (RegistryKind::Professor, exp.professor_id),
            (RegistryKind::Course, exp.course_id),
            (RegistryKind::Major, exp.major_id),
            (RegistryKind::Field, exp.field_id),
        ] {
            assert_eq!(db.delete_item(kind, row).unwrap(), ItemRemoval::InUse(1));
        }

        let exp = db.get_experience(id).unwrap().unwrap();
        assert_eq!(exp.channel_message_id, Some(555));
        assert!(db.get_course(exp.course_id).unwrap().is_some());
    }

    #[test]
    fn schema_refuses_deleting_referenced_rows() {
        let db = Database::open_in_memory().unwrap();
        let id = crate::experiences::tests::sample(&db, 10);
        let exp = db.get_experience(id).unwrap().unwrap();

        let err = db
            .with_conn(|conn| {
                conn.execute("DELETE FROM professors WHERE id = ?1", [exp.professor_id])?;
                Ok(())
            })
            .unwrap_err();
        assert!(is_constraint_violation(&err));
        assert!(db.get_experience(id).unwrap().is_some());
    }

    #[test]
    fn deleting_missing_item_reports_false() {
        let (db, ..) = seeded();
        assert_eq!(db.delete_item(RegistryKind::Professor, 999).unwrap(), ItemRemoval::NotFound);
    }

    #[test]
    fn major_requires_existing_field() {
        let db = Database::open_in_memory().unwrap();
        let err = db.add_major(42, "Orphan").unwrap_err();
        assert!(is_constraint_violation(&err));
    }

    #[test]
    fn professor_names_are_unique() {
        let db = Database::open_in_memory().unwrap();
        let (id, created) = db.get_or_create_professor("Dr. Smith").unwrap();
        assert!(created);
        let (again, created_again) = db.get_or_create_professor("Dr. Smith").unwrap();
        assert_eq!(id, again);
        assert!(!created_again);
        assert!(is_constraint_violation(&db.add_professor("Dr. Smith").unwrap_err()));
    }

    #[test]
    fn pages_are_ordered_by_name() {
        let db = Database::open_in_memory().unwrap();
        for name in ["Zoe", "Adam", "Mina", "Bahar", "Omid"] {
            db.add_professor(name).unwrap();
        }

        let first = db.page_items(RegistryKind::Professor, 1, 2).unwrap();
        assert_eq!(first.total_pages, 3);
        let names: Vec<_> = first.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Adam", "Bahar"]);

        let last = db.page_items(RegistryKind::Professor, 3, 2).unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].name, "Zoe");

        let beyond = db.page_items(RegistryKind::Professor, 4, 2).unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_pages, 3);
    }

    #[test]
    fn rename_updates_name() {
        let (db, field, ..) = seeded();
        assert!(db.rename_item(RegistryKind::Field, field, "Eng.").unwrap());
        assert_eq!(db.get_item(RegistryKind::Field, field).unwrap().unwrap().name, "Eng.");
    }
}

//! SQLite-backed schedule store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::store::{ScheduleError, ScheduleStore};
use super::types::ScheduleEntry;
use crate::item::{configure_shared_connection, ScheduledSlot};

const ANCHOR_KEY: &str = "anchor_date";

/// SQLite-backed schedule store.
pub struct SqliteScheduleStore {
    conn: Mutex<Connection>,
}

impl SqliteScheduleStore {
    /// Open (or create) the schedule tables in a database file.
    pub fn new(path: &Path) -> Result<Self, ScheduleError> {
        let conn = Connection::open(path).map_err(storage)?;
        configure_shared_connection(&conn).map_err(storage)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory schedule store (useful for testing).
    pub fn in_memory() -> Result<Self, ScheduleError> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ScheduleError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schedule_entries (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id TEXT NOT NULL UNIQUE,
                day INTEGER NOT NULL,
                time_slot TEXT NOT NULL,
                delivered INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE (day, time_slot)
            );

            CREATE INDEX IF NOT EXISTS idx_schedule_undelivered
                ON schedule_entries(delivered, day);

            CREATE TABLE IF NOT EXISTS schedule_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ScheduleError> {
        self.conn
            .lock()
            .map_err(|_| ScheduleError::Storage("connection lock poisoned".to_string()))
    }

    fn query_entries(&self, sql: &str) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(storage)?;
        let rows = stmt.query_map([], row_to_entry).map_err(storage)?;

        let mut entries = Vec::new();
        for row_result in rows {
            entries.push(row_result.map_err(storage)?);
        }
        Ok(entries)
    }
}

const ENTRY_COLUMNS: &str = "item_id, day, time_slot, delivered, created_at";

impl ScheduleStore for SqliteScheduleStore {
    fn append(&self, item_id: &str, slot: ScheduledSlot) -> Result<ScheduleEntry, ScheduleError> {
        let entry = ScheduleEntry {
            item_id: item_id.to_string(),
            day: slot.day,
            time_slot: slot.time_slot,
            delivered: false,
            created_at: Utc::now(),
        };

        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO schedule_entries (item_id, day, time_slot, delivered, created_at) VALUES (?, ?, ?, 0, ?)",
            params![
                entry.item_id,
                entry.day,
                entry.time_slot.as_str(),
                entry.created_at.to_rfc3339()
            ],
        );

        match inserted {
            Ok(_) => Ok(entry),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                // Both uniqueness rules share one error code; tell them apart.
                let owned: bool = conn
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM schedule_entries WHERE item_id = ?)",
                        params![item_id],
                        |row| row.get(0),
                    )
                    .map_err(storage)?;
                if owned {
                    Err(ScheduleError::AlreadyScheduled(item_id.to_string()))
                } else {
                    Err(ScheduleError::SlotTaken {
                        day: slot.day,
                        time_slot: slot.time_slot,
                    })
                }
            }
            Err(e) => Err(storage(e)),
        }
    }

    fn get_for_item(&self, item_id: &str) -> Result<Option<ScheduleEntry>, ScheduleError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM schedule_entries WHERE item_id = ?", ENTRY_COLUMNS),
            params![item_id],
            row_to_entry,
        )
        .optional()
        .map_err(storage)
    }

    fn list_all(&self) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        self.query_entries(&format!(
            "SELECT {} FROM schedule_entries ORDER BY day ASC, seq ASC",
            ENTRY_COLUMNS
        ))
    }

    fn list_undelivered(&self) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        self.query_entries(&format!(
            "SELECT {} FROM schedule_entries WHERE delivered = 0 ORDER BY day ASC, seq ASC",
            ENTRY_COLUMNS
        ))
    }

    fn mark_delivered(&self, item_id: &str) -> Result<(), ScheduleError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE schedule_entries SET delivered = 1 WHERE item_id = ?",
                params![item_id],
            )
            .map_err(storage)?;

        if changed == 0 {
            return Err(ScheduleError::NotFound(item_id.to_string()));
        }
        Ok(())
    }

    fn anchor(&self) -> Result<Option<NaiveDate>, ScheduleError> {
        let conn = self.conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM schedule_meta WHERE key = ?",
                params![ANCHOR_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage)?;

        value.map(|v| parse_anchor(&v)).transpose()
    }

    fn ensure_anchor(&self, candidate: NaiveDate) -> Result<NaiveDate, ScheduleError> {
        {
            let conn = self.conn()?;
            conn.execute(
                "INSERT OR IGNORE INTO schedule_meta (key, value) VALUES (?, ?)",
                params![ANCHOR_KEY, candidate.format("%Y-%m-%d").to_string()],
            )
            .map_err(storage)?;
        }

        self.anchor()?
            .ok_or_else(|| ScheduleError::Storage("anchor date missing after insert".to_string()))
    }
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<ScheduleEntry> {
    let time_slot: String = row.get(2)?;
    let created_at: String = row.get(4)?;

    Ok(ScheduleEntry {
        item_id: row.get(0)?,
        day: row.get(1)?,
        time_slot: time_slot.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
        })?,
        delivered: row.get::<_, i64>(3)? != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
            })?,
    })
}

fn parse_anchor(value: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ScheduleError::Storage(format!("invalid anchor date '{}': {}", value, e)))
}

fn storage(e: rusqlite::Error) -> ScheduleError {
    ScheduleError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::TimeSlot;

    fn slot(day: u32, time_slot: TimeSlot) -> ScheduledSlot {
        ScheduledSlot { day, time_slot }
    }

    #[test]
    fn test_append_and_get() {
        let store = SqliteScheduleStore::in_memory().unwrap();
        let entry = store.append("a", slot(1, TimeSlot::UsMorning)).unwrap();
        assert!(!entry.delivered);

        let fetched = store.get_for_item("a").unwrap().unwrap();
        assert_eq!(fetched, entry);
        assert!(store.get_for_item("b").unwrap().is_none());
    }

    #[test]
    fn test_one_entry_per_item() {
        let store = SqliteScheduleStore::in_memory().unwrap();
        store.append("a", slot(1, TimeSlot::UsMorning)).unwrap();

        let result = store.append("a", slot(1, TimeSlot::UsLunch));
        assert!(matches!(result, Err(ScheduleError::AlreadyScheduled(id)) if id == "a"));
    }

    #[test]
    fn test_one_entry_per_position() {
        let store = SqliteScheduleStore::in_memory().unwrap();
        store.append("a", slot(1, TimeSlot::UsMorning)).unwrap();

        let result = store.append("b", slot(1, TimeSlot::UsMorning));
        assert!(matches!(
            result,
            Err(ScheduleError::SlotTaken {
                day: 1,
                time_slot: TimeSlot::UsMorning
            })
        ));
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_mark_delivered() {
        let store = SqliteScheduleStore::in_memory().unwrap();
        store.append("a", slot(1, TimeSlot::UsMorning)).unwrap();
        store.append("b", slot(1, TimeSlot::IndiaEvening)).unwrap();

        store.mark_delivered("a").unwrap();

        let undelivered = store.list_undelivered().unwrap();
        assert_eq!(undelivered.len(), 1);
        assert_eq!(undelivered[0].item_id, "b");
        assert!(store.get_for_item("a").unwrap().unwrap().delivered);

        assert!(matches!(
            store.mark_delivered("missing"),
            Err(ScheduleError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_orders_by_day() {
        let store = SqliteScheduleStore::in_memory().unwrap();
        store.append("late", slot(3, TimeSlot::UsMorning)).unwrap();
        store.append("early", slot(1, TimeSlot::UsLunch)).unwrap();

        let ids: Vec<String> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|e| e.item_id)
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn test_anchor_is_fixed_once() {
        let store = SqliteScheduleStore::in_memory().unwrap();
        assert!(store.anchor().unwrap().is_none());

        let first = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 11, 5).unwrap();

        assert_eq!(store.ensure_anchor(first).unwrap(), first);
        assert_eq!(store.ensure_anchor(later).unwrap(), first);
        assert_eq!(store.anchor().unwrap(), Some(first));
    }

    #[test]
    fn test_entries_survive_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("schedule.db");

        let written = {
            let store = SqliteScheduleStore::new(&db_path).unwrap();
            store.append("a", slot(1, TimeSlot::UsMorning)).unwrap();
            store.append("b", slot(2, TimeSlot::IndiaMorning)).unwrap();
            store.mark_delivered("a").unwrap();
            store.list_all().unwrap()
        };

        let reopened = SqliteScheduleStore::new(&db_path).unwrap();
        assert_eq!(reopened.list_all().unwrap(), written);
    }
}

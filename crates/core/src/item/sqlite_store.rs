//! SQLite-backed item store implementation.
//!
//! Each row holds the full item as a JSON record plus a `version` counter.
//! Updates are compare-and-swap on that counter, so several processes can
//! share one database file without losing writes.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use tracing::{debug, warn};

use super::lifecycle;
use super::locks::IdLocks;
use super::store::{ItemError, ItemFilter, ItemSnapshot, ItemStore, Mutation};
use super::types::{ContentItem, NewItem};
use crate::metrics;

/// Attempts at winning the version race before giving up.
const MAX_UPDATE_ATTEMPTS: u32 = 32;

/// SQLite-backed item store.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
    locks: IdLocks,
}

impl SqliteItemStore {
    /// Open (or create) the item store in a database file.
    pub fn new(path: &Path) -> Result<Self, ItemError> {
        let conn = Connection::open(path).map_err(storage)?;
        configure_shared_connection(&conn).map_err(storage)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            locks: IdLocks::new(),
        })
    }

    /// Create an in-memory item store (useful for testing).
    pub fn in_memory() -> Result<Self, ItemError> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            locks: IdLocks::new(),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ItemError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                state TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 1,
                record TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_state ON items(state);
            "#,
        )
        .map_err(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ItemError> {
        self.conn
            .lock()
            .map_err(|_| ItemError::Storage("connection lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &ItemFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(state) = filter.state {
            conditions.push("state = ?");
            params.push(Box::new(state.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn read_versioned(&self, id: &str) -> Result<(ContentItem, i64), ItemError> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT record, version FROM items WHERE id = ?",
            params![id],
            |row| Ok((row_to_item(row)?, row.get::<_, i64>(1)?)),
        );

        match result {
            Ok(found) => Ok(found),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(ItemError::NotFound(id.to_string())),
            Err(e) => Err(storage(e)),
        }
    }

    fn query_items(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<ContentItem>, ItemError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(storage)?;
        let rows = stmt.query_map(params, row_to_item).map_err(storage)?;

        let mut items = Vec::new();
        for row_result in rows {
            items.push(row_result.map_err(storage)?);
        }
        Ok(items)
    }
}

impl ItemStore for SqliteItemStore {
    fn append(&self, request: NewItem) -> Result<ContentItem, ItemError> {
        if request.content.trim().is_empty() {
            return Err(ItemError::InvalidItem("content cannot be empty".to_string()));
        }

        let id = match request.id {
            Some(id) if id.trim().is_empty() => {
                return Err(ItemError::InvalidItem("id cannot be blank".to_string()));
            }
            Some(id) => id,
            None => uuid::Uuid::new_v4().to_string(),
        };

        let now = Utc::now();
        let mut item = ContentItem::new(id, request.content, request.category, request.kind, now);
        item.hashtags = request.hashtags;

        let record =
            serde_json::to_string(&item).map_err(|e| ItemError::Storage(e.to_string()))?;

        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO items (id, state, version, record, updated_at) VALUES (?, ?, 1, ?, ?)",
            params![item.id, item.state.as_str(), record, now.to_rfc3339()],
        );

        match inserted {
            Ok(_) => {
                metrics::ITEMS_CREATED.inc();
                debug!("Appended item {} ({})", item.id, item.kind);
                Ok(item)
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(ItemError::DuplicateIdentity(item.id))
            }
            Err(e) => Err(storage(e)),
        }
    }

    fn get(&self, id: &str) -> Result<ContentItem, ItemError> {
        self.read_versioned(id).map(|(item, _)| item)
    }

    fn list_all(&self) -> Result<ItemSnapshot, ItemError> {
        // A single statement reads from one database snapshot.
        let items = self.query_items("SELECT record FROM items ORDER BY seq ASC", &[])?;
        Ok(ItemSnapshot::new(items))
    }

    fn list(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, ItemError> {
        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!(
            "SELECT record FROM items {} ORDER BY seq ASC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));
        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        self.query_items(&sql, param_refs.as_slice())
    }

    fn count(&self, filter: &ItemFilter) -> Result<i64, ItemError> {
        let conn = self.conn()?;
        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM items {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(storage)
    }

    fn update_atomic(&self, id: &str, mutate: Mutation<'_>) -> Result<ContentItem, ItemError> {
        let _guard = self.locks.acquire(id)?;

        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let (current, version) = self.read_versioned(id)?;

            let conflict = |source| ItemError::Conflict {
                item_id: id.to_string(),
                source,
            };
            let next = mutate(&current).map_err(conflict)?;
            lifecycle::check_change(&current, &next).map_err(conflict)?;

            if next == current {
                return Ok(current);
            }

            let record =
                serde_json::to_string(&next).map_err(|e| ItemError::Storage(e.to_string()))?;
            let changed = {
                let conn = self.conn()?;
                conn.execute(
                    "UPDATE items SET state = ?, version = version + 1, record = ?, updated_at = ? WHERE id = ? AND version = ?",
                    params![
                        next.state.as_str(),
                        record,
                        Utc::now().to_rfc3339(),
                        id,
                        version
                    ],
                )
                .map_err(storage)?
            };

            if changed == 1 {
                if current.state != next.state {
                    metrics::ITEM_TRANSITIONS
                        .with_label_values(&[current.state.as_str(), next.state.as_str()])
                        .inc();
                }
                return Ok(next);
            }

            metrics::UPDATE_RETRIES.inc();
            debug!(
                "Item {} changed underneath update (attempt {}), re-reading",
                id, attempt
            );
        }

        warn!(
            "Giving up on item {} after {} concurrent modifications",
            id, MAX_UPDATE_ATTEMPTS
        );
        Err(ItemError::Contention(id.to_string()))
    }
}

/// Settings for a database file shared between processes.
pub(crate) fn configure_shared_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA synchronous = FULL;")?;
    Ok(())
}

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<ContentItem> {
    let record: String = row.get(0)?;
    serde_json::from_str(&record).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn storage(e: rusqlite::Error) -> ItemError {
    ItemError::Storage(e.to_string())
}

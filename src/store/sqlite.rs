//! SQLite store implementation
//!
//! This module provides a SQLite-backed implementation of the `ItemStore`
//! and `LogSink` traits, plus the log queries that live outside the core's
//! consumed interface (pagination, counts, cleanup, the auth-error metric).

use crate::state::{IndexStatus, SubmissionSource};
use crate::store::schema::initialize_schema;
use crate::store::traits::{ItemStore, LogSink, NewLogEntry, StoreError, StoreResult};
use crate::store::{ItemRecord, LogRecord};
use crate::RelayError;
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite store backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(RelayError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, RelayError> {
        let conn = Connection::open(path).map_err(StoreError::Sqlite)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(StoreError::Sqlite)?;

        // Initialize schema
        initialize_schema(&conn).map_err(StoreError::Sqlite)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for tests and throwaway runs)
    pub fn new_in_memory() -> Result<Self, RelayError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Sqlite)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StoreError::Sqlite)?;
        initialize_schema(&conn).map_err(StoreError::Sqlite)?;
        Ok(Self { conn })
    }

    // ===== Item Management =====

    /// Registers a URL for tracking, or returns the existing item's ID
    ///
    /// # Arguments
    ///
    /// * `url` - The canonical URL of the item
    /// * `item_type` - The item type (used by the scan allow-list)
    /// * `published_at` - When the item was published
    ///
    /// # Returns
    ///
    /// The item ID (either newly created or existing)
    pub fn track_item(
        &mut self,
        url: &str,
        item_type: &str,
        published_at: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM items WHERE url = ?1", params![url], |row| {
                row.get(0)
            })
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO items (item_type, url, published_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                item_type,
                url,
                published_at.to_rfc3339(),
                IndexStatus::Unknown.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Gets an item by ID
    pub fn get_item(&self, item_id: i64) -> StoreResult<ItemRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_type, url, published_at, status, last_checked_at, last_submitted_at
             FROM items WHERE id = ?1",
        )?;

        stmt.query_row(params![item_id], row_to_item)
            .optional()?
            .ok_or(StoreError::ItemNotFound(item_id))
    }

    /// Counts all tracked items
    pub fn count_items(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Log Queries =====

    /// Gets log entries, newest first, with pagination and an optional
    /// source filter
    ///
    /// # Arguments
    ///
    /// * `per_page` - Number of entries per page
    /// * `page` - 1-based page number
    /// * `source` - Optional source filter
    pub fn get_logs(
        &self,
        per_page: usize,
        page: usize,
        source: Option<SubmissionSource>,
    ) -> StoreResult<Vec<LogRecord>> {
        let offset = page.saturating_sub(1) * per_page;

        let (sql, params_vec): (&str, Vec<Value>) = match source {
            None => (
                "SELECT id, url, status_code, message, action_type, source, created_at
                 FROM submission_logs ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
                vec![
                    Value::Integer(per_page as i64),
                    Value::Integer(offset as i64),
                ],
            ),
            Some(source) => (
                "SELECT id, url, status_code, message, action_type, source, created_at
                 FROM submission_logs WHERE source = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
                vec![
                    Value::Text(source.to_db_string().to_string()),
                    Value::Integer(per_page as i64),
                    Value::Integer(offset as i64),
                ],
            ),
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params_vec), row_to_log)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Counts log entries, optionally filtered by source
    pub fn count_logs(&self, source: Option<SubmissionSource>) -> StoreResult<u64> {
        let count: i64 = match source {
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM submission_logs", [], |row| row.get(0))?,
            Some(source) => self.conn.query_row(
                "SELECT COUNT(*) FROM submission_logs WHERE source = ?1",
                params![source.to_db_string()],
                |row| row.get(0),
            )?,
        };
        Ok(count as u64)
    }

    /// Deletes all log entries
    pub fn clear_logs(&mut self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM submission_logs", [])?;
        Ok(())
    }

    /// Deletes log entries older than the given number of days
    ///
    /// # Returns
    ///
    /// The number of entries deleted
    pub fn cleanup_old_logs(&mut self, days: u32) -> StoreResult<usize> {
        let cutoff = (Utc::now() - Duration::days(i64::from(days))).to_rfc3339();
        let deleted = self.conn.execute(
            "DELETE FROM submission_logs WHERE created_at < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }

    /// Counts authorization-style failures logged in the past 24 hours
    ///
    /// Covers entries with status code 0 as well as remote rejections whose
    /// body mentions 403 or PERMISSION_DENIED. Used by callers to warn when
    /// a credential has lost access.
    pub fn recent_auth_error_count(&self) -> StoreResult<u64> {
        let cutoff = (Utc::now() - Duration::hours(24)).to_rfc3339();
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM submission_logs
             WHERE (status_code = 0 OR message LIKE '%403%' OR message LIKE '%PERMISSION_DENIED%')
             AND created_at >= ?1",
            params![cutoff],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl ItemStore for SqliteStore {
    fn find_never_checked(&self, types: &[String], limit: usize) -> StoreResult<Vec<ItemRecord>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = placeholders(types.len());
        let sql = format!(
            "SELECT id, item_type, url, published_at, status, last_checked_at, last_submitted_at
             FROM items
             WHERE last_checked_at IS NULL AND item_type IN ({})
             ORDER BY published_at DESC, id DESC
             LIMIT ?",
            placeholders
        );

        let mut params_vec: Vec<Value> = types
            .iter()
            .map(|t| Value::Text(t.clone()))
            .collect();
        params_vec.push(Value::Integer(limit as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params_vec), row_to_item)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn find_oldest_checked(&self, types: &[String], limit: usize) -> StoreResult<Vec<ItemRecord>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = placeholders(types.len());
        let sql = format!(
            "SELECT id, item_type, url, published_at, status, last_checked_at, last_submitted_at
             FROM items
             WHERE last_checked_at IS NOT NULL AND item_type IN ({})
             ORDER BY last_checked_at ASC, id ASC
             LIMIT ?",
            placeholders
        );

        let mut params_vec: Vec<Value> = types
            .iter()
            .map(|t| Value::Text(t.clone()))
            .collect();
        params_vec.push(Value::Integer(limit as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params_vec), row_to_item)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn canonical_url(&self, item_id: i64) -> StoreResult<Option<String>> {
        let url: Option<String> = self
            .conn
            .query_row(
                "SELECT url FROM items WHERE id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(url.filter(|u| !u.is_empty()))
    }

    fn resolve_item_id(&self, url: &str) -> StoreResult<Option<i64>> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT id FROM items WHERE url = ?1", params![url], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(id)
    }

    fn set_status(&mut self, item_id: i64, status: IndexStatus) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE items SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), item_id],
        )?;
        Ok(())
    }

    fn set_last_checked(&mut self, item_id: i64, ts: DateTime<Utc>) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE items SET last_checked_at = ?1 WHERE id = ?2",
            params![ts.to_rfc3339(), item_id],
        )?;
        Ok(())
    }

    fn set_last_submitted(&mut self, item_id: i64, ts: DateTime<Utc>) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE items SET last_submitted_at = ?1 WHERE id = ?2",
            params![ts.to_rfc3339(), item_id],
        )?;
        Ok(())
    }
}

impl LogSink for SqliteStore {
    fn append(&mut self, entry: &NewLogEntry<'_>) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO submission_logs (url, status_code, message, action_type, source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.url,
                entry.status_code,
                entry.message,
                entry.action.as_wire_str(),
                entry.source.to_db_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

/// Builds a `?, ?, ...` placeholder list of the given length
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<ItemRecord> {
    let status_str: String = row.get(4)?;
    Ok(ItemRecord {
        id: row.get(0)?,
        item_type: row.get(1)?,
        url: row.get(2)?,
        published_at: row.get(3)?,
        status: IndexStatus::from_db_string(&status_str).unwrap_or(IndexStatus::Unknown),
        last_checked_at: row.get(5)?,
        last_submitted_at: row.get(6)?,
    })
}

fn row_to_log(row: &Row<'_>) -> rusqlite::Result<LogRecord> {
    Ok(LogRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        status_code: row.get(2)?,
        message: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        action_type: row.get(4)?,
        source: row.get(5)?,
        created_at: row.get(6)?,
    })
}

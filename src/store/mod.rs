//! Store module for tracked items and the submission log
//!
//! This module defines the collaborator interfaces the indexing core talks
//! to (the item store owning the tracked URLs, and the append-only
//! submission log) together with a SQLite-backed reference implementation:
//! - SQLite database initialization and schema management
//! - Item status and timestamp persistence
//! - Submission log appends, queries, and cleanup

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    ItemStore, LogSink, NewLogEntry, SharedItemStore, SharedLogSink, StoreError, StoreResult,
};

use crate::state::IndexStatus;
use crate::RelayError;

use std::path::Path;

/// Initializes or opens a store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized store
/// * `Err(RelayError)` - Failed to initialize the store
pub fn open_store(path: &Path) -> Result<SqliteStore, RelayError> {
    SqliteStore::new(path)
}

/// Represents a tracked item in the store
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub id: i64,
    pub item_type: String,
    pub url: String,
    pub published_at: String,
    pub status: IndexStatus,
    pub last_checked_at: Option<String>,
    pub last_submitted_at: Option<String>,
}

/// Represents one entry of the submission log
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub id: i64,
    pub url: String,
    pub status_code: u16,
    pub message: String,
    pub action_type: String,
    pub source: String,
    pub created_at: String,
}

//! Store traits and error types
//!
//! This module defines the interfaces the indexing core consumes. In a
//! deployment where a content-management system owns the items, these traits
//! are the seam: the core never touches item lifecycle, it only reads URLs
//! and writes back indexing state.

use crate::state::{ActionType, IndexStatus, SubmissionSource};
use crate::store::ItemRecord;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Item not found: {0}")]
    ItemNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Shared handle to an item store
pub type SharedItemStore = Arc<Mutex<dyn ItemStore + Send>>;

/// Shared handle to a log sink
pub type SharedLogSink = Arc<Mutex<dyn LogSink + Send>>;

/// Trait for the externally-owned item store
///
/// Items are created and destroyed by their owner; the indexing core only
/// selects batches, resolves URLs, and writes back status and timestamps.
pub trait ItemStore {
    // ===== Batch Selection =====

    /// Finds items of the given types that have never been checked,
    /// newest-published first
    ///
    /// # Arguments
    ///
    /// * `types` - Item type allow-list
    /// * `limit` - Maximum number of items to return
    fn find_never_checked(&self, types: &[String], limit: usize) -> StoreResult<Vec<ItemRecord>>;

    /// Finds items of the given types that have been checked before,
    /// oldest-checked first
    fn find_oldest_checked(&self, types: &[String], limit: usize) -> StoreResult<Vec<ItemRecord>>;

    // ===== URL Resolution =====

    /// Returns the canonical URL of an item, if it has one
    fn canonical_url(&self, item_id: i64) -> StoreResult<Option<String>>;

    /// Resolves an item ID from a canonical URL
    fn resolve_item_id(&self, url: &str) -> StoreResult<Option<i64>>;

    // ===== Write-back =====

    /// Sets the indexing status of an item
    fn set_status(&mut self, item_id: i64, status: IndexStatus) -> StoreResult<()>;

    /// Sets the last-checked timestamp of an item
    fn set_last_checked(&mut self, item_id: i64, ts: DateTime<Utc>) -> StoreResult<()>;

    /// Sets the last-submitted timestamp of an item
    fn set_last_submitted(&mut self, item_id: i64, ts: DateTime<Utc>) -> StoreResult<()>;
}

/// A submission log entry about to be appended
#[derive(Debug, Clone)]
pub struct NewLogEntry<'a> {
    /// The URL the operation targeted
    pub url: &'a str,

    /// HTTP status code of the remote response; 0 for configuration,
    /// credential, and transport failures that never got a response
    pub status_code: u16,

    /// Human-readable message or response body
    pub message: &'a str,

    /// Action type of the submission
    pub action: ActionType,

    /// How the submission was triggered
    pub source: SubmissionSource,
}

/// Trait for the append-only submission log
///
/// The core appends and never reads back for decision-making; queries over
/// the log live on the concrete store.
pub trait LogSink {
    /// Appends one entry to the submission log
    fn append(&mut self, entry: &NewLogEntry<'_>) -> StoreResult<()>;
}

//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Index-Relay
//! database.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Tracked items and their indexing state
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_type TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    published_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'unknown',
    last_checked_at TEXT,
    last_submitted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_items_type ON items(item_type);
CREATE INDEX IF NOT EXISTS idx_items_url ON items(url);
CREATE INDEX IF NOT EXISTS idx_items_last_checked ON items(last_checked_at);

-- Append-only submission log
CREATE TABLE IF NOT EXISTS submission_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    status_code INTEGER NOT NULL DEFAULT 0,
    message TEXT,
    action_type TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT 'auto',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_logs_url ON submission_logs(url);
CREATE INDEX IF NOT EXISTS idx_logs_created_at ON submission_logs(created_at);
CREATE INDEX IF NOT EXISTS idx_logs_source ON submission_logs(source);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - An open database connection
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

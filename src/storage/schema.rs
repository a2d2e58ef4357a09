//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Sync state
//! database. Every statement is idempotent so opening an existing database is
//! always safe.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every URL any source has ever produced
CREATE TABLE IF NOT EXISTS seen_urls (
    url TEXT PRIMARY KEY,
    domain TEXT NOT NULL,
    first_seen_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_seen_urls_domain ON seen_urls(domain);

-- URLs the downstream service holds; the only idempotency gate
CREATE TABLE IF NOT EXISTS imported_urls (
    url TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    source TEXT,
    imported_at TEXT NOT NULL
);

-- Every import attempt, successful or not
CREATE TABLE IF NOT EXISTS import_attempts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    success INTEGER NOT NULL,
    error_message TEXT,
    attempted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_import_attempts_url ON import_attempts(url);

-- One row per sync cycle
CREATE TABLE IF NOT EXISTS sync_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    discovered INTEGER NOT NULL DEFAULT 0,
    imported INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0,
    failure_reason TEXT
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

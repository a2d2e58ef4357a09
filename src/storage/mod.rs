//! Storage module for persisting sync state
//!
//! This module handles all database operations for the sync engine:
//! - SQLite database initialization and schema management
//! - Seen URL tracking
//! - The imported-URL idempotency gate
//! - Import attempt history
//! - Sync run bookkeeping and statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{StateStore, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A URL some source has produced
#[derive(Debug, Clone)]
pub struct SeenRecord {
    pub url: String,
    pub domain: String,
    pub first_seen_at: String,
    pub last_seen_at: String,
}

/// A URL that exists downstream
#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub url: String,
    pub name: String,
    pub source: Option<String>,
    pub imported_at: String,
}

/// One import attempt
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub id: i64,
    pub url: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub attempted_at: String,
}

/// Represents a sync run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub discovered: u64,
    pub imported: u64,
    pub failed: u64,
    pub failure_reason: Option<String>,
}

/// Aggregate counters over the whole store
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    pub total_imports: u64,
    pub seen_urls: u64,
    pub seen_domains: u64,
    pub attempts: u64,
    pub failed_attempts: u64,
    pub runs: u64,
    pub aborted_runs: u64,
    pub latest_run: Option<RunRecord>,
}

/// Status of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Aborted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_string())
    }
}

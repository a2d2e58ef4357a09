//! Storage traits and error types
//!
//! This module defines the trait interface for the sync state store and
//! associated error types.

use crate::storage::{AttemptRecord, ImportRecord, RunRecord, SeenRecord, SyncStats};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of what was seen, imported and attempted
///
/// Each mutating call is a single statement, so a crash never leaves a
/// half-written record behind. The store has a single owner; mutators take
/// `&mut self`.
pub trait StateStore {
    // ===== Discovery =====

    /// Records that a URL was discovered
    ///
    /// The first sighting sets both timestamps; later sightings only move
    /// `last_seen_at`.
    fn mark_url_seen(&mut self, url: &str, domain: &str) -> StorageResult<()>;

    /// Gets the seen record for a URL
    fn get_seen(&self, url: &str) -> StorageResult<Option<SeenRecord>>;

    // ===== Imports =====

    /// Gets every URL that has been imported
    fn get_imported_urls(&self) -> StorageResult<HashSet<String>>;

    /// Records a successful import
    ///
    /// A URL is recorded at most once; a second call for the same URL is
    /// ignored and the first record wins.
    fn record_import(
        &mut self,
        url: &str,
        name: &str,
        source: Option<&str>,
    ) -> StorageResult<()>;

    /// Gets the import record for a URL
    fn get_import(&self, url: &str) -> StorageResult<Option<ImportRecord>>;

    /// Checks whether a URL has been imported
    fn is_imported(&self, url: &str) -> StorageResult<bool>;

    /// Appends an import attempt
    fn record_attempt(
        &mut self,
        url: &str,
        success: bool,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Gets all attempts for a URL, oldest first
    fn get_attempts(&self, url: &str) -> StorageResult<Vec<AttemptRecord>>;

    // ===== Run Management =====

    /// Opens a new sync run in the `running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn start_sync_run(&mut self) -> StorageResult<i64>;

    /// Finalizes an open sync run
    ///
    /// The run becomes `aborted` when a failure reason is given, otherwise
    /// `completed`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The run was finalized
    /// * `Ok(false)` - The run was already finalized; nothing changed
    /// * `Err(StorageError::RunNotFound)` - No run with this ID exists
    fn complete_sync_run(
        &mut self,
        run_id: i64,
        discovered: usize,
        imported: usize,
        failed: usize,
        failure_reason: Option<&str>,
    ) -> StorageResult<bool>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Gets up to `limit` runs, newest first
    fn get_recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;

    // ===== Statistics =====

    /// Gets aggregate statistics over the whole store
    fn get_stats(&self) -> StorageResult<SyncStats>;
}

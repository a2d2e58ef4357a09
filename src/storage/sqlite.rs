//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the StateStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StateStore, StorageError, StorageResult};
use crate::storage::{
    AttemptRecord, ImportRecord, RunRecord, RunStatus, SeenRecord, SyncStats,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, status, discovered, imported, failed, failure_reason";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    ///
    /// Nothing survives the instance; used by tests and dry runs.
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let value: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(value.max(0) as u64)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let status: String = row.get(3)?;
    let discovered: i64 = row.get(4)?;
    let imported: i64 = row.get(5)?;
    let failed: i64 = row.get(6)?;

    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        status: RunStatus::from_db_string(&status).unwrap_or(RunStatus::Running),
        discovered: discovered.max(0) as u64,
        imported: imported.max(0) as u64,
        failed: failed.max(0) as u64,
        failure_reason: row.get(7)?,
    })
}

impl StateStore for SqliteStorage {
    // ===== Discovery =====

    fn mark_url_seen(&mut self, url: &str, domain: &str) -> StorageResult<()> {
        let now = now();
        self.conn.execute(
            "INSERT INTO seen_urls (url, domain, first_seen_at, last_seen_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(url) DO UPDATE SET last_seen_at = excluded.last_seen_at",
            params![url, domain, now],
        )?;
        Ok(())
    }

    fn get_seen(&self, url: &str) -> StorageResult<Option<SeenRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT url, domain, first_seen_at, last_seen_at FROM seen_urls WHERE url = ?1",
                params![url],
                |row| {
                    Ok(SeenRecord {
                        url: row.get(0)?,
                        domain: row.get(1)?,
                        first_seen_at: row.get(2)?,
                        last_seen_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    // ===== Imports =====

    fn get_imported_urls(&self) -> StorageResult<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM imported_urls")?;
        let urls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(urls)
    }

    fn record_import(
        &mut self,
        url: &str,
        name: &str,
        source: Option<&str>,
    ) -> StorageResult<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO imported_urls (url, name, source, imported_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![url, name, source, now()],
        )?;

        if inserted == 0 {
            tracing::debug!("{} was already recorded as imported", url);
        }

        Ok(())
    }

    fn get_import(&self, url: &str) -> StorageResult<Option<ImportRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT url, name, source, imported_at FROM imported_urls WHERE url = ?1",
                params![url],
                |row| {
                    Ok(ImportRecord {
                        url: row.get(0)?,
                        name: row.get(1)?,
                        source: row.get(2)?,
                        imported_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn is_imported(&self, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM imported_urls WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn record_attempt(
        &mut self,
        url: &str,
        success: bool,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO import_attempts (url, success, error_message, attempted_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![url, success, error_message, now()],
        )?;
        Ok(())
    }

    fn get_attempts(&self, url: &str) -> StorageResult<Vec<AttemptRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, success, error_message, attempted_at
             FROM import_attempts WHERE url = ?1 ORDER BY id",
        )?;

        let attempts = stmt
            .query_map(params![url], |row| {
                Ok(AttemptRecord {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    success: row.get(2)?,
                    error_message: row.get(3)?,
                    attempted_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(attempts)
    }

    // ===== Run Management =====

    fn start_sync_run(&mut self) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO sync_runs (started_at, status) VALUES (?1, ?2)",
            params![now(), RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_sync_run(
        &mut self,
        run_id: i64,
        discovered: usize,
        imported: usize,
        failed: usize,
        failure_reason: Option<&str>,
    ) -> StorageResult<bool> {
        let status = if failure_reason.is_some() {
            RunStatus::Aborted
        } else {
            RunStatus::Completed
        };

        let updated = self.conn.execute(
            "UPDATE sync_runs
             SET finished_at = ?1, status = ?2, discovered = ?3, imported = ?4,
                 failed = ?5, failure_reason = ?6
             WHERE id = ?7 AND finished_at IS NULL",
            params![
                now(),
                status.to_db_string(),
                discovered as i64,
                imported as i64,
                failed as i64,
                failure_reason,
                run_id
            ],
        )?;

        if updated > 0 {
            return Ok(true);
        }

        // distinguish "already finalized" from "never existed"
        let existing = self.get_run(run_id)?;
        tracing::warn!(
            "Sync run {} was already finalized as {}, ignoring",
            run_id,
            existing.status
        );
        Ok(false)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM sync_runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!(
            "SELECT {} FROM sync_runs ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        );
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    fn get_recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let sql = format!(
            "SELECT {} FROM sync_runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    // ===== Statistics =====

    fn get_stats(&self) -> StorageResult<SyncStats> {
        Ok(SyncStats {
            total_imports: self.count("SELECT COUNT(*) FROM imported_urls")?,
            seen_urls: self.count("SELECT COUNT(*) FROM seen_urls")?,
            seen_domains: self.count("SELECT COUNT(DISTINCT domain) FROM seen_urls")?,
            attempts: self.count("SELECT COUNT(*) FROM import_attempts")?,
            failed_attempts: self.count("SELECT COUNT(*) FROM import_attempts WHERE success = 0")?,
            runs: self.count("SELECT COUNT(*) FROM sync_runs")?,
            aborted_runs: self.count("SELECT COUNT(*) FROM sync_runs WHERE status = 'aborted'")?,
            latest_run: self.get_latest_run()?,
        })
    }
}

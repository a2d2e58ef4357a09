//! Statistics report from the state database
//!
//! This module provides functionality for extracting and displaying
//! sync statistics from the storage layer.

use crate::storage::{RunRecord, StateStore, SyncStats};
use crate::SyncError;
use std::fmt;

/// Store-wide counters plus the most recent runs
#[derive(Debug, Clone)]
pub struct SyncStatistics {
    pub totals: SyncStats,

    /// Newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `recent` - How many recent runs to include
///
/// # Returns
///
/// * `Ok(SyncStatistics)` - Successfully loaded statistics
/// * `Err(SyncError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn StateStore, recent: usize) -> Result<SyncStatistics, SyncError> {
    Ok(SyncStatistics {
        totals: storage.get_stats()?,
        recent_runs: storage.get_recent_runs(recent)?,
    })
}

/// Duration of a finished run in whole seconds
fn run_duration_seconds(run: &RunRecord) -> Option<i64> {
    let started = run.started_at.parse::<chrono::DateTime<chrono::Utc>>().ok()?;
    let finished = run
        .finished_at
        .as_deref()?
        .parse::<chrono::DateTime<chrono::Utc>>()
        .ok()?;
    Some((finished - started).num_seconds())
}

impl fmt::Display for SyncStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let totals = &self.totals;

        writeln!(f, "=== Sync Statistics ===\n")?;

        writeln!(f, "Overview:")?;
        writeln!(f, "  Total imported: {}", totals.total_imports)?;
        writeln!(f, "  URLs seen: {}", totals.seen_urls)?;
        writeln!(f, "  Domains seen: {}", totals.seen_domains)?;
        writeln!(f)?;

        let success_rate = if totals.attempts > 0 {
            ((totals.attempts - totals.failed_attempts) as f64 / totals.attempts as f64) * 100.0
        } else {
            0.0
        };
        writeln!(f, "Import Attempts:")?;
        writeln!(f, "  Total: {}", totals.attempts)?;
        writeln!(f, "  Failed: {}", totals.failed_attempts)?;
        writeln!(f, "  Success rate: {:.1}%", success_rate)?;
        writeln!(f)?;

        writeln!(f, "Runs:")?;
        writeln!(f, "  Total: {}", totals.runs)?;
        writeln!(f, "  Aborted: {}", totals.aborted_runs)?;

        if self.recent_runs.is_empty() {
            return Ok(());
        }

        writeln!(f, "\nRecent Runs:")?;
        for run in &self.recent_runs {
            let duration = run_duration_seconds(run)
                .map(|secs| format!("{}s", secs))
                .unwrap_or_else(|| "-".to_string());
            write!(
                f,
                "  #{} {} [{}] discovered={} imported={} failed={} duration={}",
                run.id,
                run.started_at,
                run.status,
                run.discovered,
                run.imported,
                run.failed,
                duration
            )?;
            if let Some(reason) = &run.failure_reason {
                write!(f, " reason=\"{}\"", reason)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Renders statistics as a plain-text report
pub fn format_statistics(stats: &SyncStatistics) -> String {
    stats.to_string()
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &SyncStatistics) {
    print!("{}", stats);
}

//! Sync coordinator - one discovery/import cycle and the interval loop
//!
//! A cycle:
//! - opens a run record and checks the downstream is reachable
//! - asks every enabled source for URLs, marking each one seen
//! - dedupes, drops already-imported URLs and applies the per-run cap
//! - imports the survivors in order and records every outcome
//! - finalizes the run record exactly once

use crate::client::ImportClient;
use crate::config::{compute_config_hash, load_config, Config, SourceConfig, SyncConfig};
use crate::crawler::Crawler;
use crate::sources::{self, DiscoveredUrl};
use crate::storage::{open_storage, RunStatus, SqliteStorage, StateStore, StorageResult};
use crate::sync::select::{dedupe_preserving_order, select_candidates};
use crate::SyncError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Summary of one sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub run_id: i64,
    pub status: RunStatus,
    /// URLs produced by all sources, before deduplication
    pub discovered: usize,
    pub imported: usize,
    pub failed: usize,
    /// Why the run was aborted
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
struct RunCounts {
    discovered: usize,
    imported: usize,
    failed: usize,
}

/// Drives sync cycles against one state store
pub struct Coordinator {
    settings: SyncConfig,
    sources: Vec<SourceConfig>,
    storage: SqliteStorage,
    crawler: Crawler,
    client: ImportClient,
    config_path: Option<PathBuf>,
}

impl Coordinator {
    /// Creates a coordinator from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The loaded configuration
    /// * `api_token` - Downstream bearer credential
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Storage opened and clients built
    /// * `Err(SyncError)` - Failed to initialize
    pub fn new(config: &Config, api_token: &str) -> Result<Self, SyncError> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        let crawler = Crawler::new(&config.crawler, &config.user_agent)?;
        let client = ImportClient::new(&config.downstream, api_token, config.sync.dry_run)?;

        tracing::info!("Sync coordinator initialized");
        tracing::info!("  Downstream URL: {}", config.downstream.base_url);
        tracing::info!("  Max new per run: {}", config.sync.max_new_per_run);
        tracing::info!("  Rate limit: {}s per domain", config.crawler.rate_limit_seconds);
        tracing::info!("  Dry run: {}", config.sync.dry_run);

        Ok(Self::with_parts(
            config.sync.clone(),
            config.sources.clone(),
            storage,
            crawler,
            client,
        ))
    }

    /// Assembles a coordinator from already-built parts
    pub fn with_parts(
        settings: SyncConfig,
        sources: Vec<SourceConfig>,
        storage: SqliteStorage,
        crawler: Crawler,
        client: ImportClient,
    ) -> Self {
        Self {
            settings,
            sources,
            storage,
            crawler,
            client,
            config_path: None,
        }
    }

    /// Reload the source list from this file before every later cycle
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// The state store this coordinator writes to
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// The currently active source list
    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    fn is_dry_run(&self) -> bool {
        self.settings.dry_run || self.client.is_dry_run()
    }

    /// Runs one sync cycle
    ///
    /// The run record is always finalized: failures inside the cycle abort
    /// the run with the error as reason and zero counts. Only a failure to
    /// open or finalize the run record itself is returned as an error.
    pub async fn run_once(&mut self) -> Result<SyncReport, SyncError> {
        tracing::info!("Starting sync run");
        let run_id = self.storage.start_sync_run()?;

        let report = match self.execute().await {
            Ok(counts) => {
                self.storage.complete_sync_run(
                    run_id,
                    counts.discovered,
                    counts.imported,
                    counts.failed,
                    None,
                )?;
                SyncReport {
                    run_id,
                    status: RunStatus::Completed,
                    discovered: counts.discovered,
                    imported: counts.imported,
                    failed: counts.failed,
                    reason: None,
                }
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!("Sync run {} aborted: {}", run_id, reason);
                self.storage
                    .complete_sync_run(run_id, 0, 0, 0, Some(&reason))?;
                SyncReport {
                    run_id,
                    status: RunStatus::Aborted,
                    discovered: 0,
                    imported: 0,
                    failed: 0,
                    reason: Some(reason),
                }
            }
        };

        self.log_report(&report);
        Ok(report)
    }

    async fn execute(&mut self) -> Result<RunCounts, SyncError> {
        self.client
            .test_connection()
            .await
            .map_err(|e| SyncError::ConnectionFailed(e.to_string()))?;

        tracing::info!("Discovering URLs from sources...");
        let discovered = self.discover_all().await;
        let total = discovered.len();
        tracing::info!("Total URLs discovered: {}", total);

        let unique = dedupe_preserving_order(discovered);
        tracing::info!("Unique URLs after deduplication: {}", unique.len());

        let imported = self.storage.get_imported_urls()?;
        let cap = self.settings.max_new_per_run;
        let candidates = select_candidates(unique, &imported, cap);

        if candidates.is_empty() {
            tracing::info!("No new URLs to import");
            return Ok(RunCounts {
                discovered: total,
                ..RunCounts::default()
            });
        }

        tracing::info!("Importing {} URL(s) (limit: {})", candidates.len(), cap);

        if self.is_dry_run() {
            tracing::info!("[DRY RUN] Would import the following URLs:");
            for (i, candidate) in candidates.iter().enumerate() {
                tracing::info!("  {}. {}", i + 1, candidate.url);
            }
            return Ok(RunCounts {
                discovered: total,
                ..RunCounts::default()
            });
        }

        let (imported, failed) = self.import_all(&candidates).await?;

        Ok(RunCounts {
            discovered: total,
            imported,
            failed,
        })
    }

    /// Collects URLs from every enabled source, in configuration order
    ///
    /// A source whose URLs cannot be recorded as seen contributes nothing;
    /// the remaining sources still run.
    async fn discover_all(&mut self) -> Vec<DiscoveredUrl> {
        let mut all = Vec::new();

        for source in self.sources.iter().filter(|s| s.enabled) {
            let found = sources::discover(source, &self.crawler).await;

            if let Err(e) = mark_all_seen(&mut self.storage, &found) {
                tracing::error!("{}: failed to record discovered URLs: {}", source.name, e);
                continue;
            }

            all.extend(found);
        }

        all
    }

    /// Imports candidates in order, pausing between calls
    async fn import_all(
        &mut self,
        candidates: &[DiscoveredUrl],
    ) -> Result<(usize, usize), SyncError> {
        let delay = Duration::from_millis(self.settings.import_delay_ms);
        let mut imported = 0;
        let mut failed = 0;

        for (i, candidate) in candidates.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let url = candidate.url.as_str();
            tracing::info!("[{}/{}] Processing: {}", i + 1, candidates.len(), url);

            match self.client.import_from_url(url).await {
                Ok(item) if item.dry_run => {
                    tracing::debug!("Not recording simulated import of {}", url);
                }
                Ok(item) => {
                    self.storage
                        .record_import(url, &item.name, Some(&candidate.source))?;
                    self.storage.record_attempt(url, true, None)?;
                    imported += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to import {}: {}", url, e);
                    self.storage
                        .record_attempt(url, false, Some(&e.to_string()))?;
                    failed += 1;
                }
            }
        }

        Ok((imported, failed))
    }

    fn log_report(&self, report: &SyncReport) {
        tracing::info!("Sync run {} {}", report.run_id, report.status);
        tracing::info!("  Discovered: {} URLs", report.discovered);
        tracing::info!("  Imported: {}", report.imported);
        tracing::info!("  Failed: {}", report.failed);

        match self.storage.get_stats() {
            Ok(stats) => tracing::info!("  Total imported to date: {}", stats.total_imports),
            Err(e) => tracing::warn!("Failed to read statistics: {}", e),
        }
    }

    /// Replaces the source list with the one currently on disk
    ///
    /// On any error the previous list stays active.
    pub fn reload_sources(&mut self) {
        let Some(path) = self.config_path.as_deref() else {
            return;
        };

        match load_config(path) {
            Ok(config) => {
                let hash = compute_config_hash(path).unwrap_or_default();
                tracing::info!(
                    "Reloaded {} source(s) from {} (hash {})",
                    config.sources.len(),
                    path.display(),
                    hash
                );
                self.sources = config.sources;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to reload {}, keeping previous sources: {}",
                    path.display(),
                    e
                );
            }
        }
    }

    /// Runs cycles until `shutdown` resolves
    ///
    /// `shutdown` is only observed while sleeping between cycles; a cycle in
    /// progress always runs to completion. A failed cycle never ends the
    /// loop.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let interval = Duration::from_secs(self.settings.interval_minutes.saturating_mul(60));
        tokio::pin!(shutdown);

        let mut first = true;
        loop {
            if !first {
                self.reload_sources();
            }
            first = false;

            if let Err(e) = self.run_once().await {
                tracing::error!("Unhandled error during sync: {}", e);
            }

            tracing::info!("Next sync in {} minutes", self.settings.interval_minutes);

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping sync loop");
                    break;
                }
            }
        }
    }

    /// Runs cycles until Ctrl-C
    pub async fn run_forever(&mut self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

/// Records every URL of one source as seen, stopping at the first failure
fn mark_all_seen(storage: &mut dyn StateStore, urls: &[DiscoveredUrl]) -> StorageResult<()> {
    for url in urls {
        storage.mark_url_seen(&url.url, &url.domain)?;
    }
    Ok(())
}

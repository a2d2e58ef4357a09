//! Sumi-Sync main entry point
//!
//! This is the command-line interface for the Sumi-Sync discovery and import
//! engine.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_sync::client::ImportClient;
use sumi_sync::config::{load_config_with_hash, Config};
use sumi_sync::output::{load_statistics, print_statistics};
use sumi_sync::storage::open_storage;
use sumi_sync::sync::Coordinator;
use tracing_subscriber::EnvFilter;

/// Number of runs listed by `--stats`
const RECENT_RUNS: usize = 10;

/// Sumi-Sync: polite discovery and idempotent import
///
/// Sumi-Sync discovers content URLs from feeds, crawled index pages and
/// static lists, and imports each new one into a downstream
/// content-management API exactly once.
#[derive(Parser, Debug)]
#[command(name = "sumi-sync")]
#[command(version)]
#[command(about = "Polite discovery and idempotent import of content URLs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "SUMI_SYNC_JSON_LOGS")]
    json_logs: bool,

    /// Run a single sync cycle and exit
    #[arg(long)]
    once: bool,

    /// Discover and report, but never import
    #[arg(long, env = "SUMI_SYNC_DRY_RUN")]
    dry_run: bool,

    /// Downstream API token (overrides the config file)
    #[arg(long, env = "SUMI_SYNC_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["search", "once"])]
    stats: bool,

    /// Search the downstream collection and exit
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["stats", "once"])]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.json_logs);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        config.sync.dry_run = true;
    }

    if cli.stats {
        return handle_stats(&config);
    }

    let api_token = resolve_api_token(cli.api_token.as_deref(), &config)?;

    if let Some(query) = cli.search.as_deref() {
        return handle_search(&config, &api_token, query).await;
    }

    handle_sync(&config, &api_token, &cli.config, cli.once).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, json: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_sync=info,warn"),
            1 => EnvFilter::new("sumi_sync=debug,info"),
            2 => EnvFilter::new("sumi_sync=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Picks the API token from the command line/environment or the config file
fn resolve_api_token(cli_token: Option<&str>, config: &Config) -> anyhow::Result<String> {
    let token = cli_token
        .or(config.downstream.api_token.as_deref())
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match token {
        Some(token) => Ok(token.to_string()),
        None => {
            tracing::error!("An API token is required (--api-token, SUMI_SYNC_API_TOKEN or [downstream] api-token)");
            bail!("missing downstream API token")
        }
    }
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("opening {}", config.output.database_path))?;

    let stats = load_statistics(&storage, RECENT_RUNS)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --search mode: queries the downstream collection
async fn handle_search(config: &Config, api_token: &str, query: &str) -> anyhow::Result<()> {
    let client = ImportClient::new(&config.downstream, api_token, config.sync.dry_run)?;
    let items = client
        .search(query)
        .await
        .with_context(|| format!("searching for '{}'", query))?;

    println!("{} result(s) for '{}'", items.len(), query);
    for item in &items {
        let name = item
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("(unnamed)");
        match item.get("slug").and_then(|v| v.as_str()) {
            Some(slug) => println!("  - {} ({})", name, slug),
            None => println!("  - {}", name),
        }
    }

    Ok(())
}

/// Handles the main sync operation
async fn handle_sync(
    config: &Config,
    api_token: &str,
    config_path: &Path,
    once: bool,
) -> anyhow::Result<()> {
    tracing::info!(
        "Sumi-Sync starting with {} source(s), interval {} minutes",
        config.sources.len(),
        config.sync.interval_minutes
    );

    let mut coordinator = Coordinator::new(config, api_token)?.with_config_path(config_path);

    if once {
        let report = coordinator.run_once().await?;
        if let Some(reason) = report.reason {
            tracing::error!("Sync run {} aborted: {}", report.run_id, reason);
        }
        return Ok(());
    }

    coordinator.run_forever().await;
    Ok(())
}

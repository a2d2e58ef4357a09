//! Sumi-Sync: a polite discovery and synchronization engine
//!
//! This crate discovers content URLs from feeds, crawled index pages and
//! static lists, filters them against a persistent SQLite history, and
//! imports new ones into a downstream content-management API exactly once.

pub mod client;
pub mod config;
pub mod crawler;
pub mod output;
pub mod sources;
pub mod storage;
pub mod sync;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Import error: {0}")]
    Import(#[from] client::ImportError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Downstream connection failed: {0}")]
    ConnectionFailed(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Sumi-Sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use sources::DiscoveredUrl;
pub use sync::{Coordinator, SyncReport};
pub use url::{extract_domain, matches_domain, normalize};

//! Configuration module for Sumi-Sync
//!
//! This module handles loading, parsing, and validating the TOML file that
//! describes the downstream API, crawler politeness and the discovery sources.
//!
//! # Example
//!
//! ```no_run
//! use sumi_sync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sources.toml")).unwrap();
//! println!("Importing at most {} URLs per run", config.sync.max_new_per_run);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DownstreamConfig, OutputConfig, SourceConfig, SourceKind, SyncConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, parse_source_entry,
};

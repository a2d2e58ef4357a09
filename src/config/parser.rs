use crate::config::types::{
    Config, CrawlerConfig, DownstreamConfig, OutputConfig, SourceConfig, SourceKind, SyncConfig,
    UserAgentConfig,
};
use crate::config::validation::validate;
use crate::ConfigResult;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// On-disk layout; sources stay raw so one bad entry cannot sink the file
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    sync: SyncConfig,
    downstream: DownstreamConfig,
    #[serde(default)]
    crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    user_agent: UserAgentConfig,
    output: OutputConfig,
    #[serde(default)]
    sources: Vec<toml::Value>,
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_sync::config::load_config;
///
/// let config = load_config(Path::new("sources.toml")).unwrap();
/// println!("Sources: {}", config.sources.len());
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
///
/// Source entries that cannot be understood (unknown `type`, missing or
/// mistyped fields) are skipped with a warning. Everything else that is
/// wrong is a hard error.
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let file: ConfigFile = toml::from_str(content)?;

    let sources = file
        .sources
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| parse_source_entry(index, entry))
        .collect();

    let config = Config {
        sync: file.sync,
        downstream: file.downstream,
        crawler: file.crawler,
        user_agent: file.user_agent,
        output: file.output,
        sources,
    };

    validate(&config)?;

    Ok(config)
}

/// Maps one raw `[[sources]]` entry to its typed configuration
///
/// Returns `None` (after logging why) when the entry has to be skipped.
pub fn parse_source_entry(index: usize, entry: toml::Value) -> Option<SourceConfig> {
    let name = entry
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("source #{}", index + 1));

    match entry.get("type").and_then(|v| v.as_str()) {
        None => {
            tracing::warn!("{}: missing 'type' field, skipping source", name);
            return None;
        }
        Some(tag) if !SourceKind::TYPE_TAGS.contains(&tag) => {
            tracing::warn!("{}: Unknown source type: {}, skipping source", name, tag);
            return None;
        }
        Some(_) => {}
    }

    match entry.try_into::<SourceConfig>() {
        Ok(source) => Some(source),
        Err(e) => {
            tracing::warn!("{}: invalid source definition, skipping: {}", name, e);
            None
        }
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup and on reload so operators can tell which revision of
/// the source list a run used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

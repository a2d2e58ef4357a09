use crate::config::types::{
    Config, CrawlerConfig, DownstreamConfig, OutputConfig, SourceConfig, SourceKind, SyncConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_sync_config(&config.sync)?;
    validate_downstream_config(&config.downstream)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sources(&config.sources)?;
    Ok(())
}

fn validate_sync_config(config: &SyncConfig) -> Result<(), ConfigError> {
    if config.max_new_per_run < 1 {
        return Err(ConfigError::Validation(format!(
            "max-new-per-run must be >= 1, got {}",
            config.max_new_per_run
        )));
    }

    if config.interval_minutes < 1 {
        return Err(ConfigError::Validation(format!(
            "interval-minutes must be >= 1, got {}",
            config.interval_minutes
        )));
    }

    Ok(())
}

fn validate_downstream_config(config: &DownstreamConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;

    for (key, path) in [
        ("health-path", &config.health_path),
        ("import-path", &config.import_path),
        ("search-path", &config.search_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "{} must start with '/', got '{}'",
                key, path
            )));
        }
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "downstream timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.rate_limit_seconds.is_finite() || config.rate_limit_seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "rate-limit-seconds must be a non-negative number, got {}",
            config.rate_limit_seconds
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "crawler timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates every source and the set of source names
fn validate_sources(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for source in sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Source name cannot be empty".to_string(),
            ));
        }

        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate source name '{}'",
                source.name
            )));
        }

        validate_source(source)?;
    }

    Ok(())
}

fn validate_source(source: &SourceConfig) -> Result<(), ConfigError> {
    for pattern in &source.allow_domains {
        validate_domain_pattern(pattern)?;
    }

    if source.kind.may_crawl() && source.allow_domains.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Source '{}' ({}) crawls pages and requires allow-domains",
            source.name,
            source.kind.type_tag()
        )));
    }

    match &source.kind {
        SourceKind::Rss {
            rss_url,
            max_entries,
        } => {
            validate_http_url(&source.name, rss_url)?;
            validate_positive(&source.name, "max-entries", *max_entries)?;
        }
        SourceKind::RssSuffix {
            index_url,
            rss_suffix,
            max_entries,
        } => {
            validate_http_url(&source.name, index_url)?;
            if rss_suffix.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Source '{}': rss-suffix cannot be empty",
                    source.name
                )));
            }
            validate_positive(&source.name, "max-entries", *max_entries)?;
        }
        SourceKind::CrawlIndex {
            index_url,
            max_pages,
        } => {
            validate_http_url(&source.name, index_url)?;
            validate_positive(&source.name, "max-pages", *max_pages)?;
        }
        SourceKind::RssOrCrawl {
            rss_url_candidates,
            crawl_fallback_url,
            max_entries,
            max_pages,
        } => {
            if rss_url_candidates.is_empty() && crawl_fallback_url.is_none() {
                return Err(ConfigError::Validation(format!(
                    "Source '{}' needs rss-url-candidates or a crawl-fallback-url",
                    source.name
                )));
            }
            for candidate in rss_url_candidates {
                validate_http_url(&source.name, candidate)?;
            }
            if let Some(fallback) = crawl_fallback_url {
                validate_http_url(&source.name, fallback)?;
            }
            validate_positive(&source.name, "max-entries", *max_entries)?;
            validate_positive(&source.name, "max-pages", *max_pages)?;
        }
        SourceKind::UrlList { urls } => {
            for url in urls {
                validate_http_url(&source.name, url)?;
            }
        }
    }

    Ok(())
}

fn validate_positive(source: &str, key: &str, value: usize) -> Result<(), ConfigError> {
    if value < 1 {
        return Err(ConfigError::Validation(format!(
            "Source '{}': {} must be >= 1",
            source, key
        )));
    }
    Ok(())
}

/// Requires an absolute http(s) URL
fn validate_http_url(context: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: '{}': {}", context, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{}: '{}' must use http or https",
            context, value
        )));
    }

    Ok(())
}

/// Validates an allow-list pattern ("example.com", ".example.com", "*.example.com")
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern
        .strip_prefix("*.")
        .or_else(|| pattern.strip_prefix('.'))
        .unwrap_or(pattern);

    validate_domain_string(domain)
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

//! HTTP fetcher used by all discovery sources
//!
//! This module handles:
//! - Building the HTTP client with the crawler's identification string
//! - Per-domain politeness through the [`RateLimiter`]
//! - Classifying failures into [`FetchError`]

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::rate_limiter::RateLimiter;
use crate::url::extract_domain;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors returned when fetching a page or feed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use sumi_sync::config::UserAgentConfig;
/// use sumi_sync::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.user_agent_string())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Polite HTTP fetcher shared by all sources during a run
#[derive(Debug)]
pub struct Crawler {
    client: Client,
    rate_limiter: RateLimiter,
}

impl Crawler {
    /// Creates a crawler from configuration
    pub fn new(crawler: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, Duration::from_secs(crawler.timeout_secs))?;
        Ok(Self::with_client(
            client,
            RateLimiter::from_secs_f64(crawler.rate_limit_seconds),
        ))
    }

    /// Creates a crawler from an existing client and rate limiter
    pub fn with_client(client: Client, rate_limiter: RateLimiter) -> Self {
        Self {
            client,
            rate_limiter,
        }
    }

    /// The rate limiter guarding this crawler's requests
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Fetches a URL and returns its body as text
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }

    /// Fetches a URL and returns its raw body
    ///
    /// Feeds are fetched this way so the parser can sniff the encoding.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| FetchError::from_reqwest(url, e))
    }

    /// Sends a rate-limited GET and rejects non-success statuses
    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let domain = extract_domain(url).ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;

        self.rate_limiter.acquire(&domain).await;
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

//! Downstream content-management API client

use crate::client::retry::{send_with_retry, RetryPolicy};
use crate::config::DownstreamConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Display name recorded when the downstream reports a duplicate
pub const EXISTING_ITEM_NAME: &str = "Existing item";

/// Display name recorded when a success response carries no name
pub const UNKNOWN_ITEM_NAME: &str = "Unknown";

/// Why an import (or another downstream call) failed
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid or unsupported source format (HTTP {status})")]
    InvalidSource { status: u16 },

    #[error("Unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Rate limited by downstream")]
    RateLimited,

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl ImportError {
    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ImportError::Timeout
        } else {
            ImportError::Network(error.to_string())
        }
    }

    /// Maps a non-success, non-conflict status
    fn from_status(status: StatusCode) -> Self {
        let code = status.as_u16();
        match status {
            StatusCode::TOO_MANY_REQUESTS => ImportError::RateLimited,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ImportError::Unauthorized { status: code }
            }
            s if s.is_client_error() => ImportError::InvalidSource { status: code },
            _ => ImportError::Http { status: code },
        }
    }
}

/// Outcome of a successful import call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedItem {
    /// Display name reported by the downstream
    pub name: String,

    /// The URL that was submitted
    pub url: String,

    /// The downstream already held this URL (HTTP 409)
    pub already_exists: bool,

    /// Synthetic result; nothing was sent
    pub dry_run: bool,
}

/// Client for the downstream import API
#[derive(Debug, Clone)]
pub struct ImportClient {
    client: Client,
    base_url: String,
    health_path: String,
    import_path: String,
    search_path: String,
    policy: RetryPolicy,
    dry_run: bool,
}

impl ImportClient {
    /// Creates a client for the configured downstream
    ///
    /// # Arguments
    ///
    /// * `config` - Downstream settings
    /// * `api_token` - Bearer credential sent with every request
    /// * `dry_run` - Never send imports; report synthetic results instead
    pub fn new(
        config: &DownstreamConfig,
        api_token: &str,
        dry_run: bool,
    ) -> Result<Self, ImportError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_token))
            .map_err(|e| ImportError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(concat!("sumi-sync/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        // the downstream answers duplicate creates with 409, so retrying a
        // create is harmless
        let policy = RetryPolicy::from_config(config).with_method(Method::POST);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_path: config.health_path.clone(),
            import_path: config.import_path.clone(),
            search_path: config.search_path.clone(),
            policy,
            dry_run,
        })
    }

    /// Whether imports are simulated
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// The retry policy applied to every request
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Verifies the downstream is reachable and accepts the credential
    pub async fn test_connection(&self) -> Result<(), ImportError> {
        let url = self.endpoint(&self.health_path);
        let request = self
            .client
            .get(&url)
            .build()
            .map_err(ImportError::from_transport)?;

        let response = send_with_retry(&self.client, &self.policy, request)
            .await
            .map_err(|e| {
                let error = ImportError::from_transport(e);
                tracing::error!("Failed to connect to downstream at {}: {}", self.base_url, error);
                error
            })?;

        let status = response.status();
        if !status.is_success() {
            let error = ImportError::from_status(status);
            tracing::error!("Downstream health check at {} failed: {}", url, error);
            return Err(error);
        }

        tracing::info!("Connected to downstream API at {}", self.base_url);
        Ok(())
    }

    /// Asks the downstream to import the content behind `url`
    ///
    /// A 409 response counts as success with `already_exists` set. In dry-run
    /// mode no request is made.
    pub async fn import_from_url(&self, url: &str) -> Result<ImportedItem, ImportError> {
        if self.dry_run {
            tracing::info!("[DRY RUN] Would import from: {}", url);
            return Ok(ImportedItem {
                name: "Dry run item".to_string(),
                url: url.to_string(),
                already_exists: false,
                dry_run: true,
            });
        }

        tracing::info!("Importing from: {}", url);

        let request = self
            .client
            .post(self.endpoint(&self.import_path))
            .json(&serde_json::json!({ "url": url }))
            .build()
            .map_err(ImportError::from_transport)?;

        let response = send_with_retry(&self.client, &self.policy, request)
            .await
            .map_err(|e| {
                let error = ImportError::from_transport(e);
                tracing::warn!("Import of {} failed: {}", url, error);
                error
            })?;

        let status = response.status();

        if status == StatusCode::CONFLICT {
            tracing::info!("Already exists downstream: {}", url);
            return Ok(ImportedItem {
                name: EXISTING_ITEM_NAME.to_string(),
                url: url.to_string(),
                already_exists: true,
                dry_run: false,
            });
        }

        if !status.is_success() {
            let error = ImportError::from_status(status);
            tracing::warn!("Import of {} failed: {}", url, error);
            return Err(error);
        }

        let body = response.text().await.map_err(ImportError::from_transport)?;
        let name = display_name(&body);
        tracing::info!("Imported: {}", name);

        Ok(ImportedItem {
            name,
            url: url.to_string(),
            already_exists: false,
            dry_run: false,
        })
    }

    /// Searches the downstream collection
    ///
    /// Returns the `items` array of the response; empty in dry-run mode.
    pub async fn search(&self, query: &str) -> Result<Vec<Value>, ImportError> {
        if self.dry_run {
            tracing::info!("[DRY RUN] Would search for: {}", query);
            return Ok(Vec::new());
        }

        let request = self
            .client
            .get(self.endpoint(&self.search_path))
            .query(&[("search", query)])
            .build()
            .map_err(ImportError::from_transport)?;

        let response = send_with_retry(&self.client, &self.policy, request)
            .await
            .map_err(ImportError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::from_status(status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ImportError::InvalidResponse(e.to_string()))?;

        Ok(body
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

/// Extracts a display name from a create response
///
/// Accepts an object with a `name` field or a bare JSON string (a slug).
fn display_name(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        Ok(Value::String(slug)) if !slug.is_empty() => Some(slug),
        _ => None,
    }
    .unwrap_or_else(|| UNKNOWN_ITEM_NAME.to_string())
}

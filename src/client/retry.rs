//! Bounded retry with exponential backoff for downstream requests
//!
//! Only responses are retried. A request that times out or cannot connect
//! is handed back to the caller immediately.

use crate::config::DownstreamConfig;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Request, Response, StatusCode};
use std::time::Duration;

/// Upper bound on a server-requested `Retry-After` delay
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// When and how often a request is retried
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,

    /// Retry `n` (1-based) waits `backoff_factor * 2^(n-1)`
    pub backoff_factor: Duration,

    /// Response statuses that trigger a retry
    pub retry_statuses: Vec<u16>,

    /// Methods that may be retried
    pub retry_methods: Vec<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: Duration::from_secs(2),
            retry_statuses: vec![429, 500, 502, 503, 504],
            retry_methods: vec![
                Method::GET,
                Method::HEAD,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
                Method::TRACE,
            ],
        }
    }
}

impl RetryPolicy {
    /// Builds the policy described by the downstream configuration
    pub fn from_config(config: &DownstreamConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_factor: Duration::from_millis(config.backoff_factor_ms),
            ..Self::default()
        }
    }

    /// Declares an additional method safe to retry
    pub fn with_method(mut self, method: Method) -> Self {
        if !self.retry_methods.contains(&method) {
            self.retry_methods.push(method);
        }
        self
    }

    /// Checks whether a response warrants another attempt
    ///
    /// `attempt` is the 1-based number of the attempt that produced `status`.
    pub fn should_retry(&self, method: &Method, status: StatusCode, attempt: u32) -> bool {
        attempt < self.max_attempts
            && self.retry_methods.contains(method)
            && self.retry_statuses.contains(&status.as_u16())
    }

    /// Delay before retry number `retry` (1-based)
    ///
    /// ```
    /// use sumi_sync::client::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy { backoff_factor: Duration::from_secs(2), ..Default::default() };
    /// assert_eq!(policy.backoff(1), Duration::from_secs(2));
    /// assert_eq!(policy.backoff(2), Duration::from_secs(4));
    /// assert_eq!(policy.backoff(3), Duration::from_secs(8));
    /// ```
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1u32 << exponent)
    }
}

/// Sends a request, retrying retryable responses under `policy`
///
/// When attempts run out the last response is returned as-is so the caller
/// can interpret its status. Requests whose body cannot be cloned are sent
/// exactly once.
pub async fn send_with_retry(
    client: &Client,
    policy: &RetryPolicy,
    request: Request,
) -> Result<Response, reqwest::Error> {
    let method = request.method().clone();
    let url = request.url().to_string();
    let mut current = request;
    let mut attempt = 1;

    loop {
        let next = if attempt < policy.max_attempts {
            current.try_clone()
        } else {
            None
        };

        let response = client.execute(current).await?;
        let status = response.status();

        let Some(next) = next.filter(|_| policy.should_retry(&method, status, attempt)) else {
            return Ok(response);
        };

        let delay = policy.backoff(attempt).max(retry_after(&response));
        tracing::warn!(
            "{} {} returned {}, retrying in {:?} (attempt {}/{})",
            method,
            url,
            status,
            delay,
            attempt + 1,
            policy.max_attempts
        );
        drop(response);

        tokio::time::sleep(delay).await;
        current = next;
        attempt += 1;
    }
}

/// Reads a `Retry-After` header given in seconds
fn retry_after(response: &Response) -> Duration {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
        .unwrap_or(Duration::ZERO)
}

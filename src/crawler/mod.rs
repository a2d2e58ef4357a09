//! Crawler module for polite page and feed fetching
//!
//! This module contains:
//! - Per-domain rate limiting
//! - HTTP fetching with typed errors
//! - HTML link and pagination extraction
//! - Bounded index-page crawling

mod fetcher;
mod index;
mod parser;
mod rate_limiter;

pub use fetcher::{build_http_client, Crawler, FetchError};
pub use parser::{parse_index_page, IndexPage};
pub use rate_limiter::RateLimiter;

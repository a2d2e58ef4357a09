//! Discovery sources
//!
//! A source turns one `[[sources]]` entry into a list of candidate URLs.
//! Discovery never fails from the caller's point of view: every error is
//! logged and degrades to an empty or partial result.

mod feed;

pub use feed::{fetch_feed_links, parse_feed_links, rss_suffix_url, FeedLinks};

use crate::config::{SourceConfig, SourceKind};
use crate::crawler::{Crawler, FetchError};
use crate::url::{extract_domain, matches_domain, normalize};
use thiserror::Error;

/// Errors raised inside a source while discovering
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("Not a valid feed: {0}")]
    NotAFeed(String),

    #[error("Missing allow-domains for crawling")]
    MissingAllowList,
}

/// A candidate URL together with the source that found it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUrl {
    /// Canonical URL
    pub url: String,

    /// Lowercase host of `url`
    pub domain: String,

    /// Name of the source that yielded the URL
    pub source: String,
}

impl DiscoveredUrl {
    /// Builds a discovered URL; `None` when the URL has no host
    pub fn new(url: impl Into<String>, source: impl Into<String>) -> Option<Self> {
        let url = url.into();
        let domain = extract_domain(&url)?;
        Some(Self {
            url,
            domain,
            source: source.into(),
        })
    }
}

/// Runs a source's discovery strategy
///
/// # Returns
///
/// The discovered URLs in the order the strategy produced them. Failures are
/// logged against the source name and yield an empty list.
pub async fn discover(source: &SourceConfig, crawler: &Crawler) -> Vec<DiscoveredUrl> {
    let urls = match discover_urls(source, crawler).await {
        Ok(urls) => urls,
        Err(e) => {
            tracing::error!("{}: discovery failed: {}", source.name, e);
            Vec::new()
        }
    };

    urls.into_iter()
        .filter_map(|url| {
            let discovered = DiscoveredUrl::new(url.clone(), source.name.clone());
            if discovered.is_none() {
                tracing::debug!("{}: dropping URL without a host: {}", source.name, url);
            }
            discovered
        })
        .collect()
}

async fn discover_urls(
    source: &SourceConfig,
    crawler: &Crawler,
) -> Result<Vec<String>, DiscoveryError> {
    let name = &source.name;
    let allow = source.allow_domains.as_slice();

    match &source.kind {
        SourceKind::Rss {
            rss_url,
            max_entries,
        } => {
            tracing::info!("{}: Fetching RSS feed from {}", name, rss_url);
            let links = fetch_feed_links(crawler, rss_url, *max_entries, allow).await?;
            tracing::info!("{}: Found {} URLs in RSS feed", name, links.urls.len());
            Ok(links.urls)
        }

        SourceKind::RssSuffix {
            index_url,
            rss_suffix,
            max_entries,
        } => {
            let rss_url = rss_suffix_url(index_url, rss_suffix);
            tracing::info!("{}: Fetching RSS from {}", name, rss_url);
            let links = fetch_feed_links(crawler, &rss_url, *max_entries, allow).await?;
            tracing::info!("{}: Found {} URLs via RSS suffix", name, links.urls.len());
            Ok(links.urls)
        }

        SourceKind::CrawlIndex {
            index_url,
            max_pages,
        } => {
            if allow.is_empty() {
                return Err(DiscoveryError::MissingAllowList);
            }
            tracing::info!("{}: Crawling index page {}", name, index_url);
            let urls = crawler.crawl_index_page(index_url, allow, *max_pages).await;
            tracing::info!("{}: Found {} URLs via crawling", name, urls.len());
            Ok(urls)
        }

        SourceKind::RssOrCrawl {
            rss_url_candidates,
            crawl_fallback_url,
            max_entries,
            max_pages,
        } => {
            for rss_url in rss_url_candidates {
                tracing::info!("{}: Trying RSS feed {}", name, rss_url);
                match fetch_feed_links(crawler, rss_url, *max_entries, allow).await {
                    Ok(links) if !links.urls.is_empty() => {
                        tracing::info!("{}: Found {} URLs via RSS", name, links.urls.len());
                        return Ok(links.urls);
                    }
                    Ok(links) => {
                        tracing::warn!(
                            "{}: RSS feed {} has no usable entries ({} total)",
                            name,
                            rss_url,
                            links.entries
                        );
                    }
                    Err(e) => {
                        tracing::warn!("{}: RSS feed {} failed: {}", name, rss_url, e);
                    }
                }
            }

            let Some(fallback) = crawl_fallback_url else {
                tracing::warn!("{}: All methods failed", name);
                return Ok(Vec::new());
            };

            if allow.is_empty() {
                return Err(DiscoveryError::MissingAllowList);
            }

            tracing::info!("{}: Falling back to crawling {}", name, fallback);
            let urls = crawler.crawl_index_page(fallback, allow, *max_pages).await;
            tracing::info!("{}: Found {} URLs via crawl fallback", name, urls.len());
            Ok(urls)
        }

        SourceKind::UrlList { urls } => {
            let mut kept = Vec::with_capacity(urls.len());
            for url in urls {
                if !allow.is_empty() && !matches_domain(url, allow) {
                    tracing::warn!("{}: Skipping URL not in allowed domains: {}", name, url);
                    continue;
                }
                kept.push(normalize(url));
            }
            tracing::info!("{}: Loaded {} URLs from list", name, kept.len());
            Ok(kept)
        }
    }
}

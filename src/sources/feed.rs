use crate::crawler::Crawler;
use crate::sources::DiscoveryError;
use crate::url::{matches_domain, normalize};

/// Links taken from one syndication feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedLinks {
    /// Number of entries the feed contained
    pub entries: usize,

    /// Normalized, allow-listed entry links in feed order
    pub urls: Vec<String>,
}

/// Parses an RSS/Atom document and collects its entry links
///
/// Only the first `max_entries` entries are considered. Each entry
/// contributes its first link; links outside `allow_domains` are dropped
/// before normalization. An empty allow-list accepts every link.
pub fn parse_feed_links<S: AsRef<str>>(
    bytes: &[u8],
    max_entries: usize,
    allow_domains: &[S],
) -> Result<FeedLinks, DiscoveryError> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| DiscoveryError::NotAFeed(e.to_string()))?;

    let entries = feed.entries.len();
    let urls = feed
        .entries
        .into_iter()
        .take(max_entries)
        .filter_map(|entry| entry.links.first().map(|link| link.href.trim().to_string()))
        .filter(|href| !href.is_empty())
        .filter(|href| allow_domains.is_empty() || matches_domain(href, allow_domains))
        .map(|href| normalize(&href))
        .collect();

    Ok(FeedLinks { entries, urls })
}

/// Fetches a feed and collects its entry links
pub async fn fetch_feed_links<S: AsRef<str>>(
    crawler: &Crawler,
    feed_url: &str,
    max_entries: usize,
    allow_domains: &[S],
) -> Result<FeedLinks, DiscoveryError> {
    let bytes = crawler.fetch_bytes(feed_url).await?;
    parse_feed_links(&bytes, max_entries, allow_domains)
}

/// Builds the feed URL of an `rss-suffix` source
///
/// ```
/// use sumi_sync::sources::rss_suffix_url;
///
/// assert_eq!(
///     rss_suffix_url("https://www.theguardian.com/food/", "/rss"),
///     "https://www.theguardian.com/food/rss"
/// );
/// ```
pub fn rss_suffix_url(index_url: &str, suffix: &str) -> String {
    format!("{}{}", index_url.trim_end_matches('/'), suffix)
}

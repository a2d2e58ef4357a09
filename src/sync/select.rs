use crate::sources::DiscoveredUrl;
use std::collections::HashSet;

/// Removes repeated URLs, keeping the first occurrence and its source
pub fn dedupe_preserving_order(discovered: Vec<DiscoveredUrl>) -> Vec<DiscoveredUrl> {
    let mut seen = HashSet::new();
    discovered
        .into_iter()
        .filter(|d| seen.insert(d.url.clone()))
        .collect()
}

/// Picks the URLs to import this run
///
/// Already-imported URLs are dropped, then the list is cut to `cap` entries.
/// Order is preserved throughout.
pub fn select_candidates(
    discovered: Vec<DiscoveredUrl>,
    imported: &HashSet<String>,
    cap: usize,
) -> Vec<DiscoveredUrl> {
    discovered
        .into_iter()
        .filter(|d| !imported.contains(&d.url))
        .take(cap)
        .collect()
}

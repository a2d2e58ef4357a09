use crate::crawler::fetcher::Crawler;
use crate::crawler::parser::parse_index_page;
use crate::url::{matches_domain, normalize};
use std::collections::HashSet;
use url::Url;

impl Crawler {
    /// Crawls an index page and its pagination for in-domain links
    ///
    /// Links are resolved against the page they appear on, filtered through
    /// `allow_domains`, normalized and deduplicated in discovery order. At
    /// most `max_pages` index pages are fetched and none is fetched twice.
    /// Pagination pages are never part of the result, and pagination never
    /// leaves `allow_domains`.
    ///
    /// Failures never propagate: a page that cannot be fetched ends the crawl
    /// and whatever was collected so far is returned.
    ///
    /// # Arguments
    ///
    /// * `index_url` - The first index page
    /// * `allow_domains` - Allow-list entries; must not be empty
    /// * `max_pages` - Upper bound on fetched index pages
    pub async fn crawl_index_page<S: AsRef<str>>(
        &self,
        index_url: &str,
        allow_domains: &[S],
        max_pages: usize,
    ) -> Vec<String> {
        if allow_domains.is_empty() {
            tracing::error!(
                "Refusing to crawl {} without an allow-list of domains",
                index_url
            );
            return Vec::new();
        }

        let mut results = Vec::new();
        let mut seen_links = HashSet::new();
        let mut visited_pages = HashSet::new();
        let mut pagination_pages = HashSet::new();
        let mut next = Some(index_url.to_string());

        while let Some(page_url) = next.take() {
            if visited_pages.len() >= max_pages {
                tracing::debug!("Reached page limit ({}) for {}", max_pages, index_url);
                break;
            }

            if !visited_pages.insert(normalize(&page_url)) {
                tracing::debug!("Pagination loops back to {}, stopping", page_url);
                break;
            }

            let Ok(base_url) = Url::parse(&page_url) else {
                tracing::warn!("Cannot crawl invalid URL {}", page_url);
                break;
            };

            let html = match self.fetch_text(&page_url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Failed to crawl {}: {}", page_url, e);
                    break;
                }
            };

            let page = parse_index_page(&html, &base_url);
            let mut added = 0;

            for link in page.links {
                if !matches_domain(&link, allow_domains) {
                    continue;
                }
                let canonical = normalize(&link);
                if visited_pages.contains(&canonical) {
                    continue;
                }
                if seen_links.insert(canonical.clone()) {
                    results.push(canonical);
                    added += 1;
                }
            }

            tracing::debug!("Found {} new links on {}", added, page_url);
            next = match page.next_page {
                Some(next_page) if matches_domain(&next_page, allow_domains) => {
                    pagination_pages.insert(normalize(&next_page));
                    Some(next_page)
                }
                Some(next_page) => {
                    tracing::debug!(
                        "Not following pagination outside allowed domains: {}",
                        next_page
                    );
                    None
                }
                None => None,
            };
        }

        // a later page may have been linked from an earlier one
        results.retain(|url| !visited_pages.contains(url) && !pagination_pages.contains(url));

        tracing::info!(
            "Crawled {} page(s) from {}, found {} link(s)",
            visited_pages.len(),
            index_url,
            results.len()
        );

        results
    }
}

//! HTML link extraction for index pages
//!
//! Two things are read from an index page: the candidate content links and
//! the pagination link that leads to the next page of the index.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Links and pagination found on one index page
#[derive(Debug, Clone, Default)]
pub struct IndexPage {
    /// Absolute URLs of all followable `<a href>` links, in document order
    pub links: Vec<String>,

    /// Absolute URL of the next index page, if the page advertises one
    pub next_page: Option<String>,
}

/// Parses an index page
///
/// # Link Extraction Rules
///
/// **Include:** every `<a href="...">`, resolved against `base_url`.
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that does not resolve to http(s)
///
/// # Example
///
/// ```
/// use sumi_sync::crawler::parse_index_page;
/// use url::Url;
///
/// let html = r#"<a href="/recipe/1">One</a><a rel="next" href="?page=2">Next</a>"#;
/// let base = Url::parse("https://example.com/recipes").unwrap();
/// let page = parse_index_page(html, &base);
/// assert_eq!(page.links[0], "https://example.com/recipe/1");
/// assert_eq!(page.next_page.as_deref(), Some("https://example.com/recipes?page=2"));
/// ```
pub fn parse_index_page(html: &str, base_url: &Url) -> IndexPage {
    let document = Html::parse_document(html);

    IndexPage {
        links: extract_links(&document, base_url),
        next_page: find_next_page(&document, base_url),
    }
}

/// Extracts all followable anchor links from the document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Finds the pagination link, trying the most explicit markers first
///
/// 1. `<link rel="next">`
/// 2. `<a rel="next">`
/// 3. an `<a>` whose class list contains `next`
fn find_next_page(document: &Html, base_url: &Url) -> Option<String> {
    let candidates = ["link[rel~='next'][href]", "a[rel~='next'][href]"];

    for css in candidates {
        if let Ok(selector) = Selector::parse(css) {
            if let Some(url) = document.select(&selector).find_map(|e| href_of(e, base_url)) {
                return Some(url);
            }
        }
    }

    let selector = Selector::parse("a[class][href]").ok()?;
    document
        .select(&selector)
        .filter(|element| {
            element
                .value()
                .attr("class")
                .map(|class| class.to_lowercase().contains("next"))
                .unwrap_or(false)
        })
        .find_map(|element| href_of(element, base_url))
}

fn href_of(element: ElementRef<'_>, base_url: &Url) -> Option<String> {
    element
        .value()
        .attr("href")
        .and_then(|href| resolve_link(href, base_url))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}

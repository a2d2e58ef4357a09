//! URL handling module for Sumi-Sync
//!
//! This module provides URL normalization, domain extraction and allow-list
//! matching. None of these functions fail: malformed input degrades to an
//! unchanged URL, a missing domain, or a non-match.

mod domain;
mod matcher;
mod normalize;

pub use domain::extract_domain;
pub use matcher::matches_allow_entry;
pub use normalize::normalize;

/// Checks whether a URL's domain is covered by an allow-list
///
/// The URL matches when its domain equals, or is a subdomain of, any entry.
/// URLs without a domain never match.
///
/// # Examples
///
/// ```
/// use sumi_sync::url::matches_domain;
///
/// assert!(matches_domain("https://blog.example.com/x", &["example.com"]));
/// assert!(!matches_domain("https://example.org/x", &["example.com"]));
/// assert!(matches_domain("https://example.com/x", &[".example.com"]));
/// ```
pub fn matches_domain<S: AsRef<str>>(url: &str, allow_list: &[S]) -> bool {
    let Some(domain) = extract_domain(url) else {
        return false;
    };

    allow_list
        .iter()
        .any(|entry| matches_allow_entry(entry.as_ref(), &domain))
}

/// Checks if a domain matches a single allow-list entry
///
/// An entry is a plain domain (`example.com`) or a domain with a wildcard
/// marker (`.example.com` or `*.example.com`). Both forms match:
///    - the bare domain itself ("example.com")
///    - any subdomain ("blog.example.com", "api.v2.example.com")
///
/// Matching happens on label boundaries, so `example.com` never matches
/// `notexample.com`. Comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use sumi_sync::url::matches_allow_entry;
///
/// assert!(matches_allow_entry("example.com", "example.com"));
/// assert!(matches_allow_entry("example.com", "blog.example.com"));
/// assert!(matches_allow_entry(".example.com", "example.com"));
/// assert!(matches_allow_entry("*.example.com", "api.v2.example.com"));
/// assert!(!matches_allow_entry("example.com", "example.org"));
/// ```
pub fn matches_allow_entry(entry: &str, domain: &str) -> bool {
    let entry = entry.trim().to_lowercase();
    let base = entry
        .strip_prefix("*.")
        .or_else(|| entry.strip_prefix('.'))
        .unwrap_or(&entry);

    if base.is_empty() {
        return false;
    }

    let domain = domain.to_lowercase();
    domain == base || domain.ends_with(&format!(".{}", base))
}

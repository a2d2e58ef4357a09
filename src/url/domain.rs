use url::Url;

/// Extracts the domain from a URL
///
/// The host is lowercased and returned verbatim otherwise: `www.` and other
/// subdomain labels are kept, the port is not part of the domain.
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the URL cannot be parsed or has no host
///
/// # Examples
///
/// ```
/// use sumi_sync::url::extract_domain;
///
/// assert_eq!(extract_domain("https://Example.COM/path"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("https://www.example.com/"), Some("www.example.com".to_string()));
/// assert_eq!(extract_domain("not a url"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.to_lowercase())
}

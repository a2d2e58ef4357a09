use url::form_urlencoded;
use url::Url;

/// Query parameters that only carry click/campaign tracking data
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "mc_cid", "mc_eid", "igshid", "yclid", "_ga", "ref",
];

/// Normalizes a URL into its canonical form
///
/// # Normalization Steps
///
/// 1. Parse the URL; if it cannot be parsed, return the input unchanged
/// 2. Lowercase the host
/// 3. Remove the fragment (everything after #)
/// 4. Remove tracking query parameters (`utm_*`, `fbclid`, `gclid`, `ref`, ...)
/// 5. Keep every other query parameter verbatim and in its original order
/// 6. Remove an empty query string (trailing ?)
///
/// Scheme and path are left as the URL parser produced them, so the result
/// is stable: normalizing a normalized URL returns the same string.
///
/// # Examples
///
/// ```
/// use sumi_sync::url::normalize;
///
/// let url = normalize("https://Example.COM/r?utm_source=a&id=1#comments");
/// assert_eq!(url, "https://example.com/r?id=1");
/// ```
pub fn normalize(url_str: &str) -> String {
    let mut url = match Url::parse(url_str) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Leaving unparseable URL untouched ({}): {}", e, url_str);
            return url_str.to_string();
        }
    };

    // Special schemes already come back lowercased from the parser; opaque
    // hosts of other schemes do not.
    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host && url.set_host(Some(&lowered)).is_err() {
            tracing::debug!("Keeping host of {} as written", url_str);
        }
    }

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let kept = strip_tracking_params(query);
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&kept));
        }
    }

    url.to_string()
}

/// Drops tracking pairs from a raw query string, keeping the rest untouched
fn strip_tracking_params(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = form_urlencoded::parse(pair.as_bytes())
                .next()
                .map(|(key, _)| key.into_owned())
                .unwrap_or_default();
            !is_tracking_param(&key)
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

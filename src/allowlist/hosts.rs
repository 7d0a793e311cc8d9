//! Host-key derivation and short/long URL conversion.

use url::Url;

/// `scheme://host[:port]` of a parsed URL, as the URL parser reports it
/// (lowercased host, default port omitted). `None` when the URL has no host.
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Parse `raw` and return it only if it is an absolute URL with a host.
pub fn parse_absolute(raw: &str) -> Option<Url> {
    Url::parse(raw).ok().filter(|u| host_key(u).is_some())
}

/// Store `value` relative to `host_key` when it is on that host.
///
/// The remainder must be empty or start a path, query or fragment, so
/// `https://a.cox/login` is never shortened against `https://a.co`.
pub fn to_short_url(host_key: &str, value: &str) -> String {
    match value.strip_prefix(host_key) {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '?', '#']) => rest.to_string(),
        _ => value.to_string(),
    }
}

/// Inverse of [`to_short_url`]: a stored value that already parses as a URL
/// is returned as-is, anything else is appended to `host_key`.
pub fn to_long_url(host_key: &str, stored: &str) -> String {
    if Url::parse(stored).is_ok() {
        stored.to_string()
    } else {
        format!("{}{}", host_key, stored)
    }
}

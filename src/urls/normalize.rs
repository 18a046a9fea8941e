//! Canonical site identity

use url::Url;

/// Reduce a parsed URL to `scheme://host[:port]`.
///
/// Path, query, fragment and credentials are dropped. The port is kept only
/// when it differs from the scheme default, which the parser already strips.
pub fn normalize(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

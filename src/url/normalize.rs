use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL into the key used for visited-set and page lookups
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only http:// and https://
/// 3. Lowercase the host (the port is kept)
/// 4. Remove the fragment
/// 5. Remove trailing slashes from the path, keeping the root `/`
///
/// The query string is left untouched. The function is idempotent.
///
/// # Examples
///
/// ```
/// use seo_audit::url::normalize_url;
///
/// let url = normalize_url("http://LOCALHOST:3000/about/#team").unwrap();
/// assert_eq!(url.as_str(), "http://localhost:3000/about");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        url.set_path(&trimmed);
    }

    Ok(url)
}

/// Normalizes a URL and returns its string form
pub fn normalize_str(url_str: &str) -> UrlResult<String> {
    normalize_url(url_str).map(String::from)
}

//! Anchor enumeration and link resolution
//!
//! This module handles the link side of crawling:
//! - Enumerating `<a href>` values from rendered HTML
//! - Resolving discovered hrefs against the page URL

use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Enumerates the raw `href` values of all anchors in the document
///
/// Values are trimmed; empty hrefs are skipped. Resolution happens later in
/// [`resolve_link`].
///
/// # Example
///
/// ```
/// use seo_audit::crawler::extract_hrefs;
///
/// let html = r#"<html><body><a href="/page">Link</a><a>No href</a></body></html>"#;
/// assert_eq!(extract_hrefs(html), vec!["/page".to_string()]);
/// ```
pub fn extract_hrefs(html: &str) -> Vec<String> {
    static SELECTOR: OnceLock<Option<Selector>> = OnceLock::new();
    let Some(selector) = SELECTOR.get_or_init(|| Selector::parse("a[href]").ok()) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    document
        .select(selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: and data: schemes
/// - fragment-only links (same page anchors)
/// - invalid URLs
/// - non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match page_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        _ => None,
    }
}

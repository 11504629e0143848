//! Content analyzer
//!
//! Extracts SEO signals from rendered HTML. Parsing is error-tolerant; the
//! only failure is a page URL that cannot be parsed.

mod types;

pub use types::{
    AnalysisResult, ContentStats, HeadingSummary, ImageSummary, LinkInfo, LinkSummary, RobotsMeta,
    TechnicalSignals,
};

use crate::crawler::resolve_link;
use crate::url::same_host;
use crate::AuditError;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use url::Url;

/// Subtrees whose text never counts toward the word count
const SKIPPED_TEXT_TAGS: &[&str] = &["script", "style", "nav", "header", "footer"];

macro_rules! selector {
    ($css:literal) => {{
        static SELECTOR: OnceLock<Option<Selector>> = OnceLock::new();
        SELECTOR.get_or_init(|| Selector::parse($css).ok()).as_ref()
    }};
}

/// Iterates the elements matching a cached selector
fn select<'a>(
    document: &'a Html,
    selector: Option<&'static Selector>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    selector
        .into_iter()
        .flat_map(move |selector| document.select(selector))
}

/// Analyzes one rendered page
///
/// # Arguments
///
/// * `html` - The rendered document
/// * `page_url` - Absolute URL of the page, used to resolve links
///
/// # Returns
///
/// * `Ok(AnalysisResult)` - Extracted signals
/// * `Err(AuditError)` - The page URL could not be parsed
pub fn analyze(html: &str, page_url: &str) -> Result<AnalysisResult, AuditError> {
    let page = Url::parse(page_url)?;
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let description = meta_content(&document, "description").unwrap_or_default();
    let robots = extract_robots_meta(&document);

    let content = ContentStats {
        word_count: count_words(&document),
        title_length: title.chars().count(),
        description_length: description.chars().count(),
    };

    Ok(AnalysisResult {
        url: page.to_string(),
        meta_tags: extract_meta_tags(&document),
        headings: extract_headings(&document),
        links: extract_links(&document, &page),
        images: extract_images(&document),
        technical: extract_technical(&document),
        has_structured_data: has_structured_data(&document),
        language: extract_language(&document),
        title,
        description,
        content,
        robots,
    })
}

fn extract_title(document: &Html) -> String {
    select(document, selector!("title"))
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Content of the first `meta[name]` whose name matches case-insensitively
fn meta_content(document: &Html, name: &str) -> Option<String> {
    select(document, selector!("meta[name]"))
        .find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .map(|el| el.value().attr("content").unwrap_or("").trim().to_string())
}

/// Content of the first `meta[http-equiv]` whose value matches case-insensitively
fn http_equiv(document: &Html, name: &str) -> Option<String> {
    select(document, selector!("meta[http-equiv]"))
        .find(|el| {
            el.value()
                .attr("http-equiv")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .map(|el| el.value().attr("content").unwrap_or("").trim().to_string())
}

fn extract_meta_tags(document: &Html) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();

    for el in select(document, selector!("meta[name], meta[property]")) {
        let content = el.value().attr("content").unwrap_or("").trim();
        for key in [el.value().attr("name"), el.value().attr("property")]
            .into_iter()
            .flatten()
        {
            let key = key.trim();
            if !key.is_empty() {
                tags.entry(key.to_string())
                    .or_insert_with(|| content.to_string());
            }
        }
    }

    tags
}

fn extract_headings(document: &Html) -> HeadingSummary {
    let mut summary = HeadingSummary::default();

    for el in select(document, selector!("h1, h2, h3, h4, h5, h6")) {
        let text = el.text().collect::<String>().trim().to_string();
        match el.value().name() {
            "h1" => {
                summary.h1_count += 1;
                if !text.is_empty() {
                    summary.h1.push(text);
                }
            }
            "h2" => {
                summary.h2_count += 1;
                if !text.is_empty() {
                    summary.h2.push(text);
                }
            }
            "h3" => summary.h3_count += 1,
            "h4" => summary.h4_count += 1,
            "h5" => summary.h5_count += 1,
            "h6" => summary.h6_count += 1,
            _ => {}
        }
    }

    summary
}

/// Counts words of visible body text
fn count_words(document: &Html) -> usize {
    let Some(body) = select(document, selector!("body")).next() else {
        return 0;
    };

    let mut text = String::new();
    collect_visible_text(body, &mut text);
    text.split_whitespace().count()
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !SKIPPED_TEXT_TAGS.contains(&child.value().name()) {
                        collect_visible_text(child, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn extract_links(document: &Html, page: &Url) -> LinkSummary {
    let mut summary = LinkSummary::default();

    for el in select(document, selector!("a[href]")) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Some(target) = resolve_href(href, page) else {
            continue;
        };

        let nofollow = el
            .value()
            .attr("rel")
            .map(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("nofollow"))
            })
            .unwrap_or(false);

        let link = LinkInfo {
            text: el
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
            url: target.to_string(),
            nofollow,
        };

        if same_host(&target, page) {
            summary.internal.push(link);
        } else {
            summary.external.push(link);
        }
    }

    summary
}

/// Resolves an anchor for the link inventory
///
/// Unlike crawl discovery, in-page fragment links are kept; they point at the
/// page itself and count as internal.
fn resolve_href(href: &str, page: &Url) -> Option<Url> {
    let href = href.trim();
    if href.starts_with('#') {
        return page.join(href).ok();
    }
    resolve_link(href, page)
}

fn extract_images(document: &Html) -> ImageSummary {
    let mut summary = ImageSummary::default();

    for el in select(document, selector!("img")) {
        summary.total += 1;
        let has_alt = el
            .value()
            .attr("alt")
            .is_some_and(|alt| !alt.trim().is_empty());
        if has_alt {
            summary.with_alt += 1;
        } else {
            summary.without_alt += 1;
        }
    }

    summary
}

fn extract_technical(document: &Html) -> TechnicalSignals {
    let canonical = select(document, selector!("link[rel][href]"))
        .find(|el| {
            el.value().attr("rel").is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("canonical"))
            })
        })
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty());

    let charset = select(document, selector!("meta[charset]"))
        .next()
        .and_then(|el| el.value().attr("charset"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .or_else(|| http_equiv(document, "content-type").map(|content| charset_of(&content)));

    let has_open_graph = select(document, selector!("meta[property]")).any(|el| {
        el.value()
            .attr("property")
            .is_some_and(|p| p.trim().to_ascii_lowercase().starts_with("og:"))
    });

    let has_twitter_card = select(document, selector!("meta[name]")).any(|el| {
        el.value()
            .attr("name")
            .is_some_and(|n| n.trim().to_ascii_lowercase().starts_with("twitter:"))
    });

    TechnicalSignals {
        canonical,
        has_viewport: meta_content(document, "viewport").is_some(),
        charset,
        has_meta_refresh: http_equiv(document, "refresh").is_some(),
        has_open_graph,
        has_twitter_card,
    }
}

/// Pulls `charset=` out of a Content-Type value, falling back to the whole value
fn charset_of(content_type: &str) -> String {
    content_type
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| content_type.to_string())
}

fn extract_robots_meta(document: &Html) -> RobotsMeta {
    let content = meta_content(document, "robots")
        .unwrap_or_default()
        .to_ascii_lowercase();

    RobotsMeta {
        noindex: content.contains("noindex"),
        nofollow: content.contains("nofollow"),
        nocache: content.contains("nocache") || content.contains("noarchive"),
    }
}

fn has_structured_data(document: &Html) -> bool {
    let json_ld = select(document, selector!("script[type]")).any(|el| {
        el.value()
            .attr("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
    });

    json_ld || select(document, selector!("[itemscope]")).next().is_some()
}

fn extract_language(document: &Html) -> Option<String> {
    select(document, selector!("html[lang]"))
        .next()
        .and_then(|el| el.value().attr("lang"))
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
}

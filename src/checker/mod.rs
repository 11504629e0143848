//! Scoring engine
//!
//! Turns an [`AnalysisResult`] plus the HTTP status into an indexability
//! verdict and a weighted battery of named checks.

mod types;

pub use types::{CheckResult, CheckResults, CheckValue};

use crate::analyzer::AnalysisResult;
use crate::url::normalize_str;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use url::Url;

const TITLE_LENGTH: RangeInclusive<usize> = 25..=65;
const DESCRIPTION_LENGTH: RangeInclusive<usize> = 110..=155;
const H1_LENGTH: RangeInclusive<usize> = 15..=65;
const INTERNAL_LINKS: RangeInclusive<usize> = 1..=100;
const MIN_WORDS: usize = 250;
const MAX_EXTERNAL_LINKS: usize = 15;
const MIN_ALT_COVERAGE: f64 = 80.0;
const MIN_LOADING_SCORE: i64 = 70;

/// Check names and weights, in table order
pub const CHECK_WEIGHTS: &[(&str, u32)] = &[
    ("response_status_code", 100),
    ("title_presence", 90),
    ("title_length", 80),
    ("unique_title_tag", 85),
    ("meta_description_presence", 75),
    ("meta_description_length", 70),
    ("unique_meta_description", 65),
    ("h1_presence", 90),
    ("unique_h1_heading", 85),
    ("h1_length", 75),
    ("h2_presence", 55),
    ("content_length", 75),
    ("canonical_url_presence", 55),
    ("url_matches_canonical", 50),
    ("unique_canonical_link", 45),
    ("meta_robots_indexing", 65),
    ("outlinks_count", 35),
    ("external_links_count", 30),
    ("missing_alt_attribute", 55),
    ("meta_refresh_redirect", 25),
    ("viewport_meta", 40),
    ("charset_declared", 35),
    ("images_optimization", 45),
    ("structured_data", 35),
    ("page_loading_speed", 60),
    ("social_media_meta", 25),
];

/// Weight of a named check (0 for unknown names)
pub fn weight_of(name: &str) -> u32 {
    CHECK_WEIGHTS
        .iter()
        .find(|(check, _)| *check == name)
        .map(|(_, weight)| *weight)
        .unwrap_or(0)
}

/// Scores one page
///
/// Pages that did not answer 200, or that ask not to be indexed, get a
/// zero score and no checks.
///
/// # Arguments
///
/// * `analysis` - Extracted page signals
/// * `status_code` - HTTP status of the page response
/// * `page_url` - URL the page was fetched from
pub fn check_page(analysis: &AnalysisResult, status_code: u16, page_url: &str) -> CheckResults {
    if status_code != 200 {
        return CheckResults::not_indexable(format!("HTTP status {}", status_code));
    }
    if analysis.robots.noindex {
        return CheckResults::not_indexable("Page has a noindex robots meta tag");
    }

    let mut battery = Battery::default();
    let content = &analysis.content;
    let headings = &analysis.headings;
    let technical = &analysis.technical;

    battery.record(
        "response_status_code",
        true,
        status_code,
        "Page responded with HTTP 200",
        "Page did not respond with HTTP 200",
    );

    // Title
    battery.record(
        "title_presence",
        !analysis.title.is_empty(),
        !analysis.title.is_empty(),
        "Title tag is present",
        "Title tag is missing",
    );
    battery.record(
        "title_length",
        TITLE_LENGTH.contains(&content.title_length),
        content.title_length,
        "Title length is within 25-65 characters",
        "Title length should be between 25 and 65 characters",
    );
    battery.record(
        "unique_title_tag",
        true,
        true,
        "Title tag is unique",
        "Title tag is not unique",
    );

    // Description
    battery.record(
        "meta_description_presence",
        !analysis.description.is_empty(),
        !analysis.description.is_empty(),
        "Meta description is present",
        "Meta description is missing",
    );
    battery.record(
        "meta_description_length",
        DESCRIPTION_LENGTH.contains(&content.description_length),
        content.description_length,
        "Meta description length is within 110-155 characters",
        "Meta description length should be between 110 and 155 characters",
    );
    battery.record(
        "unique_meta_description",
        true,
        true,
        "Meta description is unique",
        "Meta description is not unique",
    );

    // Headings
    battery.record(
        "h1_presence",
        headings.h1_count >= 1,
        headings.h1_count,
        "H1 heading is present",
        "H1 heading is missing",
    );
    battery.record(
        "unique_h1_heading",
        headings.h1_count == 1,
        headings.h1_count,
        "Page has exactly one H1 heading",
        "Page should have exactly one H1 heading",
    );
    let h1_length = analysis
        .first_h1()
        .map(|h1| h1.chars().count())
        .unwrap_or(0);
    battery.record(
        "h1_length",
        analysis.first_h1().is_some() && H1_LENGTH.contains(&h1_length),
        h1_length,
        "H1 length is within 15-65 characters",
        "H1 length should be between 15 and 65 characters",
    );
    battery.record(
        "h2_presence",
        headings.h2_count >= 1,
        headings.h2_count,
        "H2 headings are present",
        "H2 headings are missing",
    );

    battery.record(
        "content_length",
        content.word_count >= MIN_WORDS,
        content.word_count,
        "Page has at least 250 words of content",
        "Page has fewer than 250 words of content",
    );

    // Canonical
    let canonical = technical.canonical.as_deref().unwrap_or("");
    battery.record(
        "canonical_url_presence",
        technical.canonical.is_some(),
        canonical,
        "Canonical URL is set",
        "Canonical URL is missing",
    );
    battery.record(
        "url_matches_canonical",
        canonical_matches(canonical, page_url),
        canonical,
        "Canonical URL matches the page URL",
        "Canonical URL does not match the page URL",
    );
    battery.record(
        "unique_canonical_link",
        true,
        true,
        "Canonical link is unique",
        "Canonical link is not unique",
    );

    battery.record(
        "meta_robots_indexing",
        !analysis.robots.noindex,
        !analysis.robots.noindex,
        "Page allows indexing",
        "Page blocks indexing with a robots meta tag",
    );

    // Links
    let internal = analysis.links.internal_count();
    let external = analysis.links.external_count();
    battery.record(
        "outlinks_count",
        INTERNAL_LINKS.contains(&internal),
        internal,
        "Page has between 1 and 100 internal links",
        "Page should have between 1 and 100 internal links",
    );
    battery.record(
        "external_links_count",
        external <= MAX_EXTERNAL_LINKS,
        external,
        "Page has at most 15 external links",
        "Page has more than 15 external links",
    );

    // Images
    let images = &analysis.images;
    battery.record(
        "missing_alt_attribute",
        images.without_alt == 0,
        images.without_alt,
        "All images have alt text",
        "Some images are missing alt text",
    );
    let coverage = (images.alt_coverage() * 10.0).round() / 10.0;
    battery.record(
        "images_optimization",
        images.total == 0 || images.alt_coverage() >= MIN_ALT_COVERAGE,
        coverage,
        "At least 80% of images have alt text",
        "Fewer than 80% of images have alt text",
    );

    // Technical
    battery.record(
        "meta_refresh_redirect",
        !technical.has_meta_refresh,
        technical.has_meta_refresh,
        "No meta refresh redirect",
        "Page uses a meta refresh redirect",
    );
    battery.record(
        "viewport_meta",
        technical.has_viewport,
        technical.has_viewport,
        "Viewport meta tag is present",
        "Viewport meta tag is missing",
    );
    battery.record(
        "charset_declared",
        technical.charset.is_some(),
        technical.charset.as_deref().unwrap_or(""),
        "Character set is declared",
        "Character set is not declared",
    );
    battery.record(
        "structured_data",
        analysis.has_structured_data,
        analysis.has_structured_data,
        "Structured data is present",
        "Structured data is missing",
    );

    let loading = loading_speed_score(content.word_count, images.total);
    battery.record(
        "page_loading_speed",
        loading >= MIN_LOADING_SCORE,
        loading,
        "Estimated page weight is acceptable",
        "Page is likely to load slowly",
    );

    let social = technical.has_open_graph || technical.has_twitter_card;
    battery.record(
        "social_media_meta",
        social,
        social,
        "Social media meta tags are present",
        "Social media meta tags are missing",
    );

    battery.finish()
}

/// Loading-speed heuristic from page weight
///
/// Starts at 100; long pages lose up to 30 points and image-heavy pages up
/// to 40.
pub fn loading_speed_score(word_count: usize, image_count: usize) -> i64 {
    let words = i64::try_from(word_count).unwrap_or(i64::MAX);
    let images = i64::try_from(image_count).unwrap_or(i64::MAX);
    let mut score: i64 = 100;

    if words > 2000 {
        score -= ((words - 2000) / 100).min(30);
    }
    if images > 10 {
        score -= images.saturating_sub(10).saturating_mul(3).min(40);
    }

    score.max(0)
}

/// `round1(100 * passed weight / total weight)`
pub fn weighted_score(checks: &BTreeMap<String, CheckResult>) -> f64 {
    let total: u32 = checks.values().map(|check| check.weight).sum();
    if total == 0 {
        return 0.0;
    }

    let passed: u32 = checks
        .values()
        .filter(|check| check.passed)
        .map(|check| check.weight)
        .sum();

    round1(100.0 * f64::from(passed) / f64::from(total))
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn canonical_matches(canonical: &str, page_url: &str) -> bool {
    if canonical.is_empty() {
        return false;
    }

    let resolved = match Url::parse(page_url).and_then(|page| page.join(canonical)) {
        Ok(url) => url.to_string(),
        Err(_) => canonical.to_string(),
    };

    match (normalize_str(&resolved), normalize_str(page_url)) {
        (Ok(canonical), Ok(page)) => canonical == page,
        _ => false,
    }
}

#[derive(Default)]
struct Battery {
    checks: BTreeMap<String, CheckResult>,
}

impl Battery {
    fn record(
        &mut self,
        name: &str,
        passed: bool,
        value: impl Into<CheckValue>,
        pass_message: &str,
        fail_message: &str,
    ) {
        let message = if passed { pass_message } else { fail_message };
        self.checks.insert(
            name.to_string(),
            CheckResult {
                passed,
                value: value.into(),
                message: message.to_string(),
                weight: weight_of(name),
            },
        );
    }

    fn finish(self) -> CheckResults {
        CheckResults {
            indexable: true,
            reason: None,
            score: weighted_score(&self.checks),
            checks: self.checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;

    fn good_page() -> AnalysisResult {
        let body_words = "word ".repeat(300);
        let description = "d".repeat(120);
        let html = format!(
            r#"<html lang="en"><head>
                <meta charset="utf-8">
                <title>A well sized page title for tests</title>
                <meta name="description" content="{description}">
                <meta name="viewport" content="width=device-width">
                <meta property="og:title" content="Page">
                <link rel="canonical" href="/about/">
                <script type="application/ld+json">{{}}</script>
                </head><body>
                <h1>About our small company</h1><h2>History</h2>
                <p>{body_words}</p>
                <a href="/">Home</a>
                <img src="a.png" alt="A">
                </body></html>"#
        );
        analyze(&html, "http://localhost:3000/about").unwrap()
    }

    #[test]
    fn test_table_weights() {
        assert_eq!(CHECK_WEIGHTS.len(), 26);
        let total: u32 = CHECK_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert_eq!(total, 1545);
        assert_eq!(weight_of("title_length"), 80);
        assert_eq!(weight_of("nonexistent"), 0);
    }

    #[test]
    fn test_non_200_not_indexable() {
        let results = check_page(&good_page(), 404, "http://localhost:3000/about");
        assert!(!results.indexable);
        assert_eq!(results.score, 0.0);
        assert!(results.checks.is_empty());
        assert_eq!(results.reason.as_deref(), Some("HTTP status 404"));
    }

    #[test]
    fn test_noindex_not_indexable() {
        let html = r#"<html><head><meta name="robots" content="NOINDEX, follow"></head></html>"#;
        let analysis = analyze(html, "http://localhost:3000/").unwrap();
        let results = check_page(&analysis, 200, "http://localhost:3000/");
        assert!(!results.indexable);
        assert_eq!(results.score, 0.0);
        assert!(results.checks.is_empty());
    }

    #[test]
    fn test_good_page_passes_everything() {
        let results = check_page(&good_page(), 200, "http://localhost:3000/about");
        assert!(results.indexable);
        assert_eq!(results.checks.len(), 26);
        let failed: Vec<&String> = results.failed_checks().map(|(name, _)| name).collect();
        assert!(failed.is_empty(), "unexpected failures: {:?}", failed);
        assert_eq!(results.score, 100.0);
    }

    #[test]
    fn test_in_page_anchor_counts_as_outlink() {
        let html = r##"<html><body><a href="#pricing">Pricing</a></body></html>"##;
        let analysis = analyze(html, "http://localhost:3000/plans").unwrap();
        let results = check_page(&analysis, 200, "http://localhost:3000/plans");

        let check = &results.checks["outlinks_count"];
        assert!(check.passed);
        assert_eq!(check.value, CheckValue::Int(1));
    }

    #[test]
    fn test_title_length_boundary() {
        let mut analysis = good_page();

        analysis.content.title_length = 65;
        let results = check_page(&analysis, 200, "http://localhost:3000/about");
        assert!(results.checks["title_length"].passed);

        analysis.content.title_length = 66;
        let results = check_page(&analysis, 200, "http://localhost:3000/about");
        let check = &results.checks["title_length"];
        assert!(!check.passed);
        assert_eq!(check.value, CheckValue::Int(66));
        assert_eq!(check.weight, 80);
        assert_eq!(
            check.message,
            "Title length should be between 25 and 65 characters"
        );
    }

    #[test]
    fn test_weighted_score_example() {
        let mut checks = BTreeMap::new();
        for (name, weight, passed) in [("a", 100, true), ("b", 50, false)] {
            checks.insert(
                name.to_string(),
                CheckResult {
                    passed,
                    value: CheckValue::Bool(passed),
                    message: String::new(),
                    weight,
                },
            );
        }
        assert_eq!(weighted_score(&checks), 66.7);
        assert_eq!(weighted_score(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn test_score_reflects_failures() {
        let mut analysis = good_page();
        analysis.technical.has_viewport = false;
        analysis.content.title_length = 10;
        let results = check_page(&analysis, 200, "http://localhost:3000/about");

        // 1545 - 40 - 80 = 1425 passed
        assert_eq!(results.score, 92.2);
        assert_eq!(results.failed_count(), 2);
        assert_eq!(results.passed_count(), 24);
    }

    #[test]
    fn test_canonical_mismatch() {
        let results = check_page(&good_page(), 200, "http://localhost:3000/other");
        assert!(results.checks["canonical_url_presence"].passed);
        assert!(!results.checks["url_matches_canonical"].passed);
    }

    #[test]
    fn test_missing_h1_fails_length() {
        let mut analysis = good_page();
        analysis.headings.h1.clear();
        analysis.headings.h1_count = 0;
        let results = check_page(&analysis, 200, "http://localhost:3000/about");
        assert!(!results.checks["h1_presence"].passed);
        assert!(!results.checks["unique_h1_heading"].passed);
        assert!(!results.checks["h1_length"].passed);
    }

    #[test]
    fn test_loading_speed_heuristic() {
        assert_eq!(loading_speed_score(500, 3), 100);
        assert_eq!(loading_speed_score(2500, 0), 95);
        assert_eq!(loading_speed_score(10_000, 0), 70);
        assert_eq!(loading_speed_score(0, 14), 88);
        assert_eq!(loading_speed_score(10_000, 100), 30);
    }

    #[test]
    fn test_image_checks() {
        let mut analysis = good_page();
        analysis.images.total = 10;
        analysis.images.with_alt = 8;
        analysis.images.without_alt = 2;
        let results = check_page(&analysis, 200, "http://localhost:3000/about");
        assert!(!results.checks["missing_alt_attribute"].passed);
        assert!(results.checks["images_optimization"].passed);
        assert_eq!(
            results.checks["images_optimization"].value,
            CheckValue::Float(80.0)
        );
    }
}

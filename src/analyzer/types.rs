//! Analyzer output types
//!
//! Everything the scoring engine reads about a page, serialized verbatim into
//! the audit document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SEO signals extracted from one rendered page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The page URL the analysis was run against
    pub url: String,

    /// Trimmed text of the first `<title>` (empty when absent)
    pub title: String,

    /// Trimmed `content` of `meta[name=description]` (empty when absent)
    pub description: String,

    /// Every `meta[name]` and `meta[property]` with its content
    pub meta_tags: BTreeMap<String, String>,

    pub headings: HeadingSummary,
    pub content: ContentStats,
    pub links: LinkSummary,
    pub images: ImageSummary,
    pub technical: TechnicalSignals,
    pub robots: RobotsMeta,

    /// JSON-LD script or microdata present
    pub has_structured_data: bool,

    /// Value of `html[lang]`
    pub language: Option<String>,
}

impl AnalysisResult {
    /// Text of the first non-empty H1
    pub fn first_h1(&self) -> Option<&str> {
        self.headings.h1.first().map(String::as_str)
    }
}

/// Heading inventory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingSummary {
    /// Non-empty trimmed H1 texts in document order
    pub h1: Vec<String>,
    pub h1_count: usize,

    /// Non-empty trimmed H2 texts in document order
    pub h2: Vec<String>,
    pub h2_count: usize,

    pub h3_count: usize,
    pub h4_count: usize,
    pub h5_count: usize,
    pub h6_count: usize,
}

/// Text statistics; lengths are in Unicode scalar values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStats {
    pub word_count: usize,
    pub title_length: usize,
    pub description_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    /// Absolute link target
    pub url: String,

    /// Trimmed anchor text
    pub text: String,

    /// `rel` contains `nofollow`
    pub nofollow: bool,
}

/// Link inventory split by host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub internal: Vec<LinkInfo>,
    pub external: Vec<LinkInfo>,
}

impl LinkSummary {
    pub fn internal_count(&self) -> usize {
        self.internal.len()
    }

    pub fn external_count(&self) -> usize {
        self.external.len()
    }

    pub fn nofollow_count(&self) -> usize {
        self.internal
            .iter()
            .chain(self.external.iter())
            .filter(|link| link.nofollow)
            .count()
    }
}

/// Image inventory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub total: usize,
    pub with_alt: usize,
    pub without_alt: usize,
}

impl ImageSummary {
    /// Share of images carrying a non-empty alt, in percent
    ///
    /// A page without images counts as fully covered.
    pub fn alt_coverage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.with_alt as f64 * 100.0 / self.total as f64
        }
    }
}

/// Technical head signals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalSignals {
    /// `href` of `link[rel=canonical]`
    pub canonical: Option<String>,
    pub has_viewport: bool,
    pub charset: Option<String>,
    pub has_meta_refresh: bool,
    pub has_open_graph: bool,
    pub has_twitter_card: bool,
}

/// Directives from `meta[name=robots]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsMeta {
    pub noindex: bool,
    pub nofollow: bool,
    /// `nocache` or `noarchive`
    pub nocache: bool,
}

use serde::{Deserialize, Serialize};

/// Main configuration structure for seo-audit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Per-audit settings, persisted alongside every audit document
///
/// Field names serialize in snake_case for the audit JSON; the TOML file may
/// use the kebab-case aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Port of the locally running site
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of pages analyzed at the same time (values <= 0 fall back to 3)
    #[serde(default = "default_analysis_concurrency")]
    pub concurrency: i32,

    /// Maximum number of pages to fetch (0 = unlimited)
    #[serde(default, alias = "max-pages")]
    pub max_pages: usize,

    /// Maximum link depth from the base URL (0 = unlimited)
    #[serde(default, alias = "max-depth")]
    pub max_depth: usize,

    /// Substrings, or `/regex/` patterns, of URLs never to crawl
    #[serde(default, alias = "ignore-patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            concurrency: default_analysis_concurrency(),
            max_pages: 0,
            max_depth: 0,
            ignore_patterns: Vec::new(),
        }
    }
}

impl AuditConfig {
    /// Effective analysis concurrency
    pub fn analysis_concurrency(&self) -> usize {
        if self.concurrency <= 0 {
            default_analysis_concurrency() as usize
        } else {
            self.concurrency as usize
        }
    }

    /// Base URL of the local site served on `port`
    pub fn local_base_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

/// Crawl pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of crawl workers
    #[serde(default = "default_crawl_concurrency")]
    pub concurrency: usize,

    /// Upper bound on a single page navigation (seconds)
    #[serde(
        rename = "navigation-timeout-secs",
        default = "default_navigation_timeout"
    )]
    pub navigation_timeout_secs: u64,

    /// User agent sent by the HTTP render backend and robots.txt fetcher
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_crawl_concurrency(),
            navigation_timeout_secs: default_navigation_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding one JSON document per audit
    #[serde(rename = "audits-dir", default = "default_audits_dir")]
    pub audits_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            audits_dir: default_audits_dir(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_analysis_concurrency() -> i32 {
    3
}

fn default_crawl_concurrency() -> usize {
    4
}

fn default_navigation_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("seo-audit/{}", env!("CARGO_PKG_VERSION"))
}

fn default_audits_dir() -> String {
    "./.seo-audit/audits".to_string()
}

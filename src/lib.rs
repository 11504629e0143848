//! seo-audit: on-page SEO auditing for locally running websites
//!
//! This crate crawls a site through a pluggable render backend, extracts SEO
//! signals from every page, scores them against a weighted rule set and keeps
//! one JSON document per audit on disk.

pub mod analyzer;
pub mod checker;
pub mod config;
pub mod crawler;
pub mod output;
pub mod processor;
pub mod robots;
pub mod state;
pub mod store;
pub mod url;

use thiserror::Error;

/// Main error type for audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Navigation timeout for {url}")]
    Timeout { url: String },

    #[error("Render backend setup failed: {0}")]
    Setup(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] store::StorageError),

    #[error("Invalid audit state for {id}: {status}")]
    InvalidState { id: String, status: state::AuditStatus },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analyzer::{analyze, AnalysisResult};
pub use checker::{check_page, CheckResult, CheckResults, CheckValue};
pub use config::{AuditConfig, Config};
pub use crawler::{Crawler, HttpRenderBackend, PageResult, RenderBackend};
pub use processor::AuditProcessor;
pub use state::{AnalysisStatus, AuditStatus};
pub use store::{LocalAudit, LocalAuditSummary, LocalPageAnalysis, LocalStore};
pub use crate::url::normalize_url;

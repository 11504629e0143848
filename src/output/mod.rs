//! Output module for audit reports
//!
//! This module handles:
//! - Rendering completed audits as markdown reports
//! - Writing reports to disk

mod markdown;

pub use markdown::{format_audit_report, write_audit_report};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Audit {0} has no summary yet")]
    NotCompleted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

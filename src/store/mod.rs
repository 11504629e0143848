//! Local audit store
//!
//! This module persists audits as JSON documents and generates the summary
//! written when an audit completes.

mod local;
mod models;
mod summary;

pub use local::LocalStore;
pub use models::{LocalAudit, LocalAuditSummary, LocalPageAnalysis, ScoreDistribution};
pub use summary::generate_summary;

use crate::state::AuditStatus;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Audit not found: {0}")]
    AuditNotFound(String),

    #[error("Page not found in audit {audit_id}: {url}")]
    PageNotFound { audit_id: String, url: String },

    #[error("Audit {id} cannot be modified while {status}")]
    InvalidTransition { id: String, status: AuditStatus },

    #[error("Invalid audit id: {0}")]
    InvalidId(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

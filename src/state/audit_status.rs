/// Audit and page status definitions
///
/// This module defines all possible states an audit and its pages can be in.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of an audit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    // ===== Active States =====
    /// Audit has been created and the site is being crawled
    #[default]
    Discovering,

    /// Pages have been submitted and are being analyzed
    Analyzing,

    // ===== Terminal States =====
    /// Summary generated; the audit is immutable except for deletion
    Completed,

    /// The run aborted on a setup error
    Failed,
}

impl AuditStatus {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovering => "discovering",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of analyzing one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Page was analyzed and scored
    Completed,

    /// Page could not be fetched or parsed; scored zero
    Failed,
}

impl AnalysisStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

//! State module for tracking audit progress
//!
//! This module provides the lifecycle states persisted with every audit.
//!
//! # Components
//!
//! - `AuditStatus`: Tracks the state of an audit (discovering, analyzing, completed, failed)
//! - `AnalysisStatus`: Records whether a single page was analyzed successfully

mod audit_status;

// Re-export main types
pub use audit_status::{AnalysisStatus, AuditStatus};

//! Check result types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Measured value attached to a check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for CheckValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<usize> for CheckValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<i64> for CheckValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u16> for CheckValue {
    fn from(v: u16) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for CheckValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for CheckValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for CheckValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl fmt::Display for CheckValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:.1}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Outcome of one named check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub passed: bool,
    pub value: CheckValue,
    pub message: String,
    pub weight: u32,
}

/// Verdict for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResults {
    pub indexable: bool,

    /// Why the page is not indexable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Weighted score, 0-100 with one decimal
    pub score: f64,

    pub checks: BTreeMap<String, CheckResult>,
}

impl CheckResults {
    /// Verdict for a page that cannot be indexed
    pub fn not_indexable(reason: impl Into<String>) -> Self {
        Self {
            indexable: false,
            reason: Some(reason.into()),
            score: 0.0,
            checks: BTreeMap::new(),
        }
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = (&String, &CheckResult)> {
        self.checks.iter().filter(|(_, check)| !check.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.values().filter(|check| check.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.len() - self.passed_count()
    }
}

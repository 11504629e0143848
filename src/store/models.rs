//! Persisted audit documents

use crate::analyzer::AnalysisResult;
use crate::checker::{CheckResult, CheckResults};
use crate::config::AuditConfig;
use crate::crawler::PageResult;
use crate::state::{AnalysisStatus, AuditStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root document of one audit, stored as `{id}.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalAudit {
    pub id: String,
    pub base_url: String,
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    pub status: AuditStatus,

    /// Pages handed to the analyzer
    #[serde(default)]
    pub pages_discovered: usize,

    /// Page records stored so far
    #[serde(default)]
    pub pages_analyzed: usize,

    /// Average score from the summary, set on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,

    /// Running average over successfully scored pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_page_score: Option<f64>,

    pub config: AuditConfig,

    #[serde(default)]
    pub pages: Vec<LocalPageAnalysis>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<LocalAuditSummary>,

    /// Why the run failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LocalAudit {
    /// Creates a fresh audit in the `discovering` state
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, config: AuditConfig) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            created_at: Utc::now(),
            completed_at: None,
            status: AuditStatus::Discovering,
            pages_discovered: 0,
            pages_analyzed: 0,
            overall_score: None,
            avg_page_score: None,
            config,
            pages: Vec::new(),
            summary: None,
            error: None,
        }
    }

    pub fn page(&self, url: &str) -> Option<&LocalPageAnalysis> {
        self.pages.iter().find(|page| page.url() == url)
    }

    /// Inserts the page or replaces the record with the same URL
    pub fn upsert_page(&mut self, page: LocalPageAnalysis) {
        match self.pages.iter_mut().find(|existing| existing.url() == page.url()) {
            Some(existing) => *existing = page,
            None => self.pages.push(page),
        }
        self.pages_analyzed = self.pages.len();
    }

    /// Mean score over pages that were analyzed successfully
    pub fn average_page_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .pages
            .iter()
            .filter(|page| page.analysis_status.is_success())
            .map(|page| page.seo_score)
            .collect();

        if scores.is_empty() {
            None
        } else {
            Some(crate::checker::round1(
                scores.iter().sum::<f64>() / scores.len() as f64,
            ))
        }
    }
}

/// One analyzed page; unique by URL within its audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalPageAnalysis {
    /// Analyzer output, flattened into the page record
    #[serde(flatten)]
    pub analysis: AnalysisResult,

    pub depth: usize,
    pub status_code: u16,
    pub analysis_status: AnalysisStatus,
    pub indexable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    pub seo_score: f64,

    /// Number of failed checks
    pub issue_count: usize,

    pub checks: BTreeMap<String, CheckResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub analyzed_at: DateTime<Utc>,
}

impl LocalPageAnalysis {
    /// Record for a page that was analyzed and scored
    pub fn analyzed(page: &PageResult, analysis: AnalysisResult, results: CheckResults) -> Self {
        let issue_count = results.failed_count();
        Self {
            analysis: AnalysisResult {
                url: page.url.clone(),
                ..analysis
            },
            depth: page.depth,
            status_code: page.status_code,
            analysis_status: AnalysisStatus::Completed,
            indexable: results.indexable,
            reason: results.reason,
            seo_score: results.score,
            issue_count,
            checks: results.checks,
            error: None,
            analyzed_at: Utc::now(),
        }
    }

    /// Zero-score record for a page that could not be fetched or analyzed
    pub fn failed(page: &PageResult, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            analysis: AnalysisResult {
                url: page.url.clone(),
                ..Default::default()
            },
            depth: page.depth,
            status_code: page.status_code,
            analysis_status: AnalysisStatus::Failed,
            indexable: false,
            reason: Some(error.clone()),
            seo_score: 0.0,
            issue_count: 0,
            checks: BTreeMap::new(),
            error: Some(error),
            analyzed_at: Utc::now(),
        }
    }

    pub fn url(&self) -> &str {
        &self.analysis.url
    }
}

/// Pages per score bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    /// 90 and above
    pub excellent: usize,
    /// 70 to below 90
    pub good: usize,
    /// 50 to below 70
    pub needs_improvement: usize,
    /// Below 50
    pub poor: usize,
}

/// Aggregate view of a completed audit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalAuditSummary {
    pub total_pages: usize,
    pub analyzed_pages: usize,
    pub failed_pages: usize,
    pub average_score: f64,
    pub score_distribution: ScoreDistribution,
    pub missing_titles: usize,
    pub missing_descriptions: usize,
    pub missing_h1: usize,
    pub missing_viewport: usize,

    /// Distinct titles shared by more than one page
    pub duplicate_titles: usize,

    /// Distinct descriptions shared by more than one page
    pub duplicate_descriptions: usize,

    pub checks_passed: usize,
    pub checks_failed: usize,

    /// Most frequent failing check messages, `"{message} ({n} pages)"`
    pub top_issues: Vec<String>,

    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

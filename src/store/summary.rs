//! Audit summary generation
//!
//! The summary is computed wholesale from the stored pages when an audit
//! completes, over the pages that were analyzed successfully.

use crate::checker::round1;
use crate::store::{LocalAuditSummary, LocalPageAnalysis, ScoreDistribution};
use chrono::Utc;
use std::collections::HashMap;

const TOP_ISSUES: usize = 5;
const MAX_RECOMMENDATIONS: usize = 5;

/// Builds the summary for a set of page records
pub fn generate_summary(pages: &[LocalPageAnalysis]) -> LocalAuditSummary {
    let analyzed: Vec<&LocalPageAnalysis> = pages
        .iter()
        .filter(|page| page.analysis_status.is_success())
        .collect();

    let mut summary = LocalAuditSummary {
        total_pages: pages.len(),
        analyzed_pages: analyzed.len(),
        failed_pages: pages.len() - analyzed.len(),
        generated_at: Utc::now(),
        ..Default::default()
    };

    if !analyzed.is_empty() {
        let total: f64 = analyzed.iter().map(|page| page.seo_score).sum();
        summary.average_score = round1(total / analyzed.len() as f64);
    }

    let mut issues: HashMap<&str, usize> = HashMap::new();

    for page in &analyzed {
        bucket(&mut summary.score_distribution, page.seo_score);

        let analysis = &page.analysis;
        if analysis.title.is_empty() {
            summary.missing_titles += 1;
        }
        if analysis.description.is_empty() {
            summary.missing_descriptions += 1;
        }
        if analysis.headings.h1_count == 0 {
            summary.missing_h1 += 1;
        }
        if !analysis.technical.has_viewport {
            summary.missing_viewport += 1;
        }

        for check in page.checks.values() {
            if check.passed {
                summary.checks_passed += 1;
            } else {
                summary.checks_failed += 1;
                *issues.entry(check.message.as_str()).or_default() += 1;
            }
        }
    }

    summary.duplicate_titles = count_duplicates(analyzed.iter().map(|p| p.analysis.title.as_str()));
    summary.duplicate_descriptions =
        count_duplicates(analyzed.iter().map(|p| p.analysis.description.as_str()));
    summary.top_issues = top_issues(issues);
    summary.recommendations = recommendations(&summary);

    summary
}

fn bucket(distribution: &mut ScoreDistribution, score: f64) {
    if score >= 90.0 {
        distribution.excellent += 1;
    } else if score >= 70.0 {
        distribution.good += 1;
    } else if score >= 50.0 {
        distribution.needs_improvement += 1;
    } else {
        distribution.poor += 1;
    }
}

/// Number of distinct non-empty values that occur more than once
fn count_duplicates<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for value in values.filter(|value| !value.is_empty()) {
        *seen.entry(value).or_default() += 1;
    }
    seen.values().filter(|&&count| count > 1).count()
}

/// Most frequent messages first; ties ordered alphabetically
fn top_issues(issues: HashMap<&str, usize>) -> Vec<String> {
    let mut ranked: Vec<(&str, usize)> = issues.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(TOP_ISSUES)
        .map(|(message, count)| format!("{} ({} pages)", message, count))
        .collect()
}

fn recommendations(summary: &LocalAuditSummary) -> Vec<String> {
    let mut out = Vec::new();

    if summary.missing_titles > 0 {
        out.push(format!(
            "Add unique title tags to {} pages that are missing them",
            summary.missing_titles
        ));
    }
    if summary.missing_descriptions > 0 {
        out.push(format!(
            "Write meta descriptions for {} pages that are missing them",
            summary.missing_descriptions
        ));
    }
    if summary.missing_h1 > 0 {
        out.push(format!(
            "Add an H1 heading to {} pages that are missing one",
            summary.missing_h1
        ));
    }
    if summary.duplicate_titles > 1 {
        out.push(format!(
            "Rewrite {} titles that are shared by several pages",
            summary.duplicate_titles
        ));
    }
    if summary.duplicate_descriptions > 1 {
        out.push(format!(
            "Rewrite {} meta descriptions that are shared by several pages",
            summary.duplicate_descriptions
        ));
    }
    if summary.missing_viewport > 0 {
        out.push(format!(
            "Add a viewport meta tag to {} pages for mobile devices",
            summary.missing_viewport
        ));
    }
    if summary.analyzed_pages > 0 && summary.average_score < 70.0 {
        out.push(format!(
            "Average SEO score is {:.1}; fix the most common issues first",
            summary.average_score
        ));
    }

    out.truncate(MAX_RECOMMENDATIONS);
    out
}

//! Markdown report generation
//!
//! This module renders a completed audit as a human-readable markdown report,
//! including the score distribution, common issues, recommendations and a
//! per-page table.

use crate::output::{OutputError, OutputResult};
use crate::store::LocalAudit;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report of a completed audit
///
/// # Arguments
///
/// * `audit` - The completed audit
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - The audit has no summary, or the write failed
pub fn write_audit_report(audit: &LocalAudit, output_path: &Path) -> OutputResult<()> {
    let markdown = format_audit_report(audit)?;

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Wrote report for audit {} to {}", audit.id, output_path.display());
    Ok(())
}

/// Formats a completed audit as markdown
pub fn format_audit_report(audit: &LocalAudit) -> OutputResult<String> {
    let summary = audit
        .summary
        .as_ref()
        .ok_or_else(|| OutputError::NotCompleted(audit.id.clone()))?;

    let mut md = String::new();

    // Title
    md.push_str(&format!("# SEO Audit: {}\n\n", audit.base_url));

    // Audit metadata
    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **Audit ID**: {}\n", audit.id));
    md.push_str(&format!("- **Started**: {}\n", audit.created_at.to_rfc3339()));
    if let Some(completed) = &audit.completed_at {
        md.push_str(&format!("- **Completed**: {}\n", completed.to_rfc3339()));
        let duration = (*completed - audit.created_at).num_seconds();
        md.push_str(&format!("- **Duration**: {} seconds\n", duration));
    }
    md.push_str(&format!("- **Status**: {}\n", audit.status));
    md.push_str(&format!(
        "- **Overall Score**: {:.1}\n",
        audit.overall_score.unwrap_or(summary.average_score)
    ));
    md.push_str(&format!("- **Pages**: {}\n", summary.total_pages));
    md.push_str(&format!("- **Analyzed**: {}\n", summary.analyzed_pages));
    md.push_str(&format!("- **Failed**: {}\n\n", summary.failed_pages));

    // Score distribution
    let distribution = &summary.score_distribution;
    md.push_str("## Score Distribution\n\n");
    md.push_str("| Range | Pages |\n");
    md.push_str("|-------|-------|\n");
    md.push_str(&format!("| 90-100 | {} |\n", distribution.excellent));
    md.push_str(&format!("| 70-89 | {} |\n", distribution.good));
    md.push_str(&format!("| 50-69 | {} |\n", distribution.needs_improvement));
    md.push_str(&format!("| 0-49 | {} |\n\n", distribution.poor));

    // Content gaps
    md.push_str("## Content Gaps\n\n");
    md.push_str(&format!("- **Missing titles**: {}\n", summary.missing_titles));
    md.push_str(&format!(
        "- **Missing descriptions**: {}\n",
        summary.missing_descriptions
    ));
    md.push_str(&format!("- **Missing H1**: {}\n", summary.missing_h1));
    md.push_str(&format!("- **Duplicate titles**: {}\n", summary.duplicate_titles));
    md.push_str(&format!(
        "- **Duplicate descriptions**: {}\n",
        summary.duplicate_descriptions
    ));
    md.push_str(&format!(
        "- **Checks passed / failed**: {} / {}\n\n",
        summary.checks_passed, summary.checks_failed
    ));

    if !summary.top_issues.is_empty() {
        md.push_str("## Most Common Issues\n\n");
        for (i, issue) in summary.top_issues.iter().enumerate() {
            md.push_str(&format!("{}. {}\n", i + 1, issue));
        }
        md.push('\n');
    }

    if !summary.recommendations.is_empty() {
        md.push_str("## Recommendations\n\n");
        for recommendation in &summary.recommendations {
            md.push_str(&format!("- {}\n", recommendation));
        }
        md.push('\n');
    }

    // Per-page table, worst first
    if !audit.pages.is_empty() {
        let mut pages: Vec<_> = audit.pages.iter().collect();
        pages.sort_by(|a, b| {
            a.seo_score
                .total_cmp(&b.seo_score)
                .then_with(|| a.url().cmp(b.url()))
        });

        md.push_str("## Pages\n\n");
        md.push_str("| URL | Status | Score | Issues |\n");
        md.push_str("|-----|--------|-------|--------|\n");
        for page in pages {
            let status = match &page.error {
                Some(error) => format!("failed ({})", escape_cell(error)),
                None if !page.indexable => "not indexable".to_string(),
                None => page.status_code.to_string(),
            };
            md.push_str(&format!(
                "| {} | {} | {:.1} | {} |\n",
                escape_cell(page.url()),
                status,
                page.seo_score,
                page.issue_count
            ));
        }
        md.push('\n');
    }

    Ok(md)
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

//! seo-audit main entry point
//!
//! This is the command-line interface for the local SEO auditor.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seo_audit::config::{load_config, Config};
use seo_audit::output::write_audit_report;
use seo_audit::{AuditProcessor, LocalAudit, LocalStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// seo-audit: on-page SEO auditing for locally running sites
///
/// seo-audit crawls a site served on localhost while respecting robots.txt,
/// scores every page against a weighted set of SEO checks and keeps the
/// results as JSON documents.
#[derive(Parser, Debug)]
#[command(name = "seo-audit")]
#[command(version = "1.0.0")]
#[command(about = "On-page SEO auditor for local sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl and audit the site
    Run {
        /// Start page (defaults to http://localhost:{port})
        #[arg(long)]
        base_url: Option<String>,
    },

    /// List stored audits
    List,

    /// Show an audit summary
    Show {
        /// Audit ID
        id: String,
    },

    /// Export a completed audit as markdown
    Report {
        /// Audit ID
        id: String,

        /// Output path (defaults to {id}.md)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Delete a stored audit
    Delete {
        /// Audit ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let store = Arc::new(
        LocalStore::new(&config.output.audits_dir)
            .with_context(|| format!("failed to open {}", config.output.audits_dir))?,
    );
    let processor = AuditProcessor::new(store, config.crawler.clone());

    match cli.command {
        Command::Run { base_url } => handle_run(&processor, &config, base_url).await?,
        Command::List => handle_list(&processor)?,
        Command::Show { id } => handle_show(&processor, &id)?,
        Command::Report { id, out } => handle_report(&processor, &id, out)?,
        Command::Delete { id } => {
            processor.delete_audit(&id)?;
            println!("Deleted audit {}", id);
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_audit=info,warn"),
            1 => EnvFilter::new("seo_audit=debug,info"),
            2 => EnvFilter::new("seo_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `run`: audits the site and prints the summary
async fn handle_run(
    processor: &AuditProcessor,
    config: &Config,
    base_url: Option<String>,
) -> Result<()> {
    let base_url = base_url.unwrap_or_else(|| config.audit.local_base_url());

    let audit = processor
        .run_http_audit(&base_url, config.audit.clone())
        .await
        .with_context(|| format!("audit of {} failed", base_url))?;

    print_audit(&audit);
    Ok(())
}

fn handle_list(processor: &AuditProcessor) -> Result<()> {
    let audits = processor.list_audits()?;
    if audits.is_empty() {
        println!("No audits found.");
        return Ok(());
    }

    println!("{:<38} {:<12} {:>6} {:>7}  URL", "ID", "STATUS", "PAGES", "SCORE");
    for audit in &audits {
        let score = audit
            .overall_score
            .map(|score| format!("{:.1}", score))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<38} {:<12} {:>6} {:>7}  {}",
            audit.id,
            audit.status,
            audit.pages.len(),
            score,
            audit.base_url
        );
    }

    Ok(())
}

fn handle_show(processor: &AuditProcessor, id: &str) -> Result<()> {
    let audit = processor.get_audit_status(id)?;
    print_audit(&audit);
    Ok(())
}

fn handle_report(processor: &AuditProcessor, id: &str, out: Option<PathBuf>) -> Result<()> {
    let audit = processor.get_audit_status(id)?;
    let path = out.unwrap_or_else(|| PathBuf::from(format!("{}.md", id)));

    write_audit_report(&audit, &path)?;
    println!("Report written to {}", path.display());
    Ok(())
}

fn print_audit(audit: &LocalAudit) {
    println!("=== SEO Audit {} ===\n", audit.id);
    println!("Site:    {}", audit.base_url);
    println!("Status:  {}", audit.status);
    println!("Pages:   {}", audit.pages.len());
    if let Some(error) = &audit.error {
        println!("Error:   {}", error);
    }

    let Some(summary) = &audit.summary else {
        return;
    };

    println!("Score:   {:.1}", summary.average_score);
    println!("\nScore Distribution:");
    println!("  90-100: {}", summary.score_distribution.excellent);
    println!("  70-89:  {}", summary.score_distribution.good);
    println!("  50-69:  {}", summary.score_distribution.needs_improvement);
    println!("  0-49:   {}", summary.score_distribution.poor);

    if !summary.top_issues.is_empty() {
        println!("\nMost Common Issues:");
        for issue in &summary.top_issues {
            println!("  - {}", issue);
        }
    }

    if !summary.recommendations.is_empty() {
        println!("\nRecommendations:");
        for recommendation in &summary.recommendations {
            println!("  - {}", recommendation);
        }
    }
}

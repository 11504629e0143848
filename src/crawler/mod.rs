//! Crawler module for site discovery
//!
//! This module contains the core crawling logic, including:
//! - The render backend abstraction and its HTTP implementation
//! - Anchor enumeration and link resolution
//! - The bounded frontier and its quiescence detection
//! - Overall crawl coordination

mod backend;
mod coordinator;
mod frontier;
mod parser;

pub use backend::{build_http_client, HttpRenderBackend, Navigation, RenderBackend};
pub use coordinator::{CrawlStats, Crawler, PageResult};
pub use frontier::{CrawlTask, Frontier, DEFAULT_QUEUE_CAPACITY};
pub use parser::{extract_hrefs, resolve_link};

use crate::config::{AuditConfig, CrawlerConfig};
use crate::AuditError;
use std::sync::Arc;

/// Runs a complete crawl of the site at `base_url`
///
/// This is the main entry point for discovering pages. It will:
/// 1. Normalize the base URL and compile the ignore patterns
/// 2. Fetch the site's robots.txt
/// 3. Crawl same-host links with the configured worker pool
/// 4. Return every recorded page
///
/// # Arguments
///
/// * `base_url` - The start page
/// * `config` - Page/depth limits and ignore patterns
/// * `crawler_config` - Worker count, navigation timeout, user agent
/// * `backend` - The render backend to drive
///
/// # Returns
///
/// * `Ok(Vec<PageResult>)` - Pages in completion order
/// * `Err(AuditError)` - The crawl could not be set up
pub async fn crawl(
    base_url: &str,
    config: AuditConfig,
    crawler_config: &CrawlerConfig,
    backend: Arc<dyn RenderBackend>,
) -> Result<Vec<PageResult>, AuditError> {
    let crawler = Crawler::new(base_url, config, crawler_config, backend)?;
    crawler.start().await?;
    Ok(crawler.results())
}

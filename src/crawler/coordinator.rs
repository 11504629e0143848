//! Crawler coordinator - worker pool and page discovery
//!
//! This module contains the crawl loop that coordinates:
//! - Seeding the frontier with the base URL
//! - Spawning the worker pool
//! - Visited/page-cap/ignore/robots filtering
//! - Driving the render backend and recording page results
//! - Expanding links up to the depth ceiling

use crate::config::{AuditConfig, CrawlerConfig};
use crate::crawler::backend::{build_http_client, RenderBackend};
use crate::crawler::frontier::{CrawlTask, Frontier, DEFAULT_QUEUE_CAPACITY};
use crate::crawler::parser::resolve_link;
use crate::robots::{fetch_robots, RobotsRules};
use crate::url::{normalize_str, normalize_url, same_host, IgnoreMatcher};
use crate::AuditError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A fetched page, immutable once recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// Normalized page URL
    pub url: String,

    /// Rendered HTML (empty when navigation failed)
    pub content: String,

    /// Link distance from the base URL
    pub depth: usize,

    /// HTTP status (0 when navigation failed)
    pub status_code: u16,
}

impl PageResult {
    pub fn is_failed_fetch(&self) -> bool {
        self.status_code == 0
    }
}

/// Counters describing crawl progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// URLs seen by a worker (fetched or rejected)
    pub visited: usize,

    /// Tasks waiting in the frontier
    pub queued: usize,

    /// Tasks queued or being processed
    pub in_flight: usize,

    /// Recorded page results
    pub results: usize,
}

#[derive(Debug, Default)]
struct CrawlState {
    visited: HashSet<String>,
    page_count: usize,
    results: Vec<PageResult>,
}

/// Why a task was rejected before fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Visited,
    PageLimit,
    Ignored,
    Robots,
}

struct CrawlerInner {
    base_url: Url,
    config: AuditConfig,
    workers: usize,
    navigation_timeout: Duration,
    backend: Arc<dyn RenderBackend>,
    client: Client,
    ignore: IgnoreMatcher,
    state: RwLock<CrawlState>,
    robots: RwLock<Option<RobotsRules>>,
    frontier: Frontier,
    cancel: CancellationToken,
}

/// Bounded-concurrency site crawler
///
/// One crawler performs one crawl: call [`Crawler::start`] once, then read
/// [`Crawler::results`].
pub struct Crawler {
    inner: Arc<CrawlerInner>,
}

impl Crawler {
    /// Creates a crawler for the site at `base_url`
    ///
    /// # Arguments
    ///
    /// * `base_url` - Start page; only links on its host are followed
    /// * `config` - Page/depth limits and ignore patterns
    /// * `crawler_config` - Worker count, navigation timeout, user agent
    /// * `backend` - The render backend to drive
    pub fn new(
        base_url: &str,
        config: AuditConfig,
        crawler_config: &CrawlerConfig,
        backend: Arc<dyn RenderBackend>,
    ) -> Result<Self, AuditError> {
        let base_url = normalize_url(base_url)?;
        let ignore = IgnoreMatcher::new(&config.ignore_patterns)?;
        let client = build_http_client(crawler_config)?;
        let cancel = CancellationToken::new();

        let inner = CrawlerInner {
            base_url,
            config,
            workers: crawler_config.concurrency.max(1),
            navigation_timeout: Duration::from_secs(crawler_config.navigation_timeout_secs),
            backend,
            client,
            ignore,
            state: RwLock::new(CrawlState::default()),
            robots: RwLock::new(None),
            frontier: Frontier::new(DEFAULT_QUEUE_CAPACITY, cancel.clone()),
            cancel,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Uses the given robots rules instead of fetching robots.txt
    pub fn with_robots(self, rules: RobotsRules) -> Self {
        *write_lock(&self.inner.robots) = Some(rules);
        self
    }

    /// Runs the crawl until the frontier drains or the page limit is reached
    pub async fn start(&self) -> Result<(), AuditError> {
        let inner = &self.inner;
        let started = Instant::now();

        let needs_robots = read_lock(&inner.robots).is_none();
        if needs_robots {
            let rules = fetch_robots(&inner.client, &inner.base_url).await;
            *write_lock(&inner.robots) = Some(rules);
        }

        tracing::info!(
            "Starting crawl of {} with {} workers (max pages: {}, max depth: {})",
            inner.base_url,
            inner.workers,
            inner.config.max_pages,
            inner.config.max_depth
        );

        let seeded = inner.frontier.push(CrawlTask {
            url: inner.base_url.to_string(),
            depth: 0,
        });
        if !seeded {
            tracing::warn!("Could not seed frontier with {}", inner.base_url);
            return Ok(());
        }

        let mut workers = JoinSet::new();
        for id in 0..inner.workers {
            let inner = Arc::clone(inner);
            workers.spawn(async move { inner.run_worker(id).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Crawl worker terminated abnormally: {}", e);
            }
        }

        let stats = self.stats();
        tracing::info!(
            "Crawl completed: {} pages fetched, {} URLs visited in {:?}",
            stats.results,
            stats.visited,
            started.elapsed()
        );

        Ok(())
    }

    /// Stops the crawl; workers exit after their current step
    pub fn stop(&self) {
        self.inner.cancel.cancel();
    }

    /// Snapshot of all recorded page results
    pub fn results(&self) -> Vec<PageResult> {
        read_lock(&self.inner.state).results.clone()
    }

    /// Current crawl counters
    pub fn stats(&self) -> CrawlStats {
        let state = read_lock(&self.inner.state);
        CrawlStats {
            visited: state.visited.len(),
            queued: self.inner.frontier.queued(),
            in_flight: self.inner.frontier.in_flight(),
            results: state.results.len(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }
}

impl CrawlerInner {
    async fn run_worker(&self, id: usize) {
        tracing::trace!("Crawl worker {} started", id);

        while let Some(task) = self.frontier.pop().await {
            self.process_task(task).await;
            self.frontier.complete();
        }

        tracing::trace!("Crawl worker {} exiting", id);
    }

    /// Processes one task: filter, fetch, record, expand
    async fn process_task(&self, task: CrawlTask) {
        let url = match normalize_url(&task.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping unnormalizable URL {}: {}", task.url, e);
                return;
            }
        };

        if let Err(rejection) = self.admit(&url) {
            tracing::debug!("Skipping {} ({:?})", url, rejection);
            return;
        }

        tracing::debug!("Fetching {} (depth {})", url, task.depth);

        let navigation = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!("Crawl stopped before {} was fetched", url);
                return;
            }
            outcome = tokio::time::timeout(self.navigation_timeout, self.backend.navigate(&url)) => {
                match outcome {
                    Ok(Ok(nav)) => Ok(nav),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("navigation timed out after {:?}", self.navigation_timeout)),
                }
            }
        };

        let (result, anchors) = match navigation {
            Ok(nav) => (
                PageResult {
                    url: url.to_string(),
                    content: nav.html,
                    depth: task.depth,
                    status_code: nav.status_code,
                },
                nav.anchors,
            ),
            Err(reason) => {
                tracing::warn!("Navigation to {} failed: {}", url, reason);
                (
                    PageResult {
                        url: url.to_string(),
                        content: String::new(),
                        depth: task.depth,
                        status_code: 0,
                    },
                    Vec::new(),
                )
            }
        };

        if self.may_expand(task.depth) {
            self.enqueue_links(&url, &anchors, task.depth + 1);
        }

        let recorded = {
            let mut state = write_lock(&self.state);
            state.results.push(result);
            state.results.len()
        };

        if self.config.max_pages > 0 && recorded >= self.config.max_pages {
            tracing::info!("Page limit of {} reached", self.config.max_pages);
            self.frontier.close();
        }
    }

    /// Applies the fast-reject checks and reserves a page slot
    ///
    /// Every URL that reaches this point is marked visited, admitted or not.
    fn admit(&self, url: &Url) -> Result<(), Rejection> {
        let key = url.as_str();
        let mut state = write_lock(&self.state);

        if !state.visited.insert(key.to_string()) {
            return Err(Rejection::Visited);
        }

        if self.config.max_pages > 0 && state.page_count >= self.config.max_pages {
            return Err(Rejection::PageLimit);
        }

        if self.ignore.is_ignored(key) {
            return Err(Rejection::Ignored);
        }

        if self.is_disallowed(url) {
            return Err(Rejection::Robots);
        }

        state.page_count += 1;
        Ok(())
    }

    /// Links are only followed from pages above the depth ceiling
    fn may_expand(&self, depth: usize) -> bool {
        self.config.max_depth == 0 || depth < self.config.max_depth
    }

    fn enqueue_links(&self, page_url: &Url, anchors: &[String], depth: usize) {
        let mut enqueued = 0usize;

        for href in anchors {
            let Some(resolved) = resolve_link(href, page_url) else {
                continue;
            };
            let Ok(key) = normalize_str(resolved.as_str()) else {
                continue;
            };

            if !same_host(&resolved, &self.base_url)
                || self.ignore.is_ignored(&key)
                || self.is_disallowed(&resolved)
                || read_lock(&self.state).visited.contains(&key)
            {
                continue;
            }

            if self.frontier.push(CrawlTask { url: key, depth }) {
                enqueued += 1;
            }
        }

        tracing::debug!("Enqueued {} links from {}", enqueued, page_url);
    }

    fn is_disallowed(&self, url: &Url) -> bool {
        read_lock(&self.robots)
            .as_ref()
            .map(|rules| rules.is_disallowed(url.path()))
            .unwrap_or(false)
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

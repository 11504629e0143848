//! Audit processor
//!
//! Drives an audit through its lifecycle: creation, crawling, bounded
//! concurrent analysis of the discovered pages, and finalization.

use crate::analyzer::analyze;
use crate::checker::check_page;
use crate::config::{validate_audit_config, AuditConfig, CrawlerConfig};
use crate::crawler::{Crawler, HttpRenderBackend, PageResult, RenderBackend};
use crate::state::AuditStatus;
use crate::store::{LocalAudit, LocalPageAnalysis, LocalStore, StorageError};
use crate::url::normalize_str;
use crate::AuditError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use uuid::Uuid;

/// Pages currently being analyzed, per audit
#[derive(Debug, Default)]
struct ProcessorState {
    in_flight: HashMap<String, HashSet<String>>,
}

/// Orchestrates crawl, analysis and persistence of audits
pub struct AuditProcessor {
    store: Arc<LocalStore>,
    crawler_config: CrawlerConfig,
    state: Arc<Mutex<ProcessorState>>,
}

impl AuditProcessor {
    pub fn new(store: Arc<LocalStore>, crawler_config: CrawlerConfig) -> Self {
        Self {
            store,
            crawler_config,
            state: Arc::new(Mutex::new(ProcessorState::default())),
        }
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    /// Creates and persists a new audit in the `discovering` state
    pub fn start_audit(&self, base_url: &str, config: AuditConfig) -> Result<LocalAudit, AuditError> {
        validate_audit_config(&config)?;
        let base_url = normalize_str(base_url)?;

        let audit = LocalAudit::new(Uuid::new_v4().to_string(), base_url, config);
        self.store.create_audit(&audit)?;

        tracing::info!("Started audit {} for {}", audit.id, audit.base_url);
        Ok(audit)
    }

    /// Hands crawled pages to the analyzer
    ///
    /// Only an audit still in `discovering` accepts pages. Page URLs are
    /// normalized, so variants of one address collapse into a single record.
    /// Pages that did not answer 200 are stored as zero-score failures without
    /// analysis. The rest are analyzed concurrently, bounded by the audit's
    /// analysis concurrency. The returned handle resolves to the completed
    /// audit once every page is stored and the summary is written.
    pub fn submit_pages(
        &self,
        audit_id: &str,
        pages: Vec<PageResult>,
    ) -> Result<JoinHandle<Result<LocalAudit, AuditError>>, AuditError> {
        let mut seen = HashSet::new();
        let pages: Vec<PageResult> = pages
            .into_iter()
            .map(|mut page| {
                if let Ok(key) = normalize_str(&page.url) {
                    page.url = key;
                }
                page
            })
            .filter(|page| seen.insert(page.url.clone()))
            .collect();

        let audit = match self.store.begin_analysis(audit_id, pages.len()) {
            Ok(audit) => audit,
            Err(StorageError::InvalidTransition { id, status }) => {
                return Err(AuditError::InvalidState { id, status })
            }
            Err(e) => return Err(e.into()),
        };
        let permits = audit.config.analysis_concurrency();

        tracing::info!(
            "Analyzing {} pages for audit {} ({} at a time)",
            pages.len(),
            audit_id,
            permits
        );

        let accepted = {
            let mut state = lock(&self.state);
            let in_flight = state.in_flight.entry(audit_id.to_string()).or_default();
            pages
                .into_iter()
                .filter(|page| in_flight.insert(page.url.clone()))
                .collect::<Vec<_>>()
        };

        let semaphore = Arc::new(Semaphore::new(permits));
        let mut tasks = JoinSet::new();

        for page in accepted {
            let store = Arc::clone(&self.store);
            let state = Arc::clone(&self.state);
            let semaphore = Arc::clone(&semaphore);
            let audit_id = audit_id.to_string();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let url = page.url.clone();

                let stored = {
                    let audit_id = audit_id.clone();
                    tokio::task::spawn_blocking(move || {
                        let record = analyze_page(&page);
                        store.add_page_analysis(&audit_id, record)
                    })
                    .await
                };

                match stored {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => tracing::warn!("Failed to store analysis of {}: {}", url, e),
                    Err(e) => tracing::error!("Analysis of {} aborted: {}", url, e),
                }

                if let Some(in_flight) = lock(&state).in_flight.get_mut(&audit_id) {
                    in_flight.remove(&url);
                }
            });
        }

        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let audit_id = audit_id.to_string();

        Ok(tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Page analysis task failed: {}", e);
                }
            }

            let completed = {
                let store = Arc::clone(&store);
                let audit_id = audit_id.clone();
                tokio::task::spawn_blocking(move || store.complete_audit(&audit_id)).await??
            };

            lock(&state).in_flight.remove(&audit_id);
            Ok(completed)
        }))
    }

    /// Current state of an audit, always read from disk
    pub fn get_audit_status(&self, audit_id: &str) -> Result<LocalAudit, AuditError> {
        Ok(self.store.load_audit(audit_id)?)
    }

    pub fn get_page_details(&self, audit_id: &str, url: &str) -> Result<LocalPageAnalysis, AuditError> {
        match self.store.get_page(audit_id, url) {
            Err(StorageError::PageNotFound { .. }) => {
                // Pages are keyed by normalized URL
                let normalized = normalize_str(url)?;
                Ok(self.store.get_page(audit_id, &normalized)?)
            }
            other => Ok(other?),
        }
    }

    pub fn list_audits(&self) -> Result<Vec<LocalAudit>, AuditError> {
        Ok(self.store.list_audits()?)
    }

    pub fn delete_audit(&self, audit_id: &str) -> Result<(), AuditError> {
        self.store.delete_audit(audit_id)?;
        lock(&self.state).in_flight.remove(audit_id);
        Ok(())
    }

    /// Number of pages of an audit still being analyzed
    pub fn pages_in_flight(&self, audit_id: &str) -> usize {
        lock(&self.state)
            .in_flight
            .get(audit_id)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    /// Runs a full audit with the given render backend
    ///
    /// Setup failures mark the audit `failed` and are returned to the caller.
    pub async fn run_audit(
        &self,
        base_url: &str,
        config: AuditConfig,
        backend: Arc<dyn RenderBackend>,
    ) -> Result<LocalAudit, AuditError> {
        let audit = self.start_audit(base_url, config)?;
        self.crawl_and_analyze(audit, backend).await
    }

    /// Runs a full audit with the built-in HTTP render backend
    pub async fn run_http_audit(
        &self,
        base_url: &str,
        config: AuditConfig,
    ) -> Result<LocalAudit, AuditError> {
        let audit = self.start_audit(base_url, config)?;

        let backend = match HttpRenderBackend::launch(&self.crawler_config) {
            Ok(backend) => backend,
            Err(e) => return Err(self.fail_audit(&audit.id, e)),
        };

        self.crawl_and_analyze(audit, Arc::new(backend)).await
    }

    async fn crawl_and_analyze(
        &self,
        audit: LocalAudit,
        backend: Arc<dyn RenderBackend>,
    ) -> Result<LocalAudit, AuditError> {
        let crawler = match Crawler::new(
            &audit.base_url,
            audit.config.clone(),
            &self.crawler_config,
            backend,
        ) {
            Ok(crawler) => crawler,
            Err(e) => return Err(self.fail_audit(&audit.id, e)),
        };

        if let Err(e) = crawler.start().await {
            return Err(self.fail_audit(&audit.id, e));
        }

        let pages = crawler.results();
        tracing::info!("Audit {} discovered {} pages", audit.id, pages.len());

        let finalizer = self.submit_pages(&audit.id, pages)?;
        finalizer.await?
    }

    /// Marks the audit failed and hands the error back
    fn fail_audit(&self, audit_id: &str, error: AuditError) -> AuditError {
        tracing::error!("Audit {} failed: {}", audit_id, error);

        let message = error.to_string();
        let updated = self.store.update_audit(audit_id, |audit| {
            audit.status = AuditStatus::Failed;
            audit.error = Some(message);
        });
        if let Err(e) = updated {
            tracing::warn!("Could not mark audit {} as failed: {}", audit_id, e);
        }

        lock(&self.state).in_flight.remove(audit_id);
        error
    }
}

/// Analyzes and scores one crawled page
fn analyze_page(page: &PageResult) -> LocalPageAnalysis {
    if page.status_code != 200 {
        let reason = if page.is_failed_fetch() {
            "Page could not be loaded".to_string()
        } else {
            format!("HTTP status {}", page.status_code)
        };
        tracing::debug!("Recording {} as failed: {}", page.url, reason);
        return LocalPageAnalysis::failed(page, reason);
    }

    match analyze(&page.content, &page.url) {
        Ok(analysis) => {
            let results = check_page(&analysis, page.status_code, &page.url);
            tracing::debug!("Scored {} at {:.1}", page.url, results.score);
            LocalPageAnalysis::analyzed(page, analysis, results)
        }
        Err(e) => {
            tracing::warn!("Failed to analyze {}: {}", page.url, e);
            LocalPageAnalysis::failed(page, format!("Failed to analyze page: {}", e))
        }
    }
}

fn lock(state: &Mutex<ProcessorState>) -> MutexGuard<'_, ProcessorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

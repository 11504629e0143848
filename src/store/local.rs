//! File-backed audit store
//!
//! One pretty-printed JSON document per audit at `{dir}/{id}.json`.

use crate::state::AuditStatus;
use crate::store::summary::generate_summary;
use crate::store::{LocalAudit, LocalPageAnalysis, StorageError, StorageResult};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Audit document store rooted at one directory
#[derive(Debug)]
pub struct LocalStore {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LocalStore {
    /// Opens the store, creating the directory if needed
    pub fn new(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists a newly created audit
    pub fn create_audit(&self, audit: &LocalAudit) -> StorageResult<()> {
        let lock = self.lock_for(&audit.id)?;
        let _guard = acquire(&lock);
        self.write(audit)?;
        tracing::debug!("Created audit {} for {}", audit.id, audit.base_url);
        Ok(())
    }

    /// Overwrites the stored document
    ///
    /// Completed and failed audits are immutable.
    pub fn save_audit(&self, audit: &LocalAudit) -> StorageResult<()> {
        let lock = self.lock_for(&audit.id)?;
        let _guard = acquire(&lock);

        match self.read(&audit.id) {
            Ok(stored) => ensure_mutable(&stored)?,
            Err(StorageError::AuditNotFound(_)) => {}
            Err(e) => return Err(e),
        }
        self.write(audit)
    }

    pub fn load_audit(&self, id: &str) -> StorageResult<LocalAudit> {
        self.read(id)
    }

    /// Applies `update` to the stored audit under its write lock
    ///
    /// Fails with [`StorageError::InvalidTransition`] once the audit is
    /// completed or failed.
    pub fn update_audit<F>(&self, id: &str, update: F) -> StorageResult<LocalAudit>
    where
        F: FnOnce(&mut LocalAudit),
    {
        self.modify(id, |audit| {
            update(audit);
            Ok(())
        })
    }

    /// Moves a `discovering` audit to `analyzing`
    ///
    /// Only one batch of pages may start analysis; any other status is
    /// rejected.
    pub fn begin_analysis(&self, id: &str, pages_discovered: usize) -> StorageResult<LocalAudit> {
        self.modify(id, |audit| {
            if audit.status != AuditStatus::Discovering {
                return Err(StorageError::InvalidTransition {
                    id: audit.id.clone(),
                    status: audit.status,
                });
            }
            audit.status = AuditStatus::Analyzing;
            audit.pages_discovered = pages_discovered;
            Ok(())
        })
    }

    /// Upserts a page record and refreshes the running average
    pub fn add_page_analysis(
        &self,
        id: &str,
        page: LocalPageAnalysis,
    ) -> StorageResult<LocalAudit> {
        self.update_audit(id, |audit| {
            audit.upsert_page(page);
            audit.avg_page_score = audit.average_page_score();
        })
    }

    /// Generates the summary and marks the audit completed
    pub fn complete_audit(&self, id: &str) -> StorageResult<LocalAudit> {
        let audit = self.update_audit(id, |audit| {
            let summary = generate_summary(&audit.pages);
            audit.overall_score = Some(summary.average_score);
            audit.summary = Some(summary);
            audit.status = AuditStatus::Completed;
            audit.completed_at = Some(Utc::now());
        })?;

        tracing::info!(
            "Audit {} completed: {} pages, overall score {:.1}",
            audit.id,
            audit.pages.len(),
            audit.overall_score.unwrap_or(0.0)
        );
        Ok(audit)
    }

    /// Loads every readable audit, newest first
    ///
    /// Unreadable or corrupt files are skipped.
    pub fn list_audits(&self) -> StorageResult<Vec<LocalAudit>> {
        let mut audits = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match read_document(&path) {
                Ok(audit) => audits.push(audit),
                Err(e) => tracing::warn!("Skipping unreadable audit {}: {}", path.display(), e),
            }
        }

        audits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(audits)
    }

    pub fn delete_audit(&self, id: &str) -> StorageResult<()> {
        let lock = self.lock_for(id)?;
        {
            let _guard = acquire(&lock);
            match fs::remove_file(self.path_for(id)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(StorageError::AuditNotFound(id.to_string()))
                }
                Err(e) => return Err(e.into()),
            }
        }

        lock_map(&self.locks).remove(id);
        tracing::info!("Deleted audit {}", id);
        Ok(())
    }

    /// Loads one page record of an audit
    pub fn get_page(&self, id: &str, url: &str) -> StorageResult<LocalPageAnalysis> {
        let audit = self.read(id)?;
        audit
            .page(url)
            .cloned()
            .ok_or_else(|| StorageError::PageNotFound {
                audit_id: id.to_string(),
                url: url.to_string(),
            })
    }

    /// Read-modify-write of one audit under its lock
    fn modify<F>(&self, id: &str, update: F) -> StorageResult<LocalAudit>
    where
        F: FnOnce(&mut LocalAudit) -> StorageResult<()>,
    {
        let lock = self.lock_for(id)?;
        let _guard = acquire(&lock);

        let mut audit = self.read(id)?;
        ensure_mutable(&audit)?;
        update(&mut audit)?;
        self.write(&audit)?;
        Ok(audit)
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn lock_for(&self, id: &str) -> StorageResult<Arc<Mutex<()>>> {
        validate_id(id)?;
        let mut locks = lock_map(&self.locks);
        Ok(Arc::clone(locks.entry(id.to_string()).or_default()))
    }

    fn read(&self, id: &str) -> StorageResult<LocalAudit> {
        validate_id(id)?;
        read_document(&self.path_for(id)).map_err(|e| match e {
            StorageError::Io(io) if io.kind() == ErrorKind::NotFound => {
                StorageError::AuditNotFound(id.to_string())
            }
            other => other,
        })
    }

    /// Writes to a temporary sibling, then renames it into place
    fn write(&self, audit: &LocalAudit) -> StorageResult<()> {
        let path = self.path_for(&audit.id);
        let tmp = self.dir.join(format!(".{}.json.tmp", audit.id));

        let json = serde_json::to_vec_pretty(audit)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn ensure_mutable(audit: &LocalAudit) -> StorageResult<()> {
    if audit.status.is_terminal() {
        Err(StorageError::InvalidTransition {
            id: audit.id.clone(),
            status: audit.status,
        })
    } else {
        Ok(())
    }
}

fn read_document(path: &Path) -> StorageResult<LocalAudit> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Audit ids become file names; reject anything that could escape the directory
fn validate_id(id: &str) -> StorageResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidId(id.to_string()))
    }
}

fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock_map(
    locks: &Mutex<HashMap<String, Arc<Mutex<()>>>>,
) -> MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalysisResult;
    use crate::checker::CheckResults;
    use crate::config::AuditConfig;
    use crate::crawler::PageResult;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("audits")).unwrap();
        (dir, store)
    }

    fn scored(url: &str, score: f64) -> LocalPageAnalysis {
        let page = PageResult {
            url: url.to_string(),
            content: String::new(),
            depth: 1,
            status_code: 200,
        };
        LocalPageAnalysis::analyzed(
            &page,
            AnalysisResult::default(),
            CheckResults {
                indexable: true,
                score,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_create_and_load() {
        let (_dir, store) = store();
        let audit = LocalAudit::new("a1", "http://localhost:3000/", AuditConfig::default());
        store.create_audit(&audit).unwrap();

        let loaded = store.load_audit("a1").unwrap();
        assert_eq!(loaded, audit);
        assert_eq!(loaded.status, AuditStatus::Discovering);
        assert!(store.dir().join("a1.json").exists());
    }

    #[test]
    fn test_missing_audit_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load_audit("nope"),
            Err(StorageError::AuditNotFound(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_invalid_id_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load_audit("../etc/passwd"),
            Err(StorageError::InvalidId(_))
        ));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let (_dir, store) = store();
        store
            .create_audit(&LocalAudit::new("a1", "http://s/", AuditConfig::default()))
            .unwrap();

        store.add_page_analysis("a1", scored("http://s/x", 40.0)).unwrap();
        store.add_page_analysis("a1", scored("http://s/x", 60.0)).unwrap();
        let audit = store.add_page_analysis("a1", scored("http://s/y", 81.0)).unwrap();

        assert_eq!(audit.pages.len(), 2);
        assert_eq!(audit.pages_analyzed, 2);
        assert_eq!(audit.page("http://s/x").unwrap().seo_score, 60.0);
        assert_eq!(audit.avg_page_score, Some(70.5));
    }

    #[test]
    fn test_failed_pages_do_not_move_average() {
        let (_dir, store) = store();
        store
            .create_audit(&LocalAudit::new("a1", "http://s/", AuditConfig::default()))
            .unwrap();

        let broken = PageResult {
            url: "http://s/broken".to_string(),
            content: String::new(),
            depth: 1,
            status_code: 0,
        };
        store.add_page_analysis("a1", scored("http://s/", 90.0)).unwrap();
        let audit = store
            .add_page_analysis("a1", LocalPageAnalysis::failed(&broken, "navigation failed"))
            .unwrap();

        assert_eq!(audit.avg_page_score, Some(90.0));
    }

    #[test]
    fn test_complete_audit_writes_summary() {
        let (_dir, store) = store();
        store
            .create_audit(&LocalAudit::new("a1", "http://s/", AuditConfig::default()))
            .unwrap();
        store.add_page_analysis("a1", scored("http://s/", 75.0)).unwrap();
        store.add_page_analysis("a1", scored("http://s/b", 80.0)).unwrap();

        let audit = store.complete_audit("a1").unwrap();
        assert_eq!(audit.status, AuditStatus::Completed);
        assert!(audit.completed_at.is_some());
        assert_eq!(audit.overall_score, Some(77.5));
        assert_eq!(audit.summary.as_ref().unwrap().analyzed_pages, 2);

        let reloaded = store.load_audit("a1").unwrap();
        assert_eq!(reloaded.summary, audit.summary);
    }

    #[test]
    fn test_completed_audit_is_immutable() {
        let (_dir, store) = store();
        store
            .create_audit(&LocalAudit::new("a1", "http://s/", AuditConfig::default()))
            .unwrap();
        store.add_page_analysis("a1", scored("http://s/", 75.0)).unwrap();
        let completed = store.complete_audit("a1").unwrap();

        assert!(matches!(
            store.add_page_analysis("a1", scored("http://s/late", 10.0)),
            Err(StorageError::InvalidTransition {
                status: AuditStatus::Completed,
                ..
            })
        ));
        assert!(matches!(
            store.complete_audit("a1"),
            Err(StorageError::InvalidTransition { .. })
        ));
        assert!(matches!(
            store.save_audit(&completed),
            Err(StorageError::InvalidTransition { .. })
        ));

        let reloaded = store.load_audit("a1").unwrap();
        assert_eq!(reloaded.pages.len(), 1);
        assert_eq!(reloaded.summary.unwrap().total_pages, 1);
    }

    #[test]
    fn test_begin_analysis_only_from_discovering() {
        let (_dir, store) = store();
        store
            .create_audit(&LocalAudit::new("a1", "http://s/", AuditConfig::default()))
            .unwrap();

        let audit = store.begin_analysis("a1", 4).unwrap();
        assert_eq!(audit.status, AuditStatus::Analyzing);
        assert_eq!(audit.pages_discovered, 4);

        assert!(matches!(
            store.begin_analysis("a1", 2),
            Err(StorageError::InvalidTransition {
                status: AuditStatus::Analyzing,
                ..
            })
        ));
        assert_eq!(store.load_audit("a1").unwrap().pages_discovered, 4);
    }

    #[test]
    fn test_get_page() {
        let (_dir, store) = store();
        store
            .create_audit(&LocalAudit::new("a1", "http://s/", AuditConfig::default()))
            .unwrap();
        store.add_page_analysis("a1", scored("http://s/x", 50.0)).unwrap();

        assert_eq!(store.get_page("a1", "http://s/x").unwrap().url(), "http://s/x");
        assert!(matches!(
            store.get_page("a1", "http://s/missing"),
            Err(StorageError::PageNotFound { .. })
        ));
    }

    #[test]
    fn test_list_skips_corrupt_files() {
        let (_dir, store) = store();
        store
            .create_audit(&LocalAudit::new("a1", "http://s/", AuditConfig::default()))
            .unwrap();
        store
            .create_audit(&LocalAudit::new("a2", "http://t/", AuditConfig::default()))
            .unwrap();
        fs::write(store.dir().join("broken.json"), "{ not json").unwrap();
        fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        let audits = store.list_audits().unwrap();
        assert_eq!(audits.len(), 2);
    }

    #[test]
    fn test_delete_audit() {
        let (_dir, store) = store();
        store
            .create_audit(&LocalAudit::new("a1", "http://s/", AuditConfig::default()))
            .unwrap();

        store.delete_audit("a1").unwrap();
        assert!(matches!(
            store.load_audit("a1"),
            Err(StorageError::AuditNotFound(_))
        ));
        assert!(matches!(
            store.delete_audit("a1"),
            Err(StorageError::AuditNotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_upserts_are_serialized() {
        let (_dir, store) = store();
        let store = Arc::new(store);
        store
            .create_audit(&LocalAudit::new("a1", "http://s/", AuditConfig::default()))
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .add_page_analysis("a1", scored(&format!("http://s/{}", i), 50.0))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.load_audit("a1").unwrap().pages.len(), 8);
    }
}

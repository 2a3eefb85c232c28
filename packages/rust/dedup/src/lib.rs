//! Durable article deduplication store.
//!
//! The store owns an append-only text log (one identifier per line, no
//! header, no checksum) and an in-memory membership set replayed from it at
//! startup. Records are never deleted or updated: an identifier is either
//! *unseen* or *committed*, and the only transition is [`DedupStore::commit`].
//!
//! Membership checks and commits are serialized through a single internal
//! mutex so overlapping batch runs cannot interleave a read-then-write race
//! on the same identifier. A commit I/O failure leaves the in-memory set
//! unchanged, so the article is reprocessed later rather than silently lost.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::info;

use articlesync_shared::{ArticleSyncError, Result};

/// Durable set of processed article identifiers.
pub struct DedupStore {
    inner: Mutex<Inner>,
}

struct Inner {
    members: HashSet<String>,
    log: File,
    path: PathBuf,
}

impl DedupStore {
    /// Open the log at `path`, replaying every recorded identifier into the
    /// in-memory set. Creates the log (and parent directories) if absent.
    /// Called once per process lifetime.
    pub fn load(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ArticleSyncError::io(parent, e))?;
            }
        }

        let mut members = HashSet::new();
        if path.exists() {
            let file = File::open(path).map_err(|e| ArticleSyncError::io(path, e))?;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|e| ArticleSyncError::io(path, e))?;
                let sn = line.trim();
                if !sn.is_empty() {
                    members.insert(sn.to_string());
                }
            }
        }

        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ArticleSyncError::io(path, e))?;

        info!(
            path = %path.display(),
            records = members.len(),
            "dedup store loaded"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                members,
                log,
                path: path.to_path_buf(),
            }),
        })
    }

    /// O(1) membership test against the in-memory set.
    pub async fn is_member(&self, sn: &str) -> bool {
        self.inner.lock().await.members.contains(sn)
    }

    /// Record `sn` as processed: append to the log, flush, then add to the
    /// in-memory set, as one critical section. Returns `true` when a new
    /// record was written, `false` when `sn` was already committed.
    ///
    /// On I/O failure the set is left without `sn`, so future runs reprocess
    /// the article instead of losing it.
    pub async fn commit(&self, sn: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;

        if inner.members.contains(sn) {
            return Ok(false);
        }

        let path = inner.path.clone();
        writeln!(inner.log, "{sn}").map_err(|e| ArticleSyncError::io(&path, e))?;
        inner.log.flush().map_err(|e| ArticleSyncError::io(&path, e))?;

        inner.members.insert(sn.to_string());
        Ok(true)
    }

    /// Number of committed identifiers.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.members.len()
    }

    /// Whether no identifiers have been committed.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_log_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("as_dedup_test_{}", Uuid::now_v7()))
            .join("processed_sn.log")
    }

    #[tokio::test]
    async fn load_creates_missing_log() {
        let path = temp_log_path();
        let store = DedupStore::load(&path).expect("load");
        assert!(path.exists());
        assert!(store.is_empty().await);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn commit_then_member() {
        let path = temp_log_path();
        let store = DedupStore::load(&path).unwrap();

        assert!(!store.is_member("SN001").await);
        assert!(store.commit("SN001").await.expect("commit"));
        assert!(store.is_member("SN001").await);
        assert_eq!(store.len().await, 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn duplicate_commit_is_a_noop() {
        let path = temp_log_path();
        let store = DedupStore::load(&path).unwrap();

        assert!(store.commit("SN001").await.unwrap());
        assert!(!store.commit("SN001").await.unwrap());

        // Exactly one line in the log.
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn membership_survives_reload() {
        let path = temp_log_path();
        {
            let store = DedupStore::load(&path).unwrap();
            store.commit("SN001").await.unwrap();
            store.commit("SN002").await.unwrap();
        }

        // Simulated restart: replay the same log.
        let reloaded = DedupStore::load(&path).unwrap();
        assert!(reloaded.is_member("SN001").await);
        assert!(reloaded.is_member("SN002").await);
        assert!(!reloaded.is_member("SN003").await);
        assert_eq!(reloaded.len().await, 2);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn reload_ignores_blank_lines() {
        let path = temp_log_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "SN001\n\n  \nSN002\n").unwrap();

        let store = DedupStore::load(&path).unwrap();
        assert_eq!(store.len().await, 2);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn concurrent_commits_write_once() {
        let path = temp_log_path();
        let store = std::sync::Arc::new(DedupStore::load(&path).unwrap());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.commit("SN_RACE").await.unwrap()
            }));
        }

        let mut wrote = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wrote += 1;
            }
        }
        assert_eq!(wrote, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}

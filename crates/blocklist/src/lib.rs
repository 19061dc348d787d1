//! On-disk JSON blocklist store: `{"domains": [...], "ips": [...]}`,
//! read-modify-written with stable key ordering on every update.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum BlocklistError {
    #[error("io error writing blocklist: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BlocklistDocument {
    #[serde(default)]
    domains: BTreeSet<String>,
    #[serde(default)]
    ips: BTreeSet<String>,
}

/// Serializes concurrent `block_*` writes against a single JSON file.
///
/// Concurrency is handled with a single in-process lock held for the whole
/// read-modify-write window -- simpler than an OS file lock or a
/// compare-and-swap retry loop, and sufficient for a single-process store.
pub struct BlocklistStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl BlocklistStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> BlocklistDocument {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default()
    }

    fn write(&self, doc: &BlocklistDocument) -> Result<(), BlocklistError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut body = serde_json::to_string_pretty(doc)?;
        body.push('\n');
        std::fs::write(&self.path, body)?;
        Ok(())
    }

    /// Add a lowercased domain to the blocklist.
    #[instrument(skip(self), fields(%domain))]
    pub async fn block_domain(&self, domain: &str) -> Result<(), BlocklistError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read();
        doc.domains.insert(domain.to_lowercase());
        self.write(&doc)
    }

    /// Add an IP to the blocklist.
    #[instrument(skip(self), fields(%ip))]
    pub async fn block_ip(&self, ip: &str) -> Result<(), BlocklistError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read();
        doc.ips.insert(ip.to_string());
        self.write(&doc)
    }

    /// Snapshot the current blocklist contents.
    pub async fn snapshot(&self) -> (Vec<String>, Vec<String>) {
        let _guard = self.lock.lock().await;
        let doc = self.read();
        (doc.domains.into_iter().collect(), doc.ips.into_iter().collect())
    }
}

impl From<serde_json::Error> for BlocklistError {
    fn from(e: serde_json::Error) -> Self {
        BlocklistError::Io(std::io::Error::other(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn block_domain_persists_lowercased_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocklist.json");
        let store = BlocklistStore::new(&path);

        store.block_domain("Evil.Example.com").await.unwrap();
        store.block_domain("aaa.example.com").await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with('\n'));
        let (domains, _) = store.snapshot().await;
        assert_eq!(domains, vec!["aaa.example.com", "evil.example.com"]);
    }

    #[tokio::test]
    async fn missing_file_starts_empty_and_is_created_on_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("blocklist.json");
        let store = BlocklistStore::new(&path);

        let (domains, ips) = store.snapshot().await;
        assert!(domains.is_empty() && ips.is_empty());

        store.block_ip("203.0.113.9").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn unparseable_existing_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocklist.json");
        std::fs::write(&path, "not json").unwrap();
        let store = BlocklistStore::new(&path);

        store.block_ip("203.0.113.9").await.unwrap();
        let (_, ips) = store.snapshot().await;
        assert_eq!(ips, vec!["203.0.113.9"]);
    }
}

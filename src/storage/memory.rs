//! In-memory document store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::allowlist::AllowlistDocument;
use crate::storage::{DocumentStore, StoreError, StoreResult, Versioned};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Versioned<AllowlistDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document at version 1.
    pub fn with_document(document: AllowlistDocument) -> Self {
        Self {
            inner: RwLock::new(Versioned {
                version: 1,
                data: document,
            }),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self) -> StoreResult<Versioned<AllowlistDocument>> {
        Ok(self.inner.read().await.clone())
    }

    async fn write(&self, document: &AllowlistDocument, expected_version: u64) -> StoreResult<u64> {
        let mut current = self.inner.write().await;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                expected: expected_version,
                actual: current.version,
            });
        }
        current.version += 1;
        current.data = document.clone();
        Ok(current.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_reads_version_zero() {
        let store = MemoryStore::new();
        let current = store.read().await.unwrap();
        assert_eq!(current.version, 0);
        assert!(current.data.host_to_pattern.is_empty());
        assert!(current.data.error_page.is_none());
    }

    #[tokio::test]
    async fn test_stale_writers_only_one_wins() {
        let store = MemoryStore::new();
        let first = store.read().await.unwrap();
        let second = store.read().await.unwrap();

        let mut doc_a = first.data.clone();
        doc_a.error_page = Some("https://a.example/error".into());
        let mut doc_b = second.data.clone();
        doc_b.error_page = Some("https://b.example/error".into());

        assert_eq!(store.write(&doc_a, first.version).await.unwrap(), 1);
        let err = store.write(&doc_b, second.version).await.unwrap_err();
        assert!(err.is_conflict());

        let stored = store.read().await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.data.error_page.as_deref(), Some("https://a.example/error"));
    }

    #[tokio::test]
    async fn test_concurrent_writes_at_same_version() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let base = store.read().await.unwrap();
        let version = base.version;

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let mut doc = base.data.clone();
            doc.error_page = Some(format!("https://example.com/{}", i));
            handles.push(tokio::spawn(async move { store.write(&doc, version).await }));
        }

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) if e.is_conflict() => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 7);
    }
}

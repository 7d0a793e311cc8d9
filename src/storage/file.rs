//! JSON file document store.
//!
//! The file holds the document plus a `version` field:
//! `{ "version": 3, "hostToPattern": {...}, "errorPage": "..." }`.
//! Writes within the process are serialized; the file is replaced through a
//! temporary file and a rename so readers never observe a partial write.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::allowlist::AllowlistDocument;
use crate::storage::{DocumentStore, StoreError, StoreResult, Versioned};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredDocument {
    #[serde(default)]
    version: u64,

    #[serde(flatten)]
    document: AllowlistDocument,
}

pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<StoredDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredDocument::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn read(&self) -> StoreResult<Versioned<AllowlistDocument>> {
        let stored = self.load().await?;
        Ok(Versioned {
            version: stored.version,
            data: stored.document,
        })
    }

    async fn write(&self, document: &AllowlistDocument, expected_version: u64) -> StoreResult<u64> {
        let _guard = self.write_lock.lock().await;

        let current = self.load().await?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                expected: expected_version,
                actual: current.version,
            });
        }

        let next = StoredDocument {
            version: current.version + 1,
            document: document.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&next)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = ?self.path, version = next.version, "Allowlist document written");
        Ok(next.version)
    }
}

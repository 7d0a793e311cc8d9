//! Allowlist document storage.
//!
//! # Data Flow
//! ```text
//! Admin PUT:
//!     read() → Versioned { version: n, data }
//!     → modify data
//!     → write(data, expected_version = n)
//!         ok       → version n + 1
//!         conflict → StoreError::Conflict (caller answers 409, no retry)
//!
//! Redirect:
//!     AllowlistCache → read() on miss/expiry
//! ```
//!
//! # Design Decisions
//! - Optimistic concurrency: every write names the version it was based on
//! - A store that has never been written reads as an empty document, version 0
//! - Backends: in-memory (tests, single process) and a JSON file on disk

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::allowlist::AllowlistDocument;

pub use file::FileStore;
pub use memory::MemoryStore;

/// A value tagged with the store version it was read at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub data: T,
}

/// Errors raised by document stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer got there first.
    #[error("version conflict: expected {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value document store holding the single allowlist document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the current document and its version.
    async fn read(&self) -> StoreResult<Versioned<AllowlistDocument>>;

    /// Replace the document if the stored version still equals
    /// `expected_version`. Returns the new version.
    async fn write(&self, document: &AllowlistDocument, expected_version: u64) -> StoreResult<u64>;
}

//! Process-local caches for the redirect path.

use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::allowlist::AllowlistDocument;
use crate::codes::ErrorCode;
use crate::observability::metrics;
use crate::storage::DocumentStore;
use crate::tenant::ErrorPageSource;

struct Cached<T> {
    value: T,
    loaded_at: Instant,
    generation: u64,
}

impl<T> Cached<T> {
    fn new(value: T, generation: u64) -> Self {
        Self {
            value,
            loaded_at: Instant::now(),
            generation,
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at.elapsed() < ttl
    }
}

/// Caches the allowlist document for `ttl`. Cleared on every successful
/// admin write.
///
/// `generation` is bumped by [`AllowlistCache::invalidate`]. An entry loaded
/// by a read that started before the bump is never served.
pub struct AllowlistCache {
    slot: ArcSwapOption<Cached<Arc<AllowlistDocument>>>,
    generation: AtomicU64,
    ttl: Duration,
}

impl AllowlistCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
            ttl,
        }
    }

    /// Cached document, reading through `store` on miss or expiry.
    ///
    /// A failed read yields an empty document that is not cached, so every
    /// state resolves as an unknown host until the store recovers.
    pub async fn get(&self, store: &dyn DocumentStore) -> Arc<AllowlistDocument> {
        let generation = self.generation.load(Ordering::Acquire);
        if let Some(cached) = self.slot.load_full() {
            if cached.is_fresh(self.ttl) && cached.generation == generation {
                metrics::record_cache_lookup("allowlist", true);
                return Arc::clone(&cached.value);
            }
        }
        metrics::record_cache_lookup("allowlist", false);

        match store.read().await {
            Ok(versioned) => {
                tracing::debug!(version = versioned.version, "Loaded allowlist from storage");
                let document = Arc::new(versioned.data);
                self.slot
                    .store(Some(Arc::new(Cached::new(Arc::clone(&document), generation))));
                document
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read allowlist from storage");
                Arc::new(AllowlistDocument::default())
            }
        }
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.slot.store(None);
    }
}

/// Caches the tenant's error page when the allowlist document has none.
///
/// Only found pages are cached; "not configured" and lookup failures are
/// retried on the next request.
pub struct ErrorPageCache {
    source: Option<Arc<dyn ErrorPageSource>>,
    slot: ArcSwapOption<Cached<String>>,
    ttl: Duration,
}

impl ErrorPageCache {
    pub fn new(source: Option<Arc<dyn ErrorPageSource>>, ttl: Duration) -> Self {
        Self {
            source,
            slot: ArcSwapOption::empty(),
            ttl,
        }
    }

    /// A cache that never consults a tenant.
    pub fn disabled() -> Self {
        Self::new(None, Duration::ZERO)
    }

    pub async fn get(&self) -> Option<String> {
        let source = self.source.as_ref()?;

        if let Some(cached) = self.slot.load_full() {
            if cached.is_fresh(self.ttl) {
                metrics::record_cache_lookup("error_page", true);
                return Some(cached.value.clone());
            }
        }
        metrics::record_cache_lookup("error_page", false);

        match source.error_page().await {
            Ok(Some(page)) => {
                self.slot.store(Some(Arc::new(Cached::new(page.clone(), 0))));
                Some(page)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(
                    error_code = %ErrorCode::FailedFetchingErrorPage,
                    error = %e,
                    "Failed fetching tenant error page"
                );
                None
            }
        }
    }

    pub fn invalidate(&self) {
        self.slot.store(None);
    }
}

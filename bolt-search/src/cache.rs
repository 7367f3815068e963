//! In-memory cache for ranked search results.
//!
//! Caches the final merged, truncated result list keyed by the
//! (query terms, limit) pair. Uses [`moka`] for async-friendly caching with
//! a TTL and bounded capacity. The cache is an opt-in side concern: the
//! merge algorithm never reads or writes it.
//!
//! A [`ResultCache`] is cheap to clone; clones share storage, so the
//! ingestion gatekeeper can invalidate what the orchestrator filled.

use std::time::Duration;

use moka::future::Cache;

use crate::types::Document;

/// Composite cache key: the distinct query terms in order plus the limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    terms: Vec<String>,
    limit: usize,
}

impl CacheKey {
    /// Build a key from already-split query terms.
    ///
    /// Terms are used verbatim: case folding and stemming belong to the
    /// term index, so `Cat` and `cat` may legitimately rank differently.
    pub fn new(terms: &[String], limit: usize) -> Self {
        Self {
            terms: terms.to_vec(),
            limit,
        }
    }
}

/// Shared cache of ranked results.
#[derive(Clone)]
pub struct ResultCache {
    inner: Cache<CacheKey, Vec<Document>>,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl ResultCache {
    /// Create a cache holding at most `capacity` result sets for `ttl`.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Look up cached results. Returns `None` on a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<Document>> {
        self.inner.get(key).await
    }

    /// Store ranked results.
    pub async fn insert(&self, key: CacheKey, results: Vec<Document>) {
        self.inner.insert(key, results).await;
    }

    /// Drop every cached result set.
    ///
    /// Called after a document is accepted so later searches see it.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

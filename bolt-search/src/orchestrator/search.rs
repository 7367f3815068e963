//! Core search orchestrator: concurrent per-term fan-out, merge, rank.
//!
//! Splits the query into distinct terms, looks each one up in its own
//! task, merges the candidate lists, and truncates to the caller's limit.
//! A single failed term fails the whole search.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache::{CacheKey, ResultCache};
use crate::config::SearchConfig;
use crate::error::{LookupFailure, LookupFailureReason, SearchError};
use crate::lookup::{TermIndex, TermLookupClient};
use crate::types::{Document, TermCandidateList};

use super::merge::merge;
use super::query::split_terms;

/// Drives one search end to end against a [`TermIndex`].
#[derive(Debug)]
pub struct SearchOrchestrator<I> {
    client: TermLookupClient<I>,
    config: SearchConfig,
    cache: Option<ResultCache>,
}

impl<I: TermIndex + 'static> SearchOrchestrator<I> {
    /// Build an orchestrator over `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn new(index: I, config: SearchConfig) -> Result<Self, SearchError> {
        Self::with_shared_index(Arc::new(index), config)
    }

    /// Build an orchestrator over an index that is also used elsewhere
    /// (for example a store that both answers lookups and ingests).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn with_shared_index(index: Arc<I>, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let cache = (config.cache_ttl_seconds > 0).then(|| {
            ResultCache::new(
                config.cache_capacity,
                std::time::Duration::from_secs(config.cache_ttl_seconds),
            )
        });
        Ok(Self {
            client: TermLookupClient::new(index, config.lookup_timeout()),
            config,
            cache,
        })
    }

    /// The result cache, if caching is enabled. Clones share storage.
    pub fn cache(&self) -> Option<ResultCache> {
        self.cache.clone()
    }

    /// The active configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search with the configured default limit.
    ///
    /// # Errors
    ///
    /// Same as [`SearchOrchestrator::search`].
    pub async fn search_default(&self, query: &str) -> Result<Vec<Document>, SearchError> {
        self.search(query, self.config.default_limit).await
    }

    /// Run a search.
    ///
    /// # Pipeline
    ///
    /// 1. Split `query` into distinct terms (blank query → `InvalidQuery`)
    /// 2. Serve from the result cache when enabled and warm
    /// 3. Spawn one bounded, timed lookup task per term
    /// 4. Fail on the first lookup failure observed
    /// 5. Restore query-term order and merge-rank the candidate lists
    /// 6. Truncate to `limit`
    ///
    /// An empty ranking is a successful, empty result.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] for a blank query and
    /// [`SearchError::Failure`] wrapping the first failed term lookup. No
    /// partial ranking is ever returned.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Document>, SearchError> {
        let terms = split_terms(query)?;
        if limit == 0 {
            tracing::debug!("zero limit requested, skipping lookups");
            return Ok(Vec::new());
        }

        let key = CacheKey::new(&terms, limit);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key).await {
                tracing::debug!(count = hit.len(), "search served from cache");
                return Ok(hit);
            }
        }

        tracing::trace!(?terms, limit, "starting search");
        let lists = self.fan_out(&terms, limit).await?;
        let ranked = merge(&lists, limit);

        if ranked.is_empty() {
            tracing::debug!(term_count = terms.len(), "search matched no documents");
        } else {
            tracing::debug!(
                term_count = terms.len(),
                count = ranked.len(),
                "search complete"
            );
        }

        if let Some(cache) = &self.cache {
            cache.insert(key, ranked.clone()).await;
        }
        Ok(ranked)
    }

    /// Look every term up concurrently, returning lists in term order.
    async fn fan_out(
        &self,
        terms: &[String],
        limit: usize,
    ) -> Result<Vec<TermCandidateList>, SearchError> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_lookups));
        let mut join_set = JoinSet::new();

        for (position, term) in terms.iter().enumerate() {
            let client = self.client.clone();
            let permits = Arc::clone(&permits);
            let term = term.clone();

            join_set.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => client.lookup(&term, limit).await,
                    Err(_) => Err(LookupFailure::new(
                        term,
                        LookupFailureReason::Unreachable("lookup pool closed".into()),
                    )),
                };
                (position, outcome)
            });
        }

        let mut slots: Vec<Option<TermCandidateList>> = terms.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (position, outcome) = joined
                .map_err(|e| SearchError::Runtime(format!("lookup task failed: {e}")))?;
            match outcome {
                Ok(list) => slots[position] = Some(list),
                Err(failure) => {
                    tracing::warn!(
                        backend = self.client.index().name(),
                        error = %failure.reason,
                        "term lookup failed, abandoning search"
                    );
                    // Dropping the join set aborts the stragglers.
                    return Err(SearchError::Failure(failure));
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

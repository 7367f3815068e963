//! # bolt-search
//!
//! Search orchestration core for Bolt, a question/answer search engine.
//!
//! A query is split into terms, each term is looked up concurrently in a
//! term index collaborator, and the per-term candidate lists are merged
//! into a single ranking. A companion gatekeeper accepts uploaded
//! documents and reports duplicates without treating them as errors.
//!
//! ## Design
//!
//! - One bounded, timed lookup task per distinct term
//! - Fail-fast: one failed term fails the whole search, no partial results
//! - Deterministic merge-rank: occurrence, then aggregate score, then
//!   creation date, then `Id`
//! - Pluggable collaborators: spawned scripts, HTTP services, or an
//!   in-memory store
//! - Optional in-memory result cache, invalidated on accepted uploads
//!
//! ## Security
//!
//! - No network listeners; this is a library, not a server
//! - Query terms are logged only at trace level

pub mod backends;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod ingest;
pub mod lookup;
pub mod orchestrator;
pub mod types;

pub use backends::{IngestionBackend, MemoryStore, TermIndexBackend};
pub use config::{IngestConfig, SearchConfig};
pub use error::{IngestionFailure, LookupFailure, LookupFailureReason, Result, SearchError};
pub use ingest::{IngestionGatekeeper, IngestionService, StoreResponse};
pub use lookup::{TermIndex, TermLookupClient};
pub use orchestrator::SearchOrchestrator;
pub use types::{Document, DocumentId, IngestionOutcome, TermCandidateList};

/// Run one search against `index` without keeping an orchestrator around.
///
/// Builds a [`SearchOrchestrator`] with caching disabled, runs the query,
/// and drops it.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid `config`, otherwise the
/// same as [`SearchOrchestrator::search`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> bolt_search::Result<()> {
/// let store = bolt_search::MemoryStore::new();
/// let config = bolt_search::SearchConfig::default();
/// let results = bolt_search::search(store, "borrow checker", 10, config).await?;
/// for document in &results {
///     println!("{}: {}", document.id, document.title);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search<I: TermIndex + 'static>(
    index: I,
    query: &str,
    limit: usize,
    config: SearchConfig,
) -> Result<Vec<Document>> {
    let config = SearchConfig {
        cache_ttl_seconds: 0,
        ..config
    };
    SearchOrchestrator::new(index, config)?
        .search(query, limit)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_doc(id: i64, title: &str) -> Document {
        Document {
            id: DocumentId::Number(id),
            title: title.into(),
            body: String::new(),
            tag: String::new(),
            answer: String::new(),
            score: 1.0,
            creation_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn search_validates_config_zero_concurrency() {
        let config = SearchConfig {
            max_concurrent_lookups: 0,
            ..Default::default()
        };
        let result = search(MemoryStore::new(), "test", 5, config).await;
        assert!(result.unwrap_err().to_string().contains("max_concurrent_lookups"));
    }

    #[tokio::test]
    async fn search_validates_config_zero_timeout() {
        let config = SearchConfig {
            lookup_timeout_ms: 0,
            ..Default::default()
        };
        let result = search(MemoryStore::new(), "test", 5, config).await;
        assert!(result.unwrap_err().to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn search_ranks_overlap_first() {
        let store = MemoryStore::with_documents([
            make_doc(1, "rust borrow checker"),
            make_doc(2, "rust macros"),
            make_doc(3, "borrow money"),
        ]);
        let results = search(store, "rust borrow", 10, SearchConfig::default())
            .await
            .expect("ok");
        assert_eq!(results[0].id, DocumentId::Number(1));
        assert_eq!(results.len(), 3);
    }
}

//! Term lookup: the pluggable term index seam and the client that fronts it.
//!
//! Each backend (spawned script, HTTP service, in-memory store) implements
//! [`TermIndex`]. The orchestrator never calls a backend directly; it goes
//! through [`TermLookupClient`], which validates input and bounds every
//! call with a timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LookupFailure, LookupFailureReason};
use crate::types::{Document, TermCandidateList};

/// A term index collaborator.
///
/// Implementors answer "which documents match this single term", returning
/// documents that already carry a `Score`. All implementations must be
/// `Send + Sync` so lookups for distinct terms can run concurrently.
pub trait TermIndex: Send + Sync {
    /// Look up one term, returning at most roughly `limit` scored candidates.
    ///
    /// # Errors
    ///
    /// Returns [`LookupFailure`] if the collaborator is unreachable, answers
    /// with malformed output, or reports an error of its own.
    fn lookup(
        &self,
        term: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Document>, LookupFailure>> + Send;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Stateless, cloneable front for a [`TermIndex`].
///
/// Cloning shares the underlying index, so each concurrent lookup task can
/// own its own handle.
#[derive(Debug)]
pub struct TermLookupClient<I> {
    index: Arc<I>,
    timeout: Duration,
}

impl<I> Clone for TermLookupClient<I> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            timeout: self.timeout,
        }
    }
}

impl<I: TermIndex> TermLookupClient<I> {
    /// Wrap `index`, bounding each lookup by `timeout`.
    pub fn new(index: Arc<I>, timeout: Duration) -> Self {
        Self { index, timeout }
    }

    /// The wrapped index.
    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    /// Look up `term`, returning its candidate list.
    ///
    /// # Errors
    ///
    /// Returns [`LookupFailure`] carrying `term` when the input is invalid,
    /// the collaborator fails, or the timeout elapses first.
    pub async fn lookup(&self, term: &str, limit: usize) -> Result<TermCandidateList, LookupFailure> {
        if term.trim().is_empty() || term.contains(char::is_whitespace) {
            return Err(LookupFailure::new(
                term,
                LookupFailureReason::Malformed("term must be a single non-empty token".into()),
            ));
        }
        if limit == 0 {
            return Err(LookupFailure::new(
                term,
                LookupFailureReason::Malformed("limit must be greater than 0".into()),
            ));
        }

        tracing::trace!(backend = self.index.name(), term, limit, "term lookup");
        match tokio::time::timeout(self.timeout, self.index.lookup(term, limit)).await {
            Ok(Ok(documents)) => {
                tracing::debug!(
                    backend = self.index.name(),
                    count = documents.len(),
                    "term lookup returned candidates"
                );
                Ok(TermCandidateList::new(term, documents))
            }
            Ok(Err(failure)) => Err(failure),
            Err(_) => Err(LookupFailure::new(
                term,
                LookupFailureReason::Timeout {
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                },
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentId;
    use chrono::{TimeZone, Utc};

    /// A mock index for testing trait bounds and the timeout wrapper.
    struct MockIndex {
        documents: Vec<Document>,
        delay: Duration,
        fail: bool,
    }

    impl MockIndex {
        fn new(documents: Vec<Document>) -> Self {
            Self {
                documents,
                delay: Duration::ZERO,
                fail: false,
            }
        }
    }

    impl TermIndex for MockIndex {
        async fn lookup(&self, term: &str, _limit: usize) -> Result<Vec<Document>, LookupFailure> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(LookupFailure::new(
                    term,
                    LookupFailureReason::Unreachable("mock index down".into()),
                ));
            }
            Ok(self.documents.clone())
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    fn doc(id: i64) -> Document {
        Document {
            id: DocumentId::Number(id),
            title: format!("Doc {id}"),
            body: String::new(),
            tag: String::new(),
            answer: String::new(),
            score: 1.0,
            creation_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn client(index: MockIndex, timeout_ms: u64) -> TermLookupClient<MockIndex> {
        TermLookupClient::new(Arc::new(index), Duration::from_millis(timeout_ms))
    }

    #[test]
    fn mock_index_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockIndex>();
        assert_send_sync::<TermLookupClient<MockIndex>>();
    }

    #[tokio::test]
    async fn lookup_wraps_documents_with_term() {
        let client = client(MockIndex::new(vec![doc(1), doc(2)]), 1_000);
        let list = client.lookup("cat", 5).await.expect("should succeed");
        assert_eq!(list.term, "cat");
        assert_eq!(list.documents.len(), 2);
    }

    #[tokio::test]
    async fn lookup_propagates_backend_failure() {
        let mut index = MockIndex::new(vec![]);
        index.fail = true;
        let err = client(index, 1_000).lookup("dog", 5).await.unwrap_err();
        assert_eq!(err.term, "dog");
        assert!(matches!(err.reason, LookupFailureReason::Unreachable(_)));
    }

    #[tokio::test]
    async fn lookup_times_out() {
        let mut index = MockIndex::new(vec![doc(1)]);
        index.delay = Duration::from_secs(10);
        let err = client(index, 20).lookup("slow", 5).await.unwrap_err();
        assert_eq!(err.term, "slow");
        assert_eq!(err.reason, LookupFailureReason::Timeout { timeout_ms: 20 });
    }

    #[tokio::test]
    async fn empty_term_rejected_before_call() {
        let mut index = MockIndex::new(vec![]);
        index.fail = true;
        let err = client(index, 1_000).lookup("  ", 5).await.unwrap_err();
        assert!(matches!(err.reason, LookupFailureReason::Malformed(_)));
    }

    #[tokio::test]
    async fn multi_word_term_rejected() {
        let err = client(MockIndex::new(vec![]), 1_000)
            .lookup("cat dog", 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("single non-empty token"));
    }

    #[tokio::test]
    async fn zero_limit_rejected() {
        let err = client(MockIndex::new(vec![doc(1)]), 1_000)
            .lookup("cat", 0)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn clone_shares_index() {
        let client = client(MockIndex::new(vec![]), 1_000);
        let cloned = client.clone();
        assert!(Arc::ptr_eq(client.index(), cloned.index()));
    }
}

//! Idempotent document ingestion.
//!
//! The gatekeeper keeps no record of known `Id`s. Identity conflicts are
//! detected by the [`IngestionService`], which is the single source of
//! truth for uniqueness; the gatekeeper maps its answer onto an
//! [`IngestionOutcome`]. A duplicate `Id` is an ordinary outcome, never an
//! [`IngestionFailure`].

use std::future::Future;
use std::sync::Arc;

use crate::cache::ResultCache;
use crate::config::IngestConfig;
use crate::error::{IngestionFailure, SearchError};
use crate::types::{Document, IngestionOutcome};

/// What the ingestion service did with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreResponse {
    /// The document was newly stored.
    Stored,
    /// A document with the same `Id` already exists; nothing was written.
    AlreadyExists,
}

/// An ingestion service collaborator.
///
/// Implementations must perform the identity check and the insert as one
/// step from the caller's point of view.
pub trait IngestionService: Send + Sync {
    /// Store `document` unless its `Id` is already present.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionFailure`] only for transport or process faults.
    fn store(
        &self,
        document: &Document,
    ) -> impl Future<Output = Result<StoreResponse, IngestionFailure>> + Send;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Accepts uploads and reports accepted vs. conflict.
#[derive(Debug)]
pub struct IngestionGatekeeper<S> {
    service: Arc<S>,
    config: IngestConfig,
    cache: Option<ResultCache>,
}

impl<S: IngestionService> IngestionGatekeeper<S> {
    /// Build a gatekeeper over `service`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn new(service: S, config: IngestConfig) -> Result<Self, SearchError> {
        Self::with_shared_service(Arc::new(service), config)
    }

    /// Build a gatekeeper over a service that is also used elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn with_shared_service(service: Arc<S>, config: IngestConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            service,
            config,
            cache: None,
        })
    }

    /// Invalidate `cache` whenever a document is accepted.
    pub fn with_cache(mut self, cache: Option<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Ingest one parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionFailure`] if the service cannot be reached,
    /// answers unintelligibly, or exceeds the configured timeout.
    pub async fn ingest(&self, document: Document) -> Result<IngestionOutcome, IngestionFailure> {
        let id = document.id.clone();
        let response = tokio::time::timeout(self.config.timeout(), self.service.store(&document))
            .await
            .map_err(|_| IngestionFailure::Timeout {
                timeout_ms: self.config.timeout_ms,
            })?
            .inspect_err(|err| {
                tracing::warn!(backend = self.service.name(), %id, error = %err, "ingestion failed");
            })?;

        match response {
            StoreResponse::Stored => {
                tracing::info!(backend = self.service.name(), %id, "document accepted");
                if let Some(cache) = &self.cache {
                    cache.invalidate_all();
                }
                Ok(IngestionOutcome::accepted())
            }
            StoreResponse::AlreadyExists => {
                tracing::info!(backend = self.service.name(), %id, "document already exists");
                Ok(IngestionOutcome::conflict(id))
            }
        }
    }

    /// Ingest one document given as raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionFailure::InvalidDocument`] if the bytes are not a
    /// valid document, otherwise the same as [`IngestionGatekeeper::ingest`].
    pub async fn ingest_bytes(&self, raw: &[u8]) -> Result<IngestionOutcome, IngestionFailure> {
        let document: Document = serde_json::from_slice(raw)
            .map_err(|e| IngestionFailure::InvalidDocument(e.to_string()))?;
        self.ingest(document).await
    }

    /// Ingest an upload file's contents: one document or a JSON array.
    ///
    /// Documents are submitted one after another, in file order, so a
    /// repeated `Id` inside the same upload resolves deterministically.
    /// Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Same as [`IngestionGatekeeper::ingest_bytes`].
    pub async fn ingest_upload(&self, raw: &[u8]) -> Result<Vec<IngestionOutcome>, IngestionFailure> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Upload {
            Many(Vec<Document>),
            One(Box<Document>),
        }

        let documents = match serde_json::from_slice::<Upload>(raw)
            .map_err(|e| IngestionFailure::InvalidDocument(e.to_string()))?
        {
            Upload::Many(documents) => documents,
            Upload::One(document) => vec![*document],
        };

        let mut outcomes = Vec::with_capacity(documents.len());
        for document in documents {
            outcomes.push(self.ingest(document).await?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentId;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Stores ids in a set; optionally fails or stalls.
    #[derive(Default)]
    struct MockService {
        ids: Mutex<HashSet<DocumentId>>,
        fail: bool,
        stall: bool,
    }

    impl IngestionService for MockService {
        async fn store(&self, document: &Document) -> Result<StoreResponse, IngestionFailure> {
            if self.stall {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            if self.fail {
                return Err(IngestionFailure::Unreachable("mock service down".into()));
            }
            let mut ids = self.ids.lock().await;
            if ids.insert(document.id.clone()) {
                Ok(StoreResponse::Stored)
            } else {
                Ok(StoreResponse::AlreadyExists)
            }
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    fn make_doc(id: i64) -> Document {
        Document {
            id: DocumentId::Number(id),
            title: "Upload".into(),
            body: String::new(),
            tag: String::new(),
            answer: String::new(),
            score: 0.0,
            creation_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn gatekeeper(service: MockService) -> IngestionGatekeeper<MockService> {
        IngestionGatekeeper::new(service, IngestConfig::default()).expect("valid")
    }

    #[tokio::test]
    async fn new_id_accepted_then_conflicts() {
        let gate = gatekeeper(MockService::default());
        let first = gate.ingest(make_doc(42)).await.expect("ok");
        assert_eq!(first, IngestionOutcome::accepted());

        let second = gate.ingest(make_doc(42)).await.expect("duplicate is not an error");
        assert_eq!(second, IngestionOutcome::conflict(DocumentId::Number(42)));
    }

    #[tokio::test]
    async fn transport_fault_is_failure() {
        let gate = gatekeeper(MockService {
            fail: true,
            ..Default::default()
        });
        let err = gate.ingest(make_doc(1)).await.unwrap_err();
        assert!(matches!(err, IngestionFailure::Unreachable(_)));
    }

    #[tokio::test]
    async fn stalled_service_times_out() {
        let service = MockService {
            stall: true,
            ..Default::default()
        };
        let gate = IngestionGatekeeper::new(service, IngestConfig { timeout_ms: 20 }).expect("valid");
        let err = gate.ingest(make_doc(1)).await.unwrap_err();
        assert!(matches!(err, IngestionFailure::Timeout { timeout_ms: 20 }));
    }

    #[tokio::test]
    async fn invalid_bytes_rejected() {
        let gate = gatekeeper(MockService::default());
        let err = gate.ingest_bytes(b"{not json").await.unwrap_err();
        assert!(matches!(err, IngestionFailure::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn bytes_with_string_id_accepted() {
        let gate = gatekeeper(MockService::default());
        let outcome = gate
            .ingest_bytes(br#"{"Id": "42", "Title": "t", "Score": 1, "CreationDate": "2024-01-01"}"#)
            .await
            .expect("ok");
        assert!(outcome.accepted);

        let again = gate.ingest(make_doc(42)).await.expect("ok");
        assert_eq!(again.conflict, Some(DocumentId::Number(42)));
    }

    #[tokio::test]
    async fn upload_array_processed_in_order() {
        let gate = gatekeeper(MockService::default());
        let raw = br#"[
            {"Id": 1, "CreationDate": "2024-01-01"},
            {"Id": 2, "CreationDate": "2024-01-02"},
            {"Id": 1, "CreationDate": "2024-01-03"}
        ]"#;
        let outcomes = gate.ingest_upload(raw).await.expect("ok");
        assert_eq!(
            outcomes,
            vec![
                IngestionOutcome::accepted(),
                IngestionOutcome::accepted(),
                IngestionOutcome::conflict(DocumentId::Number(1)),
            ]
        );
    }

    #[tokio::test]
    async fn upload_single_object_accepted() {
        let gate = gatekeeper(MockService::default());
        let outcomes = gate
            .ingest_upload(br#"{"Id": 5, "CreationDate": "2024-01-01"}"#)
            .await
            .expect("ok");
        assert_eq!(outcomes, vec![IngestionOutcome::accepted()]);
    }

    #[tokio::test]
    async fn accepted_document_invalidates_cache() {
        let cache = ResultCache::new(10, Duration::from_secs(60));
        let key = crate::cache::CacheKey::new(&["cat".to_string()], 5);
        cache.insert(key.clone(), vec![make_doc(9)]).await;

        let gate = gatekeeper(MockService::default()).with_cache(Some(cache.clone()));
        gate.ingest(make_doc(1)).await.expect("ok");
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn conflict_leaves_cache_warm() {
        let cache = ResultCache::new(10, Duration::from_secs(60));
        let gate = gatekeeper(MockService::default());
        gate.ingest(make_doc(1)).await.expect("ok");

        let gate = gate.with_cache(Some(cache.clone()));
        let key = crate::cache::CacheKey::new(&["cat".to_string()], 5);
        cache.insert(key.clone(), vec![make_doc(9)]).await;
        gate.ingest(make_doc(1)).await.expect("ok");
        assert!(cache.get(&key).await.is_some());
    }

    #[test]
    fn zero_timeout_config_rejected() {
        let result = IngestionGatekeeper::new(MockService::default(), IngestConfig { timeout_ms: 0 });
        assert!(matches!(result, Err(SearchError::Config(_))));
    }
}

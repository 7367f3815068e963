//! Service wiring: turn a [`BoltConfig`] into a ready orchestrator and
//! gatekeeper sharing one result cache.

use std::path::Path;
use std::sync::Arc;

use bolt_search::backends::{
    HttpIngestionService, HttpTermIndex, ProcessIngestionService, ProcessTermIndex,
};
use bolt_search::{
    Document, IngestionBackend, IngestionGatekeeper, IngestionOutcome, MemoryStore,
    SearchOrchestrator, TermIndexBackend,
};

use crate::config::{BackendConfig, BoltConfig};
use crate::error::Result;

/// The search orchestrator and ingestion gatekeeper for one configuration.
#[derive(Debug)]
pub struct Services {
    orchestrator: SearchOrchestrator<TermIndexBackend>,
    gatekeeper: IngestionGatekeeper<IngestionBackend>,
}

impl Services {
    /// Build both services from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a backend cannot
    /// be constructed.
    pub fn from_config(config: &BoltConfig) -> Result<Self> {
        config.validate()?;
        let (index, ingestion) = build_backends(config)?;

        let orchestrator = SearchOrchestrator::new(index, config.search.clone())?;
        let gatekeeper = IngestionGatekeeper::new(ingestion, config.ingest.clone())?
            .with_cache(orchestrator.cache());

        tracing::debug!(
            backend = config.backend.kind(),
            caching = orchestrator.cache().is_some(),
            "services ready"
        );
        Ok(Self {
            orchestrator,
            gatekeeper,
        })
    }

    /// Run a search, using the configured default limit when `limit` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank query or any failed term lookup.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<Document>> {
        let limit = limit.unwrap_or(self.orchestrator.config().default_limit);
        Ok(self.orchestrator.search(query, limit).await?)
    }

    /// Ingest every document in an upload file (one object or an array).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid document
    /// JSON, or the ingestion service fails.
    pub async fn ingest_file(&self, path: &Path) -> Result<Vec<IngestionOutcome>> {
        let raw = tokio::fs::read(path).await?;
        let outcomes = self.gatekeeper.ingest_upload(&raw).await?;
        let accepted = outcomes.iter().filter(|o| o.accepted).count();
        tracing::info!(
            path = %path.display(),
            accepted,
            conflicts = outcomes.len() - accepted,
            "upload processed"
        );
        Ok(outcomes)
    }

    /// The search orchestrator.
    pub fn orchestrator(&self) -> &SearchOrchestrator<TermIndexBackend> {
        &self.orchestrator
    }

    /// The ingestion gatekeeper.
    pub fn gatekeeper(&self) -> &IngestionGatekeeper<IngestionBackend> {
        &self.gatekeeper
    }
}

fn build_backends(config: &BoltConfig) -> Result<(TermIndexBackend, IngestionBackend)> {
    match &config.backend {
        BackendConfig::Memory => {
            let store = Arc::new(MemoryStore::new());
            Ok((
                TermIndexBackend::Memory(Arc::clone(&store)),
                IngestionBackend::Memory(store),
            ))
        }
        BackendConfig::Process {
            search,
            ingest,
            spool_dir,
        } => Ok((
            TermIndexBackend::Process(ProcessTermIndex::new(search.clone())),
            IngestionBackend::Process(ProcessIngestionService::new(
                ingest.clone(),
                spool_dir.clone(),
            )),
        )),
        BackendConfig::Http {
            base_url,
            ingest_url,
        } => {
            let timeout = config.search.lookup_timeout().max(config.ingest.timeout());
            let client = bolt_search::http::build_client(timeout)?;
            let index = HttpTermIndex::new(client.clone(), base_url)?;
            let ingestion =
                HttpIngestionService::new(client, ingest_url.as_deref().unwrap_or(base_url))?;
            Ok((
                TermIndexBackend::Http(index),
                IngestionBackend::Http(ingestion),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::error::BoltError;
    use bolt_search::{DocumentId, SearchError};

    const SEED: &str = r#"[
        {"Id": 1, "Title": "Cat nutrition", "Tag": "cat", "Score": 3, "CreationDate": "2024-01-01"},
        {"Id": 2, "Title": "Cat toys", "Score": 1, "CreationDate": "2024-01-02"},
        {"Id": 3, "Title": "Dog and cat friendship", "Score": 5, "CreationDate": "2024-01-03"}
    ]"#;

    fn seeded_services() -> (Services, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("seed.json"), SEED).expect("write seed");
        let services = Services::from_config(&BoltConfig::default()).expect("services");
        (services, dir)
    }

    #[tokio::test]
    async fn memory_backend_round_trip() {
        let (services, dir) = seeded_services();
        let outcomes = services
            .ingest_file(&dir.path().join("seed.json"))
            .await
            .expect("seed");
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.accepted));

        let results = services.search("cat dog", None).await.expect("search");
        assert_eq!(results[0].id, DocumentId::Number(3));
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn reingesting_file_reports_conflicts() {
        let (services, dir) = seeded_services();
        let path = dir.path().join("seed.json");
        services.ingest_file(&path).await.expect("seed");

        let again = services.ingest_file(&path).await.expect("re-ingest");
        assert!(again.iter().all(|o| !o.accepted));
        assert_eq!(again[0].conflict, Some(DocumentId::Number(1)));
    }

    #[tokio::test]
    async fn explicit_limit_overrides_default() {
        let (services, dir) = seeded_services();
        services
            .ingest_file(&dir.path().join("seed.json"))
            .await
            .expect("seed");
        let results = services.search("cat", Some(1)).await.expect("search");
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn blank_query_surfaces_invalid_query() {
        let (services, _dir) = seeded_services();
        let err = services.search("  ", None).await.unwrap_err();
        assert!(matches!(err, BoltError::Search(SearchError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn missing_upload_file_is_io_error() {
        let (services, dir) = seeded_services();
        let err = services
            .ingest_file(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, BoltError::Io(_)));
    }

    #[test]
    fn http_backend_rejects_bad_url() {
        let config = BoltConfig {
            backend: BackendConfig::Http {
                base_url: "not a url".into(),
                ingest_url: None,
            },
            ..Default::default()
        };
        let err = Services::from_config(&config).unwrap_err();
        assert!(matches!(err, BoltError::Search(SearchError::Config(_))));
    }

    #[test]
    fn process_backend_builds_without_spawning() {
        let command = bolt_search::backends::ProcessCommand::new("python3", vec!["x.py".into()]);
        let config = BoltConfig {
            backend: BackendConfig::Process {
                search: command.clone(),
                ingest: command,
                spool_dir: None,
            },
            ..Default::default()
        };
        let services = Services::from_config(&config).expect("services");
        assert!(services.orchestrator().cache().is_some());
    }
}

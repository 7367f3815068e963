//! Concrete collaborators for term lookup and ingestion.
//!
//! Each transport lives in its own module. [`TermIndexBackend`] and
//! [`IngestionBackend`] pick one at runtime so the host can choose from
//! configuration without making the orchestrator generic over it.

mod payload;

pub mod http;
pub mod memory;
pub mod process;

use std::sync::Arc;

pub use http::{HttpIngestionService, HttpTermIndex};
pub use memory::MemoryStore;
pub use process::{ProcessCommand, ProcessIngestionService, ProcessTermIndex};

use crate::error::{IngestionFailure, LookupFailure};
use crate::ingest::{IngestionService, StoreResponse};
use crate::lookup::TermIndex;
use crate::types::Document;

/// Term index selected at runtime.
#[derive(Debug, Clone)]
pub enum TermIndexBackend {
    /// Shared in-process store.
    Memory(Arc<MemoryStore>),
    /// One spawned process per term.
    Process(ProcessTermIndex),
    /// Remote HTTP service.
    Http(HttpTermIndex),
}

impl TermIndex for TermIndexBackend {
    async fn lookup(&self, term: &str, limit: usize) -> Result<Vec<Document>, LookupFailure> {
        match self {
            Self::Memory(store) => TermIndex::lookup(store.as_ref(), term, limit).await,
            Self::Process(index) => index.lookup(term, limit).await,
            Self::Http(index) => index.lookup(term, limit).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Process(_) => "process",
            Self::Http(_) => "http",
        }
    }
}

/// Ingestion service selected at runtime.
#[derive(Debug, Clone)]
pub enum IngestionBackend {
    /// Shared in-process store.
    Memory(Arc<MemoryStore>),
    /// One spawned process per document.
    Process(ProcessIngestionService),
    /// Remote HTTP service.
    Http(HttpIngestionService),
}

impl IngestionService for IngestionBackend {
    async fn store(&self, document: &Document) -> Result<StoreResponse, IngestionFailure> {
        match self {
            Self::Memory(store) => store.store(document).await,
            Self::Process(service) => service.store(document).await,
            Self::Http(service) => service.store(document).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Process(_) => "process",
            Self::Http(_) => "http",
        }
    }
}

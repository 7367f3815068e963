//! Ingestion gatekeeper: forwards uploads to the ingestion service and
//! reports whether each document was newly stored or already present.

pub mod gatekeeper;

pub use gatekeeper::{IngestionGatekeeper, IngestionService, StoreResponse};

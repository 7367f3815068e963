//! Error types for the bolt host.

use bolt_search::{IngestionFailure, SearchError};

/// Top-level error type for the bolt host.
#[derive(Debug, thiserror::Error)]
pub enum BoltError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Search error (invalid query, failed term lookup).
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Ingestion transport or process failure.
    #[error("ingestion error: {0}")]
    Ingestion(#[from] IngestionFailure),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialisation error.
    #[error("config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, BoltError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn search_error_is_transparent() {
        let err: BoltError = SearchError::InvalidQuery("query is blank".into()).into();
        assert_eq!(err.to_string(), "invalid query: query is blank");
    }

    #[test]
    fn ingestion_error_is_prefixed() {
        let err: BoltError = IngestionFailure::Unreachable("down".into()).into();
        assert_eq!(
            err.to_string(),
            "ingestion error: ingestion service unreachable: down"
        );
    }

    #[test]
    fn bolt_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BoltError>();
    }
}

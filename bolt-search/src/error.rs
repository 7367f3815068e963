//! Error types for the bolt-search crate.
//!
//! Messages are stable, lower-case strings suitable for display and for
//! programmatic matching. A duplicate document `Id` on ingestion is not an
//! error: it is reported through [`crate::types::IngestionOutcome`].

/// Why a single term lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupFailureReason {
    /// The term index could not be reached or exited abnormally.
    #[error("term index unreachable: {0}")]
    Unreachable(String),

    /// The lookup did not complete within the configured bound.
    #[error("lookup timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The term index answered with output that is not a valid document list.
    #[error("malformed term index output: {0}")]
    Malformed(String),

    /// The term index answered with an explicit error payload.
    #[error("term index rejected lookup: {0}")]
    Rejected(String),
}

/// A failed lookup for one query term.
///
/// Carries the offending term so that an aggregate [`SearchError::Failure`]
/// tells the caller exactly which part of the query could not be served.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("lookup for term '{term}' failed: {reason}")]
pub struct LookupFailure {
    /// The query term whose lookup failed.
    pub term: String,
    /// What went wrong.
    #[source]
    pub reason: LookupFailureReason,
}

impl LookupFailure {
    /// Build a failure for `term`.
    pub fn new(term: impl Into<String>, reason: LookupFailureReason) -> Self {
        Self {
            term: term.into(),
            reason,
        }
    }
}

/// Errors returned by the search entry point.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The query was empty or contained only whitespace.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A term lookup failed, so the composite search was abandoned.
    #[error("search failed: {0}")]
    Failure(#[source] LookupFailure),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A lookup task could not be joined (panicked or was cancelled).
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl SearchError {
    /// The term whose lookup caused this error, if any.
    pub fn failed_term(&self) -> Option<&str> {
        match self {
            Self::Failure(failure) => Some(&failure.term),
            _ => None,
        }
    }
}

/// Transport or process failures during ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestionFailure {
    /// The uploaded payload is not a valid document.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The ingestion service could not be reached or exited abnormally.
    #[error("ingestion service unreachable: {0}")]
    Unreachable(String),

    /// The ingestion service did not answer within the configured bound.
    #[error("ingestion timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The ingestion service answered with an unrecognised response.
    #[error("malformed ingestion response: {0}")]
    Malformed(String),

    /// Local I/O failed while handing the document over.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for bolt-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

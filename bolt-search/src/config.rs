//! Search and ingestion configuration with sensible defaults.
//!
//! [`SearchConfig`] controls result limits, per-term timeouts, fan-out
//! concurrency, and result caching. [`IngestConfig`] bounds each upload.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SearchError;

/// Configuration for the search orchestrator.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result limit used when the caller does not supply one.
    pub default_limit: usize,
    /// Upper bound for a single term lookup, in milliseconds.
    pub lookup_timeout_ms: u64,
    /// Maximum number of term lookups in flight at once.
    pub max_concurrent_lookups: usize,
    /// How long ranked results stay cached, in seconds. 0 disables caching.
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached result sets.
    pub cache_capacity: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            lookup_timeout_ms: 5_000,
            max_concurrent_lookups: 8,
            cache_ttl_seconds: 60,
            cache_capacity: 100,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `default_limit` must be greater than 0
    /// - `lookup_timeout_ms` must be greater than 0
    /// - `max_concurrent_lookups` must be greater than 0
    /// - `cache_capacity` must be greater than 0 when caching is enabled
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.default_limit == 0 {
            return Err(SearchError::Config(
                "default_limit must be greater than 0".into(),
            ));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(SearchError::Config(
                "lookup_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.max_concurrent_lookups == 0 {
            return Err(SearchError::Config(
                "max_concurrent_lookups must be greater than 0".into(),
            ));
        }
        if self.cache_ttl_seconds > 0 && self.cache_capacity == 0 {
            return Err(SearchError::Config(
                "cache_capacity must be greater than 0 when caching is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Per-term lookup bound.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

/// Configuration for the ingestion gatekeeper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Upper bound for one ingestion call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

impl IngestConfig {
    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.timeout_ms == 0 {
            return Err(SearchError::Config(
                "ingest timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Per-upload bound.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

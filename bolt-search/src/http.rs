//! Shared HTTP client for remote term index and ingestion services.
//!
//! Provides a configured [`reqwest::Client`] with a fixed User-Agent and a
//! request timeout. Per-call deadlines are still enforced by the lookup
//! client and the gatekeeper; the client timeout is a backstop.

use std::time::Duration;

use crate::error::SearchError;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("bolt-search/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] for collaborator services.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the client cannot be constructed.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))
}

//! Bolt host: configuration, backend wiring, and the command-line front end
//! for the `bolt-search` orchestration core.
//!
//! The binary reads a [`BoltConfig`], builds [`Services`] (one search
//! orchestrator and one ingestion gatekeeper over the configured
//! collaborators), and runs a single search or upload per invocation.

pub mod config;
pub mod error;
pub mod runtime;

pub use config::{BackendConfig, BoltConfig};
pub use error::{BoltError, Result};
pub use runtime::Services;

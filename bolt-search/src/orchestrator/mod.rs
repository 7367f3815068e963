//! Search orchestrator: query splitting, concurrent term lookups, merge-rank.
//!
//! This module splits a query into distinct terms, fans the per-term
//! lookups out concurrently, merges the candidate lists into one
//! deduplicated ranking, and truncates it to the caller's limit.

pub mod merge;
pub mod query;
pub mod search;

pub use merge::{merge, merge_entries, MergedEntry};
pub use query::split_terms;
pub use search::SearchOrchestrator;

//! Collaborators reached over HTTP.
//!
//! - lookup: `GET {base}/terms/{term}?limit=N` answering a JSON array of
//!   documents (or `{"error": "..."}`)
//! - ingestion: `POST {base}/documents` with the document as JSON;
//!   `200`/`201` mean stored, `409` means the `Id` already exists

use reqwest::{StatusCode, Url};

use super::payload::decode_documents;
use crate::error::{IngestionFailure, LookupFailure, LookupFailureReason, SearchError};
use crate::ingest::{IngestionService, StoreResponse};
use crate::lookup::TermIndex;
use crate::types::Document;

fn parse_base(base_url: &str) -> Result<Url, SearchError> {
    let url = Url::parse(base_url)
        .map_err(|e| SearchError::Config(format!("invalid base url '{base_url}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(SearchError::Config(format!(
            "base url '{base_url}' cannot carry a path"
        )));
    }
    Ok(url)
}

/// `base` with `segments` appended, ignoring a trailing slash on `base`.
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// A [`TermIndex`] served by a remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpTermIndex {
    client: reqwest::Client,
    base: Url,
}

impl HttpTermIndex {
    /// Point at the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an unusable URL.
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, SearchError> {
        Ok(Self {
            client,
            base: parse_base(base_url)?,
        })
    }
}

impl TermIndex for HttpTermIndex {
    async fn lookup(&self, term: &str, limit: usize) -> Result<Vec<Document>, LookupFailure> {
        let mut url = endpoint(&self.base, &["terms", term]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let down =
            |detail: String| LookupFailure::new(term, LookupFailureReason::Unreachable(detail));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| down(format!("request failed: {e}")))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| down(format!("failed to read body: {e}")))?;

        if status.is_success() {
            return decode_documents(term, &body);
        }
        match decode_documents(term, &body) {
            Err(failure) if matches!(failure.reason, LookupFailureReason::Rejected(_)) => {
                Err(failure)
            }
            _ => Err(down(format!("HTTP {status}"))),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// An [`IngestionService`] served by a remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpIngestionService {
    client: reqwest::Client,
    documents: Url,
}

impl HttpIngestionService {
    /// Point at the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an unusable URL.
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, SearchError> {
        let base = parse_base(base_url)?;
        Ok(Self {
            client,
            documents: endpoint(&base, &["documents"]),
        })
    }
}

impl IngestionService for HttpIngestionService {
    async fn store(&self, document: &Document) -> Result<StoreResponse, IngestionFailure> {
        let response = self
            .client
            .post(self.documents.clone())
            .json(document)
            .send()
            .await
            .map_err(|e| IngestionFailure::Unreachable(format!("request failed: {e}")))?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(StoreResponse::Stored),
            StatusCode::CONFLICT => Ok(StoreResponse::AlreadyExists),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let detail = response.text().await.unwrap_or_default();
                Err(IngestionFailure::InvalidDocument(detail))
            }
            status => Err(IngestionFailure::Unreachable(format!("HTTP {status}"))),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

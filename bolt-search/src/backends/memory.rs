//! In-process document store answering both lookups and ingestion.
//!
//! Postings are lower-cased words drawn from `Title`, `Tag` and `Body`.
//! A lookup returns the matching documents with their stored `Score`,
//! newest first, capped at the requested limit.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tokio::sync::RwLock;

use crate::error::{IngestionFailure, LookupFailure};
use crate::ingest::{IngestionService, StoreResponse};
use crate::lookup::TermIndex;
use crate::types::{Document, DocumentId};

#[derive(Debug, Default)]
struct Inner {
    documents: BTreeMap<DocumentId, Document>,
    postings: HashMap<String, BTreeSet<DocumentId>>,
}

/// Word-posting store for tests, demos and seeded CLI runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

/// Lower-cased alphanumeric words of `text`.
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with `documents`. Later duplicates are skipped.
    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut inner = Inner::default();
        for document in documents {
            inner.insert(document);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.documents.is_empty()
    }

    /// Fetch a stored document by `Id`.
    pub async fn get(&self, id: &DocumentId) -> Option<Document> {
        self.inner.read().await.documents.get(id).cloned()
    }
}

impl Inner {
    /// Check-and-insert. Returns `false` when the `Id` is taken.
    fn insert(&mut self, document: Document) -> bool {
        if self.documents.contains_key(&document.id) {
            return false;
        }
        let id = document.id.clone();
        for field in [&document.title, &document.tag, &document.body] {
            for word in words(field) {
                self.postings.entry(word).or_default().insert(id.clone());
            }
        }
        self.documents.insert(id, document);
        true
    }
}

impl TermIndex for MemoryStore {
    async fn lookup(&self, term: &str, limit: usize) -> Result<Vec<Document>, LookupFailure> {
        let inner = self.inner.read().await;
        let Some(ids) = inner.postings.get(&term.to_lowercase()) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<Document> = ids
            .iter()
            .filter_map(|id| inner.documents.get(id))
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            b.creation_date
                .cmp(&a.creation_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

impl IngestionService for MemoryStore {
    async fn store(&self, document: &Document) -> Result<StoreResponse, IngestionFailure> {
        // Check and insert under one write lock.
        let mut inner = self.inner.write().await;
        if inner.insert(document.clone()) {
            Ok(StoreResponse::Stored)
        } else {
            Ok(StoreResponse::AlreadyExists)
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

//! Decoding of collaborator output shared by the process and HTTP backends.

use serde::Deserialize;

use crate::error::{IngestionFailure, LookupFailure, LookupFailureReason};
use crate::ingest::StoreResponse;
use crate::types::Document;

/// What a term index may print for one lookup.
#[derive(Deserialize)]
#[serde(untagged)]
enum LookupPayload {
    Documents(Vec<ScoredDocument>),
    Error { error: String },
}

/// A lookup hit. Unlike an upload, `Score` is mandatory here.
#[derive(Deserialize)]
struct ScoredDocument {
    #[serde(rename = "Score")]
    score: f64,
    #[serde(flatten)]
    document: Document,
}

impl ScoredDocument {
    fn into_document(self) -> Document {
        Document {
            score: self.score,
            ..self.document
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum StoreStatus {
    Stored,
    Exists,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StorePayload {
    Status { status: StoreStatus },
    Error { error: String },
}

/// Decode a lookup answer: a JSON array of documents, or `{"error": "..."}`.
pub(crate) fn decode_documents(term: &str, raw: &[u8]) -> Result<Vec<Document>, LookupFailure> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        LookupFailure::new(term, LookupFailureReason::Malformed(format!("output is not UTF-8: {e}")))
    })?;
    let text = text.trim();
    if text.is_empty() {
        return Err(LookupFailure::new(
            term,
            LookupFailureReason::Malformed("empty output".into()),
        ));
    }

    match serde_json::from_str::<LookupPayload>(text) {
        Ok(LookupPayload::Documents(documents)) => Ok(documents
            .into_iter()
            .map(ScoredDocument::into_document)
            .collect()),
        Ok(LookupPayload::Error { error }) => {
            Err(LookupFailure::new(term, LookupFailureReason::Rejected(error)))
        }
        Err(e) => Err(LookupFailure::new(
            term,
            LookupFailureReason::Malformed(e.to_string()),
        )),
    }
}

/// Decode an ingestion answer from the last non-empty line of `raw`.
///
/// Earlier lines are progress chatter and are ignored.
pub(crate) fn decode_store_response(raw: &[u8]) -> Result<StoreResponse, IngestionFailure> {
    let text = String::from_utf8_lossy(raw);
    let Some(line) = text.lines().map(str::trim).rev().find(|l| !l.is_empty()) else {
        return Err(IngestionFailure::Malformed("empty output".into()));
    };

    match serde_json::from_str::<StorePayload>(line) {
        Ok(StorePayload::Status {
            status: StoreStatus::Stored,
        }) => Ok(StoreResponse::Stored),
        Ok(StorePayload::Status {
            status: StoreStatus::Exists,
        }) => Ok(StoreResponse::AlreadyExists),
        Ok(StorePayload::Error { error }) => Err(IngestionFailure::Malformed(format!(
            "ingestion service reported: {error}"
        ))),
        Err(e) => Err(IngestionFailure::Malformed(format!("{e}: {line}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentId;

    #[test]
    fn decodes_document_array() {
        let raw = br#"[{"Id": 1, "Title": "cats", "Score": 2.5, "CreationDate": "2024-01-01"}]"#;
        let docs = decode_documents("cat", raw).expect("valid");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, DocumentId::Number(1));
        assert!((docs[0].score - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(decode_documents("cat", b"[]\n").expect("valid").is_empty());
    }

    #[test]
    fn error_object_is_rejected() {
        let err = decode_documents("cat", br#"{"error": "index offline"}"#).unwrap_err();
        assert_eq!(err.term, "cat");
        assert_eq!(err.reason, LookupFailureReason::Rejected("index offline".into()));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = decode_documents("cat", b"Traceback (most recent call last)").unwrap_err();
        assert!(matches!(err.reason, LookupFailureReason::Malformed(_)));
    }

    #[test]
    fn blank_output_is_malformed() {
        let err = decode_documents("cat", b"   \n").unwrap_err();
        assert_eq!(err.reason, LookupFailureReason::Malformed("empty output".into()));
    }

    #[test]
    fn document_without_id_is_malformed() {
        let err = decode_documents("cat", br#"[{"Title": "x", "CreationDate": "2024-01-01"}]"#)
            .unwrap_err();
        assert!(matches!(err.reason, LookupFailureReason::Malformed(_)));
    }

    #[test]
    fn document_without_score_is_malformed() {
        let err = decode_documents("cat", br#"[{"Id": 1, "CreationDate": "2024-01-01"}]"#)
            .unwrap_err();
        assert_eq!(err.term, "cat");
        assert!(matches!(err.reason, LookupFailureReason::Malformed(_)));

        let err = decode_documents("cat", br#"[{"Id": 1, "Score": null, "CreationDate": "2024-01-01"}]"#)
            .unwrap_err();
        assert!(matches!(err.reason, LookupFailureReason::Malformed(_)));
    }

    #[test]
    fn integer_score_accepted() {
        let docs = decode_documents(
            "cat",
            br#"[{"Id": "q-1", "Title": null, "Score": 4, "CreationDate": "2024-01-01 09:00:00"}]"#,
        )
        .expect("valid");
        assert_eq!(docs[0].id, DocumentId::Text("q-1".into()));
        assert!((docs[0].score - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn store_status_lines() {
        assert_eq!(
            decode_store_response(br#"{"status": "stored"}"#).expect("ok"),
            StoreResponse::Stored
        );
        assert_eq!(
            decode_store_response(b"indexing...\n{\"status\": \"exists\"}\n\n").expect("ok"),
            StoreResponse::AlreadyExists
        );
    }

    #[test]
    fn store_unknown_status_is_malformed() {
        let err = decode_store_response(br#"{"status": "maybe"}"#).unwrap_err();
        assert!(matches!(err, IngestionFailure::Malformed(_)));
    }

    #[test]
    fn store_empty_output_is_malformed() {
        assert!(matches!(
            decode_store_response(b""),
            Err(IngestionFailure::Malformed(_))
        ));
    }
}

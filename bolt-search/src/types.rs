//! Core types: documents, identities, per-term candidate lists, and
//! ingestion outcomes.
//!
//! Collaborator payloads are decoded straight into these types, so a
//! record that deserialises is already a validated [`Document`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Separator between sub-answers inside [`Document::answer`].
pub const ANSWER_DELIMITER: &str = ",,,,,";

/// Stable identity of a document across the whole store.
///
/// Integer and string identities are both accepted. Strings that parse as
/// integers are normalised, so `"42"` and `42` name the same document.
/// Integers outside the `i64` range are kept as their exact decimal text.
/// Ordering puts integers first (ascending), then strings (ascending).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum DocumentId {
    /// Numeric identity.
    Number(i64),
    /// Free-form identity.
    Text(String),
}

impl DocumentId {
    /// Render the identity for use in file names and URLs.
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(value.to_owned()),
        }
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Unsigned(u64),
            // Pandas exports integer columns with NaN holes as floats.
            Float(f64),
            Text(String),
        }

        // Exclusive bounds: `i64::MAX as f64` rounds up to 2^63.
        const FLOAT_MIN: f64 = i64::MIN as f64;
        const FLOAT_MAX: f64 = i64::MAX as f64;

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(Self::Number(n)),
            RawId::Unsigned(n) => Ok(Self::Text(n.to_string())),
            RawId::Float(f) if f.fract() == 0.0 && f > FLOAT_MIN && f < FLOAT_MAX => {
                Ok(Self::Number(f as i64))
            }
            RawId::Float(f) => Err(serde::de::Error::custom(format!(
                "document id must be an i64-range integer, got {f}"
            ))),
            RawId::Text(s) if s.trim().is_empty() => {
                Err(serde::de::Error::custom("document id must not be empty"))
            }
            RawId::Text(s) => Ok(Self::from(s.as_str())),
        }
    }
}

/// The unit returned by search and accepted by ingestion.
///
/// Field names on the wire follow the dataset columns (`Id`, `Title`,
/// `Body`, `Tag`, `Answer`, `Score`, `CreationDate`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Document {
    /// Stable unique identifier.
    pub id: DocumentId,
    /// Question title.
    #[serde(default, deserialize_with = "nullable_text")]
    pub title: String,
    /// Question body.
    #[serde(default, deserialize_with = "nullable_text")]
    pub body: String,
    /// Free-text tags.
    #[serde(default, deserialize_with = "nullable_text")]
    pub tag: String,
    /// Answers joined with [`ANSWER_DELIMITER`].
    #[serde(default, deserialize_with = "nullable_text")]
    pub answer: String,
    /// Relevance assigned by the term index (aggregate score after merging).
    #[serde(default)]
    pub score: f64,
    /// Creation timestamp, used only as a ranking tie-break.
    #[serde(with = "creation_date")]
    pub creation_date: DateTime<Utc>,
}

impl Document {
    /// Individual answers, in stored order, with empty pieces dropped.
    pub fn answers(&self) -> Vec<&str> {
        self.answer
            .split(ANSWER_DELIMITER)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect()
    }

    /// Individual tags, split on whitespace and commas.
    pub fn tags(&self) -> Vec<&str> {
        self.tag
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// The documents one term lookup returned.
#[derive(Debug, Clone, PartialEq)]
pub struct TermCandidateList {
    /// The query term this list answers.
    pub term: String,
    /// Candidates with per-call scores. Order carries no meaning.
    pub documents: Vec<Document>,
}

impl TermCandidateList {
    /// Build a candidate list for `term`.
    pub fn new(term: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            term: term.into(),
            documents,
        }
    }
}

/// Result of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionOutcome {
    /// Whether the document was newly stored.
    pub accepted: bool,
    /// The colliding identity when the document was not accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<DocumentId>,
}

impl IngestionOutcome {
    /// The document was newly stored.
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            conflict: None,
        }
    }

    /// A document with `id` already exists.
    pub fn conflict(id: DocumentId) -> Self {
        Self {
            accepted: false,
            conflict: Some(id),
        }
    }
}

fn nullable_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Lenient `CreationDate` (de)serialisation.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` and
/// `YYYY-MM-DD` (naive values are taken as UTC). Always emits RFC 3339.
pub mod creation_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    /// Parse a timestamp in any accepted format.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("unrecognised CreationDate '{raw}'"))
        })
    }
}

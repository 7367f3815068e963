//! Merge-rank: combine per-term candidate lists into one ranking.
//!
//! Candidates are grouped by document [`Id`](crate::types::DocumentId).
//! Each group records how many distinct terms matched it (`occurrence`)
//! and the sum of its per-term scores (`aggregate_score`). Groups are then
//! ordered by:
//!
//! 1. `occurrence` descending
//! 2. `aggregate_score` descending
//! 3. `CreationDate` descending (newer first)
//! 4. `Id` ascending
//!
//! The last key makes the order total, so output never depends on input
//! list order beyond which occurrence supplies the display fields.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::{Document, DocumentId, TermCandidateList};

/// One distinct document after merging.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEntry {
    /// Payload from the first occurrence of this `Id`.
    pub document: Document,
    /// Number of distinct terms whose lists contained this `Id`.
    pub occurrence: usize,
    /// Sum of per-term scores for this `Id`.
    pub aggregate_score: f64,
}

impl MergedEntry {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .occurrence
            .cmp(&self.occurrence)
            .then_with(|| other.aggregate_score.total_cmp(&self.aggregate_score))
            .then_with(|| other.document.creation_date.cmp(&self.document.creation_date))
            .then_with(|| self.document.id.cmp(&other.document.id))
    }
}

/// Group, rank and truncate candidate lists, keeping merge metadata.
///
/// An `Id` repeated inside one list counts once for that list; the repeat
/// adds neither occurrence nor score. Never fails: empty input or
/// `limit == 0` yields an empty result.
pub fn merge_entries(lists: &[TermCandidateList], limit: usize) -> Vec<MergedEntry> {
    if limit == 0 {
        return Vec::new();
    }

    // Id → (entry, index of the last list that counted it).
    let mut groups: HashMap<&DocumentId, (MergedEntry, usize)> = HashMap::new();

    for (list_index, list) in lists.iter().enumerate() {
        for document in &list.documents {
            groups
                .entry(&document.id)
                .and_modify(|(entry, last_list)| {
                    if *last_list != list_index {
                        entry.occurrence += 1;
                        entry.aggregate_score += document.score;
                        *last_list = list_index;
                    }
                })
                .or_insert_with(|| {
                    (
                        MergedEntry {
                            document: document.clone(),
                            occurrence: 1,
                            aggregate_score: document.score,
                        },
                        list_index,
                    )
                });
        }
    }

    let mut entries: Vec<MergedEntry> = groups.into_values().map(|(entry, _)| entry).collect();
    entries.sort_by(MergedEntry::rank_cmp);
    entries.truncate(limit);
    entries
}

/// Group, rank and truncate candidate lists into final documents.
///
/// Each returned document carries its aggregate score in `score`.
pub fn merge(lists: &[TermCandidateList], limit: usize) -> Vec<Document> {
    merge_entries(lists, limit)
        .into_iter()
        .map(|entry| {
            let mut document = entry.document;
            document.score = entry.aggregate_score;
            document
        })
        .collect()
}

//! Query splitting.

use std::collections::HashSet;

use crate::error::SearchError;

/// Split `query` on whitespace into distinct terms.
///
/// Terms keep their first-appearance order and are not case-folded; the
/// term index owns normalisation.
///
/// # Errors
///
/// Returns [`SearchError::InvalidQuery`] if the query is empty or blank.
pub fn split_terms(query: &str) -> Result<Vec<String>, SearchError> {
    let mut seen = HashSet::new();
    let terms: Vec<String> = query
        .split_whitespace()
        .filter(|term| seen.insert(*term))
        .map(str::to_owned)
        .collect();

    if terms.is_empty() {
        return Err(SearchError::InvalidQuery(
            "query must contain at least one term".into(),
        ));
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_any_whitespace() {
        let terms = split_terms("cat\tdog \n bird").expect("valid");
        assert_eq!(terms, vec!["cat", "dog", "bird"]);
    }

    #[test]
    fn duplicate_terms_collapsed_in_order() {
        let terms = split_terms("dog cat dog cat fish").expect("valid");
        assert_eq!(terms, vec!["dog", "cat", "fish"]);
    }

    #[test]
    fn case_is_preserved() {
        let terms = split_terms("Rust rust").expect("valid");
        assert_eq!(terms, vec!["Rust", "rust"]);
    }

    #[test]
    fn blank_query_rejected() {
        assert!(matches!(
            split_terms("   "),
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(matches!(split_terms(""), Err(SearchError::InvalidQuery(_))));
    }
}

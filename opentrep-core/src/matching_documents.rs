//! Per-slice retrieval state: the phrase actually executed, the weighted
//! result set, and the single best document.

use std::collections::BTreeMap;

use crate::describe::Describe;

/// Holds everything one slice's retrieval produced.
///
/// `weighted_results` maps `doc_id` to its percentage of the top document's
/// raw score (top document always reports 100). Percentages sum to at most
/// 100 across the reported results only when there is a single dominant
/// match; ties and near-ties can each individually approach 100.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingDocuments {
    pub original_phrase: String,
    pub corrected_phrase: Option<String>,
    pub weighted_results: BTreeMap<u64, u8>,
    pub best_doc_id: Option<u64>,
}

impl MatchingDocuments {
    /// The empty result: no index match for this phrase. Not an error —
    /// callers read `best_doc_id.is_none()` as "this slice missed".
    pub fn empty(original_phrase: impl Into<String>) -> MatchingDocuments {
        MatchingDocuments {
            original_phrase: original_phrase.into(),
            corrected_phrase: None,
            weighted_results: BTreeMap::new(),
            best_doc_id: None,
        }
    }

    /// The phrase that actually produced the result: the corrected/shrunk
    /// form if one was needed, otherwise the original.
    pub fn executed_phrase(&self) -> &str {
        self.corrected_phrase.as_deref().unwrap_or(&self.original_phrase)
    }

    /// Percentage (0..=100) of the best document, or 0 if there is none.
    pub fn best_percentage(&self) -> u8 {
        self.best_doc_id
            .and_then(|id| self.weighted_results.get(&id).copied())
            .unwrap_or(0)
    }
}

impl Describe for MatchingDocuments {
    fn describe_key(&self) -> String {
        format!(
            "MatchingDocuments(\"{}\" -> {:?}, best={:?}@{}%)",
            self.original_phrase,
            self.corrected_phrase,
            self.best_doc_id,
            self.best_percentage(),
        )
    }
}

//! Composes per-slice results into a best whole-query answer.

use std::sync::atomic::AtomicBool;

use heed::RoTxn;

use crate::cancel;
use crate::describe::Describe;
use crate::matcher::{self, P_MISS};
use crate::matching_documents::MatchingDocuments;
use crate::slices::query_slices;
use crate::store::Index;
use crate::error::OpenTrepResult;

/// The ordered list of `MatchingDocuments` produced for one slice
/// partitioning of the query, plus its aggregate score.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultHolder {
    pub matches: Vec<MatchingDocuments>,
    pub aggregate_score: f64,
}

impl ResultHolder {
    /// Runs the matcher over each of `slice_phrases` and aggregates: the
    /// product, over slices, of `(best-document-percentage / 100) *
    /// slice_weight`, where `slice_weight` is the slice's word count over
    /// the query's total word count. A missed slice contributes `P_MISS`
    /// instead of zero, so a holder with at least one real match still
    /// scores above a holder with none; a holder where every slice missed
    /// scores exactly zero rather than the flat `P_MISS` product.
    ///
    /// `cancel`, when set, is checked between slices (spec.md §5).
    pub fn build(slice_phrases: &[String], index: &Index, rtxn: &RoTxn, cancel: Option<&AtomicBool>) -> OpenTrepResult<ResultHolder> {
        let total_words: usize = slice_phrases.iter().map(|s| s.split_whitespace().count()).sum();
        let mut matches = Vec::with_capacity(slice_phrases.len());
        let mut aggregate_score = 1.0;
        let mut any_match = false;

        for phrase in slice_phrases {
            cancel::check(cancel)?;
            let matching = matcher::search(phrase, index, rtxn, cancel)?;
            let slice_words = phrase.split_whitespace().count();
            let slice_weight = if total_words > 0 { slice_words as f64 / total_words as f64 } else { 0.0 };

            let contribution = if matching.best_doc_id.is_some() {
                any_match = true;
                (matching.best_percentage() as f64 / 100.0) * slice_weight
            } else {
                P_MISS
            };
            aggregate_score *= contribution;
            matches.push(matching);
        }

        // A holder where every slice missed is not "a partial match diluted
        // by P_MISS" — it is no match at all (spec.md §7's "query yielded no
        // non-empty slice"), and must compare as zero so
        // `choose_best_matching_result_holder`/`best_holder_or_err` report
        // `NoBestMatch` rather than treating the flat P_MISS product as a
        // usable answer.
        if !any_match {
            aggregate_score = 0.0;
        }

        Ok(ResultHolder { matches, aggregate_score })
    }

    /// The corrected/executed phrase of every slice, joined, used as the
    /// lexicographic ResultCombination tie-break.
    pub fn serialized_corrected_query(&self) -> String {
        self.matches.iter().map(|m| m.executed_phrase()).collect::<Vec<_>>().join(" ")
    }

    pub fn slice_count(&self) -> usize {
        self.matches.len()
    }
}

impl Describe for ResultHolder {
    fn describe_key(&self) -> String {
        format!(
            "ResultHolder({} slices, score={:.4}, corrected=\"{}\")",
            self.slice_count(),
            self.aggregate_score,
            self.serialized_corrected_query(),
        )
    }
}

/// The set of `ResultHolder`s considered for a query — one per candidate
/// slice partitioning — and the chosen best one.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultCombination {
    pub holders: Vec<ResultHolder>,
    best_index: Option<usize>,
}

impl ResultCombination {
    /// Enumerates candidate slice partitionings: the greedy-sliced output
    /// plus, only when slicing itself produced a single slice, the
    /// whole-query reading (redundant once it does not differ, but kept as
    /// the fallback for when slicing could not grow past one buffer at
    /// all). Builds one `ResultHolder` per partitioning and selects the
    /// best: highest aggregate score, then fewest slices, then
    /// lexicographically smallest serialized corrected query.
    pub fn resolve(query: &str, index: &Index, rtxn: &RoTxn) -> OpenTrepResult<ResultCombination> {
        Self::resolve_cancellable(query, index, rtxn, None)
    }

    /// Same as [`resolve`](Self::resolve), but checks `cancel` between
    /// slices and between each slice's matcher retries (spec.md §5);
    /// `resolve` is this with `cancel: None`.
    pub fn resolve_cancellable(query: &str, index: &Index, rtxn: &RoTxn, cancel: Option<&AtomicBool>) -> OpenTrepResult<ResultCombination> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(ResultCombination { holders: Vec::new(), best_index: None });
        }

        let mut partitionings: Vec<Vec<String>> = Vec::new();

        let sliced = query_slices(trimmed, index, rtxn, cancel)?;
        let sliced_into_one = sliced.len() <= 1;
        if !sliced.is_empty() {
            partitionings.push(sliced);
        }

        // The whole-query single-slice reading is only a useful fallback when
        // slicing itself collapsed to one slice (or found none): its one
        // "slice" always covers the full query, so its aggregate score (§4.7)
        // carries the full slice_weight of 1 regardless of how much of the
        // query actually matched. Considering it alongside a genuine
        // multi-slice partitioning would let it dominate every holder whose
        // slice_weight is split across several independently-scored slices,
        // even when those slices are each a precise match (spec.md §8 E1).
        if sliced_into_one {
            let whole = vec![trimmed.to_string()];
            if !partitionings.contains(&whole) {
                partitionings.push(whole);
            }
        }

        let mut holders = Vec::with_capacity(partitionings.len());
        for partitioning in &partitionings {
            cancel::check(cancel)?;
            holders.push(ResultHolder::build(partitioning, index, rtxn, cancel)?);
        }

        let mut combination = ResultCombination { holders, best_index: None };
        combination.choose_best_matching_result_holder();
        Ok(combination)
    }

    /// Picks the best holder by the score/slice-count/lexicographic
    /// tie-break chain. Returns whether any holder achieved a nonzero
    /// aggregate score.
    pub fn choose_best_matching_result_holder(&mut self) -> bool {
        let mut best: Option<usize> = None;

        for (index, holder) in self.holders.iter().enumerate() {
            best = Some(match best {
                None => index,
                Some(best_idx) => {
                    let current = &self.holders[best_idx];
                    let better = holder.aggregate_score > current.aggregate_score
                        || (holder.aggregate_score == current.aggregate_score
                            && holder.slice_count() < current.slice_count())
                        || (holder.aggregate_score == current.aggregate_score
                            && holder.slice_count() == current.slice_count()
                            && holder.serialized_corrected_query() < current.serialized_corrected_query());
                    if better { index } else { best_idx }
                }
            });
        }

        self.best_index = best;
        self.best_holder().map(|h| h.aggregate_score > 0.0).unwrap_or(false)
    }

    pub fn best_holder(&self) -> Option<&ResultHolder> {
        self.best_index.map(|i| &self.holders[i])
    }

    /// The best holder, or `NoBestMatch` if the query yielded no non-empty
    /// slice.
    pub fn best_holder_or_err(&self) -> OpenTrepResult<&ResultHolder> {
        self.best_holder()
            .filter(|h| h.aggregate_score > 0.0)
            .ok_or(crate::error::OpenTrepError::NoBestMatch)
    }
}

impl Describe for ResultCombination {
    fn describe_key(&self) -> String {
        format!(
            "ResultCombination({} holders, best={:?})",
            self.holders.len(),
            self.best_holder().map(|h| h.describe_key()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_builder::build_index;
    use tempfile::tempdir;

    fn sample_line(iata: &str, icao: &str, geoname: &str, name: &str, page_rank: &str) -> String {
        format!(
            "{iata}^{icao}^^{geoname}^{name}^{name}^^0.0^0.0^S^AIRP^FR^EU^^^Europe/Paris^{page_rank}^A^{iata}"
        )
    }

    fn build_sample_index() -> (tempfile::TempDir, Index) {
        let dir = tempdir().unwrap();
        let por_path = dir.path().join("por.csv");
        std::fs::write(&por_path, [
            sample_line("SFO", "KSFO", "5391959", "San Francisco", "0.8"),
            sample_line("RIO", "SBRJ", "3451190", "Rio de Janeiro", "0.6"),
            sample_line("REK", "BIRK", "3413829", "Reykjavik", "0.4"),
            sample_line("LAX", "KLAX", "5368361", "Los Angeles", "0.9"),
            sample_line("CMA", "KCMA", "1234567", "Chelsea Municipal Airport", "0.1"),
            sample_line("NCE", "LFMN", "6299418", "Nice Cote d'Azur", "0.7"),
        ].join("\n")).unwrap();

        let index_path = dir.path().join("index");
        build_index(&por_path, &index_path).unwrap();
        let index = Index::open(&index_path).unwrap();
        (dir, index)
    }

    fn best_common_names(query: &str, index: &Index, rtxn: &RoTxn) -> Vec<String> {
        let combination = ResultCombination::resolve(query, index, rtxn).unwrap();
        let holder = combination.best_holder().unwrap();
        holder
            .matches
            .iter()
            .map(|m| {
                let doc_id = m.best_doc_id.unwrap();
                index.documents.get(rtxn, doc_id).unwrap().unwrap().common_name
            })
            .collect()
    }

    #[test]
    fn two_concatenated_destinations_yield_two_slices() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let combination = ResultCombination::resolve("san francicso rio de janero", &index, &rtxn).unwrap();
        let holder = combination.best_holder().unwrap();
        assert_eq!(holder.slice_count(), 2);
        assert_eq!(holder.matches[0].executed_phrase(), "san francisco");
        assert_eq!(holder.matches[1].executed_phrase(), "rio de janeiro");

        let names = best_common_names("san francicso rio de janero", &index, &rtxn);
        assert_eq!(names, vec!["San Francisco", "Rio de Janeiro"]);
    }

    #[test]
    fn single_misspelled_destination_resolves() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        assert_eq!(best_common_names("rio de janero", &index, &rtxn), vec!["Rio de Janeiro"]);
    }

    #[test]
    fn transposed_letters_typo_resolves() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        assert_eq!(best_common_names("lso angeles", &index, &rtxn), vec!["Los Angeles"]);
    }

    #[test]
    fn multi_edit_typo_resolves() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        assert_eq!(best_common_names("rekyavik", &index, &rtxn), vec!["Reykjavik"]);
    }

    #[test]
    fn three_word_place_name_matches() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        assert_eq!(
            best_common_names("chelsea municipal airport", &index, &rtxn),
            vec!["Chelsea Municipal Airport"]
        );
    }

    #[test]
    fn bare_iata_code_resolves() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        assert_eq!(best_common_names("NCE", &index, &rtxn), vec!["Nice Cote d'Azur"]);
    }

    #[test]
    fn empty_query_yields_empty_combination_without_error() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let combination = ResultCombination::resolve("   ", &index, &rtxn).unwrap();
        assert!(combination.best_holder().is_none());
        assert!(combination.holders.is_empty());
    }

    #[test]
    fn unresolvable_query_reports_no_best_match() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let combination = ResultCombination::resolve("zzxxqqwwjjkk", &index, &rtxn).unwrap();
        assert!(matches!(
            combination.best_holder_or_err(),
            Err(crate::error::OpenTrepError::NoBestMatch)
        ));
    }

    #[test]
    fn determinism_across_repeated_calls() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let first = ResultCombination::resolve("san francicso rio de janero", &index, &rtxn).unwrap();
        let second = ResultCombination::resolve("san francicso rio de janero", &index, &rtxn).unwrap();
        assert_eq!(
            first.best_holder().unwrap().serialized_corrected_query(),
            second.best_holder().unwrap().serialized_corrected_query()
        );
    }

    #[test]
    fn cancelled_flag_aborts_resolution() {
        use std::sync::atomic::AtomicBool;

        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let cancel = AtomicBool::new(true);
        let result = ResultCombination::resolve_cancellable(
            "san francicso rio de janero",
            &index,
            &rtxn,
            Some(&cancel),
        );
        assert!(matches!(result, Err(crate::error::OpenTrepError::Cancelled)));
    }

    #[test]
    fn holder_with_every_slice_missed_scores_exactly_zero() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let holder = ResultHolder::build(&["zzxxqqwwjjkk".to_string()], &index, &rtxn, None).unwrap();
        assert_eq!(holder.aggregate_score, 0.0);
    }
}

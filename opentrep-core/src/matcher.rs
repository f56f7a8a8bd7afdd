//! Executes one slice's index lookup with spelling correction, computing
//! weighted scores. The heart of query resolution: everything downstream
//! (slicing, result combination) is built around what this module returns.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;

use heed::RoTxn;
use tracing::debug;

use crate::automaton::spelling_candidates;
use crate::cancel;
use crate::error::OpenTrepResult;
use crate::matching_documents::MatchingDocuments;
use crate::store::Index;

/// Minimum estimated relevance — the top document's share of the total term
/// weight available — for an exact or spelling-corrected OR-query to be
/// accepted outright.
pub const T_EXACT: f64 = 0.5;

/// Penalty factor a slice that yielded no match contributes to
/// `ResultHolder`'s aggregate score, instead of zero.
pub const P_MISS: f64 = 0.1;

fn tokenize(phrase: &str) -> Vec<String> {
    phrase.split_whitespace().map(opentrep_tokenizer::normalize_term).collect()
}

/// Sums, per document, the weight of every term of `terms` it appears
/// under. Rarer terms (fewer postings) weigh more, an IDF-like measure of
/// how much evidence a term contributes. Returns the per-document raw
/// scores and the total weight available (the denominator of "estimated
/// relevance").
fn or_query(
    terms: &[String],
    index: &Index,
    rtxn: &RoTxn,
) -> OpenTrepResult<(BTreeMap<u64, f64>, f64, bool)> {
    let mut scores: BTreeMap<u64, f64> = BTreeMap::new();
    let mut total_weight = 0.0;
    let mut all_present = true;

    for term in terms {
        let postings = index.postings.get(rtxn, term)?;
        // A term absent from the index weighs as much as the rarest known
        // term would (1.0): it is still counted against the total so that
        // "estimated relevance" drops when a query word has no evidence at
        // all, not just when it contradicts another document.
        let weight = if postings.is_empty() { 1.0 } else { 1.0 / postings.len() as f64 };
        total_weight += weight;
        if postings.is_empty() {
            all_present = false;
            continue;
        }

        let mut doc_ids: Vec<u64> = postings.iter().map(|p| p.doc_id).collect();
        doc_ids.sort_unstable();
        doc_ids.dedup();
        for doc_id in doc_ids {
            *scores.entry(doc_id).or_insert(0.0) += weight;
        }
    }

    Ok((scores, total_weight, all_present))
}

/// Picks the single best document: highest raw score; ties broken by
/// higher page-rank, then lower `doc_id`, so the outcome is fully
/// deterministic rather than depending on map iteration order.
fn best_document(scores: &BTreeMap<u64, f64>, index: &Index, rtxn: &RoTxn) -> OpenTrepResult<Option<u64>> {
    let mut best: Option<(u64, f64, f64)> = None;
    for (&doc_id, &score) in scores {
        let page_rank = index.documents.get(rtxn, doc_id)?.map(|p| p.page_rank).unwrap_or(0.0);
        best = Some(match best {
            None => (doc_id, score, page_rank),
            Some((best_id, best_score, best_rank)) => {
                let better = score > best_score
                    || (score == best_score && page_rank > best_rank)
                    || (score == best_score && page_rank == best_rank && doc_id < best_id);
                if better { (doc_id, score, page_rank) } else { (best_id, best_score, best_rank) }
            }
        });
    }
    Ok(best.map(|(id, _, _)| id))
}

/// Normalizes raw scores to percentages of the top document's raw weight
/// (top = 100).
fn percentages(scores: &BTreeMap<u64, f64>, best_doc_id: u64) -> BTreeMap<u64, u8> {
    let top = scores.get(&best_doc_id).copied().unwrap_or(0.0);
    if top <= 0.0 {
        return BTreeMap::new();
    }
    scores
        .iter()
        .map(|(&id, &score)| (id, ((score / top) * 100.0).round().clamp(0.0, 100.0) as u8))
        .collect()
}

struct Attempt {
    scores: BTreeMap<u64, f64>,
    best_doc_id: u64,
    relevance: f64,
    /// Whether every term in the attempted phrase had at least one posting.
    /// A phrase with an absent term can still clear `T_EXACT` on relevance
    /// alone (a single rare real word can carry half the summed weight), but
    /// that is not genuine evidence the absent term was recognized — it is
    /// exactly the case spelling correction exists to handle.
    all_present: bool,
}

/// Runs the OR-query for `terms` and, if any document matched, picks the
/// best one and computes the estimated relevance.
fn attempt(terms: &[String], index: &Index, rtxn: &RoTxn) -> OpenTrepResult<Option<Attempt>> {
    if terms.is_empty() {
        return Ok(None);
    }
    let (scores, total_weight, all_present) = or_query(terms, index, rtxn)?;
    if scores.is_empty() {
        return Ok(None);
    }
    let best_doc_id = best_document(&scores, index, rtxn)?.expect("nonempty scores has a best");
    let relevance = if total_weight > 0.0 { scores[&best_doc_id] / total_weight } else { 0.0 };
    Ok(Some(Attempt { scores, best_doc_id, relevance, all_present }))
}

/// Requests the top suggestion for `term` from the spell dictionary within
/// bounded edit distance: among the DFA's matches, the one indexed under
/// the most documents, ties broken lexicographically.
/// Falls back to `term` unchanged when it is already in the dictionary or
/// has no candidate within range.
fn correct_term(term: &str, index: &Index, rtxn: &RoTxn, dictionary: &fst::Set<Vec<u8>>) -> OpenTrepResult<String> {
    if dictionary.contains(term) {
        return Ok(term.to_string());
    }

    let mut best: Option<(String, usize)> = None;
    for candidate in spelling_candidates(term, dictionary) {
        let hits = index.postings.get(rtxn, &candidate)?.len();
        best = Some(match best {
            None => (candidate, hits),
            Some((best_word, best_hits)) => {
                if hits > best_hits || (hits == best_hits && candidate < best_word) {
                    (candidate, hits)
                } else {
                    (best_word, best_hits)
                }
            }
        });
    }

    Ok(best.map(|(word, _)| word).unwrap_or_else(|| term.to_string()))
}

fn correct_terms(terms: &[String], index: &Index, rtxn: &RoTxn) -> OpenTrepResult<Vec<String>> {
    let dictionary = index.main.words_fst(rtxn)?;
    terms.iter().map(|term| correct_term(term, index, rtxn, &dictionary)).collect()
}

struct Found {
    corrected_phrase: String,
    scores: BTreeMap<u64, f64>,
    best_doc_id: u64,
}

/// Repeatedly drops the rightmost word and retries, until a match is found
/// or the phrase is empty.
fn shrink_right(terms: &[String], index: &Index, rtxn: &RoTxn) -> OpenTrepResult<Option<Found>> {
    let mut current = terms.to_vec();
    while !current.is_empty() {
        current.pop();
        if current.is_empty() {
            break;
        }
        if let Some(found) = attempt(&current, index, rtxn)? {
            return Ok(Some(Found {
                corrected_phrase: current.join(" "),
                scores: found.scores,
                best_doc_id: found.best_doc_id,
            }));
        }
    }
    Ok(None)
}

/// Repeatedly drops the leftmost word of the *original* phrase and retries.
fn shrink_left(original_terms: &[String], index: &Index, rtxn: &RoTxn) -> OpenTrepResult<Option<Found>> {
    for start in 1..original_terms.len() {
        let current = &original_terms[start..];
        if let Some(found) = attempt(current, index, rtxn)? {
            return Ok(Some(Found {
                corrected_phrase: current.join(" "),
                scores: found.scores,
                best_doc_id: found.best_doc_id,
            }));
        }
    }
    Ok(None)
}

fn to_matching_documents(original: String, corrected: Option<String>, scores: BTreeMap<u64, f64>, best_doc_id: u64) -> MatchingDocuments {
    MatchingDocuments {
        original_phrase: original,
        corrected_phrase: corrected,
        weighted_results: percentages(&scores, best_doc_id),
        best_doc_id: Some(best_doc_id),
    }
}

/// Whether `phrase`'s exact OR-query alone (no spelling correction or
/// shrinking) clears the acceptance bar. Used by `slices` to probe
/// candidate slice buffers: a buffer that only matches after correction or
/// shrinking is not good evidence the whole buffer names one place.
pub(crate) fn exact_probe(phrase: &str, index: &Index, rtxn: &RoTxn) -> OpenTrepResult<bool> {
    let terms = tokenize(phrase.trim());
    match attempt(&terms, index, rtxn)? {
        Some(found) => Ok(found.relevance >= T_EXACT),
        None => Ok(false),
    }
}

/// `search(phrase, index) -> MatchingDocuments`: exact OR-query, then
/// spelling correction, then right-shrink, then left-shrink, stopping at the
/// first step whose result clears the acceptance bar. Empty index or phrase
/// with only separators yields an empty `MatchingDocuments`, not an error.
///
/// `cancel`, when set, is checked between each of the four steps (spec.md
/// §5's "cooperative-cancellable ... between retrieval retries"); a flag
/// observed set at a checkpoint aborts with `OpenTrepError::Cancelled`.
pub fn search(phrase: &str, index: &Index, rtxn: &RoTxn, cancel: Option<&AtomicBool>) -> OpenTrepResult<MatchingDocuments> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return Ok(MatchingDocuments::empty(phrase.to_string()));
    }

    let terms = tokenize(trimmed);
    if terms.is_empty() {
        return Ok(MatchingDocuments::empty(phrase.to_string()));
    }

    // Step 1: exact OR-query. Requires every term to have contributed real
    // evidence (`all_present`) as well as clearing `T_EXACT`: otherwise one
    // rare real word can carry half the summed weight and wave through a
    // phrase whose other word was never recognized, skipping the spelling
    // correction step that exists precisely to fix that word.
    if let Some(found) = attempt(&terms, index, rtxn)? {
        if found.all_present && found.relevance >= T_EXACT {
            debug!(phrase = trimmed, relevance = found.relevance, "exact match accepted");
            return Ok(to_matching_documents(phrase.to_string(), None, found.scores, found.best_doc_id));
        }
    }
    cancel::check(cancel)?;

    // Step 2: spelling correction.
    let corrected_terms = correct_terms(&terms, index, rtxn)?;
    if corrected_terms != terms {
        if let Some(found) = attempt(&corrected_terms, index, rtxn)? {
            if found.relevance >= T_EXACT {
                let corrected_phrase = corrected_terms.join(" ");
                debug!(phrase = trimmed, %corrected_phrase, relevance = found.relevance, "corrected match accepted");
                return Ok(to_matching_documents(phrase.to_string(), Some(corrected_phrase), found.scores, found.best_doc_id));
            }
        }
    }
    cancel::check(cancel)?;

    // Step 3: shrink, rightmost first (from the corrected form if one
    // exists, since that is "the phrase" at this point in the algorithm).
    let shrink_base = if corrected_terms == terms { &terms } else { &corrected_terms };
    if let Some(found) = shrink_right(shrink_base, index, rtxn)? {
        debug!(phrase = trimmed, corrected = %found.corrected_phrase, "right-shrunk match accepted");
        return Ok(to_matching_documents(phrase.to_string(), Some(found.corrected_phrase), found.scores, found.best_doc_id));
    }
    cancel::check(cancel)?;

    // Step 3 continued: shrink leftmost from the original.
    if let Some(found) = shrink_left(&terms, index, rtxn)? {
        debug!(phrase = trimmed, corrected = %found.corrected_phrase, "left-shrunk match accepted");
        return Ok(to_matching_documents(phrase.to_string(), Some(found.corrected_phrase), found.scores, found.best_doc_id));
    }

    Ok(MatchingDocuments::empty(phrase.to_string()))
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

    #[test]
    fn exact_match_on_unique_iata_code() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let result = search("NCE", &index, &rtxn, None).unwrap();
        let place = index.documents.get(&rtxn, result.best_doc_id.unwrap()).unwrap().unwrap();
        assert_eq!(place.common_name, "Nice Cote d'Azur");
        assert!(result.corrected_phrase.is_none());
    }

    #[test]
    fn corrects_a_misspelled_single_word() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let result = search("rekyavik", &index, &rtxn, None).unwrap();
        let place = index.documents.get(&rtxn, result.best_doc_id.unwrap()).unwrap().unwrap();
        assert_eq!(place.common_name, "Reykjavik");
    }

    #[test]
    fn corrects_a_misspelled_multi_word_phrase() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let result = search("lso angeles", &index, &rtxn, None).unwrap();
        let place = index.documents.get(&rtxn, result.best_doc_id.unwrap()).unwrap().unwrap();
        assert_eq!(place.common_name, "Los Angeles");
    }

    #[test]
    fn one_absent_word_does_not_skip_correction_of_the_other() {
        // "san" alone carries enough weight to clear T_EXACT on relevance,
        // but "francicso" never appears in the index: step 1 must not accept
        // outright just because "san" is common evidence. Correction has to
        // run and fix "francicso" -> "francisco".
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let result = search("san francicso", &index, &rtxn, None).unwrap();
        let place = index.documents.get(&rtxn, result.best_doc_id.unwrap()).unwrap().unwrap();
        assert_eq!(place.common_name, "San Francisco");
        assert_eq!(result.corrected_phrase.as_deref(), Some("san francisco"));
    }

    #[test]
    fn empty_phrase_yields_empty_result() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let result = search("   ", &index, &rtxn, None).unwrap();
        assert!(result.best_doc_id.is_none());
    }

    #[test]
    fn multi_word_place_name_matches() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let result = search("chelsea municipal airport", &index, &rtxn, None).unwrap();
        let place = index.documents.get(&rtxn, result.best_doc_id.unwrap()).unwrap().unwrap();
        assert_eq!(place.common_name, "Chelsea Municipal Airport");
    }

    #[test]
    fn nonsense_query_yields_no_match() {
        let (_dir, index) = build_sample_index();
        let rtxn = index.env.read_txn().unwrap();
        let result = search("zzxxqqwwjjkk", &index, &rtxn, None).unwrap();
        assert!(result.best_doc_id.is_none());
    }
}

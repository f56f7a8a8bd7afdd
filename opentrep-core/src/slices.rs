//! Splits a query into independent slices, each expected to resolve to a
//! separate place.

use std::sync::atomic::AtomicBool;

use heed::RoTxn;

use crate::cancel;
use crate::error::OpenTrepResult;
use crate::matcher;
use crate::store::Index;

/// Whether `phrase` probes as a known POR: its exact OR-query alone (no
/// spelling correction or shrinking) clears the acceptance bar. Correction
/// and shrinking are deliberately not consulted here — letting
/// them in would make an unrelated trailing word look like it still belongs
/// to the buffer (it would "correct" or "shrink" its way to a match), which
/// defeats slicing.
fn probes_as_known_por(phrase: &str, index: &Index, rtxn: &RoTxn) -> OpenTrepResult<bool> {
    matcher::exact_probe(phrase, index, rtxn)
}

/// Greedily grows a slice one word at a time, probing the index for the
/// current buffer; on a word whose addition breaks the match, the slice is
/// closed at the previous word and a new slice starts at that word.
/// Guarantees: contiguous, non-overlapping, covers the whole query;
/// minimum slice count preferred (the greedy grow-until-break strategy
/// naturally maximizes each slice before closing it).
///
/// `cancel`, when set, is checked once a slice closes (spec.md §5's
/// "cooperative-cancellable between slices").
pub fn query_slices(query: &str, index: &Index, rtxn: &RoTxn, cancel: Option<&AtomicBool>) -> OpenTrepResult<Vec<String>> {
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let mut slices = Vec::new();
    let mut slice_start = 0usize;
    // Exclusive end of the longest prefix of the current slice, starting at
    // `slice_start`, known to probe successfully so far.
    let mut matched_end = slice_start;

    for i in 0..words.len() {
        let candidate = words[slice_start..=i].join(" ");
        if probes_as_known_por(&candidate, index, rtxn)? {
            matched_end = i + 1;
            continue;
        }

        if matched_end > slice_start {
            // Word `i` broke the match: close the slice at the previous word.
            slices.push(words[slice_start..matched_end].join(" "));
            slice_start = matched_end;
            cancel::check(cancel)?;

            let restarted = words[slice_start..=i].join(" ");
            matched_end = if probes_as_known_por(&restarted, index, rtxn)? { i + 1 } else { slice_start };
        }

        // Nothing has matched yet even as a single word: keep growing so the
        // slice always makes progress and every word ends up in some slice.
        if matched_end == slice_start {
            matched_end = i + 1;
        }
    }

    if slice_start < words.len() {
        slices.push(words[slice_start..].join(" "));
    }

    Ok(slices)
}

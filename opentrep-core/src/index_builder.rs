//! Parses a POR file, builds [`Place`] objects, and writes documents plus
//! spelling terms into the persistent index, all within one transaction.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{OpenTrepError, OpenTrepResult};
use crate::por_parser::parse_por_line;
use crate::store::{DocIndex, Index};

/// Outcome of one `build_index` call: how many documents were indexed, and
/// how many lines were skipped as malformed, both accessible to the caller
/// after the build completes rather than only logged in passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBuildReport {
    pub entries: u64,
    pub skipped: u64,
}

/// Clears `index_path`, opens a single write transaction, parses every
/// non-empty POR line, skips malformed lines and `"NotAvailable"` records
/// (counted, not propagated), and commits once at the end.
pub fn build_index(por_path: &Path, index_path: &Path) -> OpenTrepResult<IndexBuildReport> {
    if !por_path.is_file() {
        return Err(OpenTrepError::FileNotFound(por_path.to_path_buf()));
    }

    let file = std::fs::File::open(por_path)
        .map_err(|_| OpenTrepError::FileNotFound(por_path.to_path_buf()))?;
    let reader = BufReader::new(file);

    let index = Index::create_fresh(index_path)?;
    let mut wtxn = index.env.write_txn().map_err(OpenTrepError::IndexWriteError)?;

    let mut entries: u64 = 0;
    let mut skipped: u64 = 0;
    let mut next_doc_id: u64 = 0;
    let mut spelling_terms: Vec<String> = Vec::new();
    let mut postings_acc: BTreeMap<String, Vec<DocIndex>> = BTreeMap::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line_number = line_number as u64 + 1;
        let line = line.map_err(|e| OpenTrepError::IndexWriteError(heed::Error::Io(e)))?;
        if line.trim().is_empty() {
            continue;
        }

        let place = match parse_por_line(&line) {
            Ok(Some(place)) => place,
            Ok(None) => continue, // "NotAvailable" sentinel: skip silently, not a malformed line.
            Err(reason) => {
                // Recoverable per spec.md §7: recorded as a `ParseError` for
                // its `Display` message, then skipped and counted rather than
                // propagated.
                let error = OpenTrepError::ParseError { line: line_number, reason };
                warn!(%error, "skipping malformed POR line");
                skipped += 1;
                continue;
            }
        };

        let (term_set, spelling_set) = place.build_index_sets();

        let doc_id = next_doc_id;
        next_doc_id += 1;

        for (word_index, term) in term_set.iter().enumerate() {
            postings_acc
                .entry(term.clone())
                .or_default()
                .push(DocIndex { doc_id, word_index: word_index as u16 });
        }

        spelling_terms.extend(spelling_set);

        index.documents.put(&mut wtxn, doc_id, &place).map_err(|e| match e {
            OpenTrepError::IndexReadError(src) => OpenTrepError::IndexWriteError(src),
            other => other,
        })?;

        entries += 1;
    }

    for (term, indexes) in postings_acc {
        index.postings.put(&mut wtxn, &term, &indexes).map_err(|e| match e {
            OpenTrepError::IndexReadError(src) => OpenTrepError::IndexWriteError(src),
            other => other,
        })?;
    }

    spelling_terms.sort();
    spelling_terms.dedup();
    let words_fst = fst::Set::from_iter(spelling_terms)
        .map_err(|_| OpenTrepError::IndexWriteError(heed::Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "duplicate or unsorted spelling terms",
        ))))?;

    index.main.put_words_fst(&mut wtxn, &words_fst).map_err(|e| match e {
        OpenTrepError::IndexReadError(src) => OpenTrepError::IndexWriteError(src),
        other => other,
    })?;
    index.main.put_number_of_entries(&mut wtxn, entries).map_err(|e| match e {
        OpenTrepError::IndexReadError(src) => OpenTrepError::IndexWriteError(src),
        other => other,
    })?;
    index.main.put_next_doc_id(&mut wtxn, next_doc_id).map_err(|e| match e {
        OpenTrepError::IndexReadError(src) => OpenTrepError::IndexWriteError(src),
        other => other,
    })?;

    wtxn.commit().map_err(OpenTrepError::IndexWriteError)?;

    info!(entries, skipped, "index build complete");
    Ok(IndexBuildReport { entries, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_por_file(dir: &Path, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.join("por.csv");
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn sample_line(iata: &str, name: &str) -> String {
        format!(
            "{iata}^L{iata}^^1000000^{name}^{name}^^0.0^0.0^S^AIRP^FR^EU^^^Europe/Paris^0.5^A^{iata}"
        )
    }

    #[test]
    fn builds_an_index_from_well_formed_lines() {
        let dir = tempdir().unwrap();
        let por_path = write_por_file(dir.path(), &[
            &sample_line("NCE", "Nice"),
            &sample_line("SFO", "San Francisco"),
        ]);
        let index_path = dir.path().join("index");

        let report = build_index(&por_path, &index_path).unwrap();
        assert_eq!(report.entries, 2);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn skips_malformed_lines_without_failing_the_build() {
        let dir = tempdir().unwrap();
        let por_path = write_por_file(dir.path(), &[
            &sample_line("NCE", "Nice"),
            "not^enough^fields",
        ]);
        let index_path = dir.path().join("index");

        let report = build_index(&por_path, &index_path).unwrap();
        assert_eq!(report.entries, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn missing_por_file_is_a_fatal_error() {
        let dir = tempdir().unwrap();
        let por_path = dir.path().join("missing.csv");
        let index_path = dir.path().join("index");

        assert!(matches!(build_index(&por_path, &index_path), Err(OpenTrepError::FileNotFound(_))));
    }
}

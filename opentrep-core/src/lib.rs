//! The query resolution pipeline for the opentrep point-of-reference search
//! engine: an indexer that builds a persistent full-text index with a
//! spelling dictionary from a POR reference file, and a matcher that slices
//! a free-text travel query, runs fuzzy indexed retrieval, and composes the
//! per-slice results into a best whole-query answer.

mod automaton;
mod cancel;
mod describe;
mod error;
mod index_builder;
mod matcher;
mod matching_documents;
mod partition;
mod place;
mod por_parser;
mod result;
mod slices;
mod store;

pub use self::describe::Describe;
pub use self::error::{OpenTrepError, OpenTrepResult};
pub use self::index_builder::{build_index, IndexBuildReport};
pub use self::matcher::{P_MISS, T_EXACT};
pub use self::matching_documents::MatchingDocuments;
pub use self::partition::{string_partitions, word_combinations, Partition};
pub use self::place::{AlternateName, Place, PlaceKey, PorType, NOT_AVAILABLE};
pub use self::por_parser::parse_por_line;
pub use self::result::{ResultCombination, ResultHolder};
pub use self::slices::query_slices;
pub use self::store::Index;

use std::path::Path;
use std::sync::atomic::AtomicBool;

/// Opens the persistent index read-only and resolves `raw_query` against it.
/// An empty or whitespace-only query yields an empty [`ResultCombination`]
/// rather than an error, same as a query every one of whose slices misses.
pub fn resolve_query(index_path: &Path, raw_query: &str) -> OpenTrepResult<ResultCombination> {
    resolve_query_cancellable(index_path, raw_query, None)
}

/// Same as [`resolve_query`], but cooperatively cancellable: `cancel`, when
/// set, is checked between slices and between a slice's matcher retries
/// (spec.md §5). A flag observed set at a checkpoint aborts the call with
/// `OpenTrepError::Cancelled`.
pub fn resolve_query_cancellable(index_path: &Path, raw_query: &str, cancel: Option<&AtomicBool>) -> OpenTrepResult<ResultCombination> {
    let index = Index::open(index_path)?;
    let rtxn = index.env.read_txn()?;
    ResultCombination::resolve_cancellable(raw_query, &index, &rtxn, cancel)
}

/// The core consumes only this trait to turn a `doc_id` back into a
/// displayable record. A relational mirror with key-based lookups by
/// IATA/ICAO/FAA/Geonames ID lives entirely outside the core's scope; the
/// `Index` impl below is the one concrete source of truth it ships with.
pub trait PorLookup {
    fn by_doc_id(&self, doc_id: u64) -> Option<Place>;
}

impl PorLookup for Index {
    fn by_doc_id(&self, doc_id: u64) -> Option<Place> {
        let rtxn = self.env.read_txn().ok()?;
        self.documents.get(&rtxn, doc_id).ok().flatten()
    }
}

use heed::types::{SerdeBincode, Str};
use heed::{Database, Env, RoTxn, RwTxn};
use serde::{Deserialize, Serialize};

use crate::error::OpenTrepResult;

const DB_NAME: &str = "opentrep-postings";

/// One occurrence of a term in a document: which document, and at which
/// word position within the fields that were tokenized into terms. Keeping
/// positions (rather than just a doc id) is what lets `words_proximity`-style
/// scoring work, even though this crate's scorer only uses term weight —
/// positions are carried here for future criteria a phrase-aware scorer
/// could add without a storage-format change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocIndex {
    pub doc_id: u64,
    pub word_index: u16,
}

/// term bytes -> sorted, deduplicated list of `DocIndex`. This is both the
/// inverted index used for exact OR-queries and the destination for every
/// term the indexer generates while walking a POR record's fields.
#[derive(Clone, Copy)]
pub struct Postings {
    db: Database<Str, SerdeBincode<Vec<DocIndex>>>,
}

impl Postings {
    pub(super) fn create(env: &Env, wtxn: &mut RwTxn) -> OpenTrepResult<Postings> {
        let db = env.create_database(wtxn, Some(DB_NAME))?;
        Ok(Postings { db })
    }

    pub fn put(&self, wtxn: &mut RwTxn, term: &str, indexes: &[DocIndex]) -> OpenTrepResult<()> {
        let mut indexes = indexes.to_vec();
        indexes.sort_by_key(|d| (d.doc_id, d.word_index));
        indexes.dedup();
        self.db.put(wtxn, term, &indexes)?;
        Ok(())
    }

    pub fn get(&self, rtxn: &RoTxn, term: &str) -> OpenTrepResult<Vec<DocIndex>> {
        Ok(self.db.get(rtxn, term)?.unwrap_or_default())
    }
}

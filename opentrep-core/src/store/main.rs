use heed::types::{Bytes, Str};
use heed::{Database, Env, RoTxn, RwTxn};

use crate::error::{OpenTrepError, OpenTrepResult};

const DB_NAME: &str = "opentrep-main";
const WORDS_FST_KEY: &str = "words-fst";
const NUMBER_OF_ENTRIES_KEY: &str = "number-of-entries";
const NEXT_DOC_ID_KEY: &str = "next-doc-id";

/// The spelling dictionary and a handful of global counters.
///
/// The spelling dictionary is stored as the raw bytes of an `fst::Set`: an
/// FST is itself a compact, ordered, on-disk-friendly representation, so no
/// further encoding is needed.
#[derive(Clone, Copy)]
pub struct Main {
    db: Database<Str, Bytes>,
}

impl Main {
    pub(super) fn create(env: &Env, wtxn: &mut RwTxn) -> OpenTrepResult<Main> {
        let db = env.create_database(wtxn, Some(DB_NAME))?;
        Ok(Main { db })
    }

    pub fn put_words_fst(&self, wtxn: &mut RwTxn, fst: &fst::Set<Vec<u8>>) -> OpenTrepResult<()> {
        self.db.put(wtxn, WORDS_FST_KEY, fst.as_fst().as_bytes())?;
        Ok(())
    }

    pub fn words_fst(&self, rtxn: &RoTxn) -> OpenTrepResult<fst::Set<Vec<u8>>> {
        match self.db.get(rtxn, WORDS_FST_KEY)? {
            Some(bytes) => fst::Set::new(bytes.to_vec()).map_err(|_| {
                OpenTrepError::IndexReadError(heed::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "corrupt spelling dictionary",
                )))
            }),
            None => Ok(fst::Set::from_iter(std::iter::empty::<&[u8]>())
                .expect("building an fst::Set from an empty iterator cannot fail")),
        }
    }

    pub fn put_number_of_entries(&self, wtxn: &mut RwTxn, count: u64) -> OpenTrepResult<()> {
        self.db.put(wtxn, NUMBER_OF_ENTRIES_KEY, &count.to_be_bytes())?;
        Ok(())
    }

    pub fn number_of_entries(&self, rtxn: &RoTxn) -> OpenTrepResult<u64> {
        match self.db.get(rtxn, NUMBER_OF_ENTRIES_KEY)? {
            Some(bytes) => Ok(u64::from_be_bytes(bytes.try_into().unwrap_or_default())),
            None => Ok(0),
        }
    }

    pub fn put_next_doc_id(&self, wtxn: &mut RwTxn, next: u64) -> OpenTrepResult<()> {
        self.db.put(wtxn, NEXT_DOC_ID_KEY, &next.to_be_bytes())?;
        Ok(())
    }

    pub fn next_doc_id(&self, rtxn: &RoTxn) -> OpenTrepResult<u64> {
        match self.db.get(rtxn, NEXT_DOC_ID_KEY)? {
            Some(bytes) => Ok(u64::from_be_bytes(bytes.try_into().unwrap_or_default())),
            None => Ok(0),
        }
    }
}

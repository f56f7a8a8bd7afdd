//! The persistent index: a directory on disk, opaque to the caller, wrapping
//! one `heed` (LMDB) environment.
//!
//! Three named sub-databases: `Main` holds the spelling dictionary (an
//! `fst::Set`) and bookkeeping counters, `Postings` holds term -> positions
//! (term indexing with positions, OR-query support), `Documents` holds
//! doc_id -> opaque serialized [`Place`] payload. LMDB gives multi-reader/
//! single-writer and transactions for free: many read-only transactions may
//! run concurrently against the last committed snapshot while a single
//! `RwTxn` is open.

mod documents;
mod main;
mod postings;

pub use documents::Documents;
pub use main::Main;
pub use postings::{DocIndex, Postings};

use std::fs;
use std::path::Path;

use heed::EnvOpenOptions;

use crate::error::{OpenTrepError, OpenTrepResult};

/// A handle onto the three sub-databases that make up one persistent index.
#[derive(Clone)]
pub struct Index {
    pub env: heed::Env,
    pub main: Main,
    pub postings: Postings,
    pub documents: Documents,
}

impl Index {
    /// Opens an existing index directory, or creates it if absent, without
    /// clearing it. Used by the matcher (read-only callers).
    pub fn open(index_path: &Path) -> OpenTrepResult<Index> {
        fs::create_dir_all(index_path).map_err(|_| OpenTrepError::IndexReadError(heed::Error::Io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "cannot create index directory"),
        )))?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(10 * 1024 * 1024 * 1024)
                .max_dbs(3)
                .open(index_path)
        }?;

        let mut wtxn = env.write_txn()?;
        let main = Main::create(&env, &mut wtxn)?;
        let postings = Postings::create(&env, &mut wtxn)?;
        let documents = Documents::create(&env, &mut wtxn)?;
        wtxn.commit()?;

        Ok(Index { env, main, postings, documents })
    }

    /// Clears `index_path` (removing the directory if present) and creates
    /// a fresh, empty index in its place. Used by the indexer, which always
    /// rebuilds from scratch rather than appending to a stale index.
    pub fn create_fresh(index_path: &Path) -> OpenTrepResult<Index> {
        if index_path.exists() {
            fs::remove_dir_all(index_path)
                .map_err(|e| OpenTrepError::IndexWriteError(heed::Error::Io(e)))?;
        }
        fs::create_dir_all(index_path)
            .map_err(|e| OpenTrepError::IndexWriteError(heed::Error::Io(e)))?;

        Self::open(index_path)
    }
}

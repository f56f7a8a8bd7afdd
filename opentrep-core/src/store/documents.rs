use heed::types::{SerdeBincode, U64};
use heed::{byteorder::BigEndian, Database, Env, RoTxn, RwTxn};

use crate::error::OpenTrepResult;
use crate::place::Place;

const DB_NAME: &str = "opentrep-documents";

/// doc_id -> the opaque, serialized [`Place`] payload.
#[derive(Clone, Copy)]
pub struct Documents {
    db: Database<U64<BigEndian>, SerdeBincode<Place>>,
}

impl Documents {
    pub(super) fn create(env: &Env, wtxn: &mut RwTxn) -> OpenTrepResult<Documents> {
        let db = env.create_database(wtxn, Some(DB_NAME))?;
        Ok(Documents { db })
    }

    pub fn put(&self, wtxn: &mut RwTxn, doc_id: u64, place: &Place) -> OpenTrepResult<()> {
        self.db.put(wtxn, &doc_id, place)?;
        Ok(())
    }

    pub fn get(&self, rtxn: &RoTxn, doc_id: u64) -> OpenTrepResult<Option<Place>> {
        Ok(self.db.get(rtxn, &doc_id)?)
    }
}

//! Result assembly
//!
//! Fetches the records behind resolved root keys in one batch call. A key
//! whose record has gone away is reported, never dropped.

use std::collections::BTreeSet;
use std::sync::Arc;

use rolodex_core::{Error, Record, RecordKey, RecordStore, Result};
use tracing::warn;

/// Batch-fetches root records for delivery
pub struct ResultAssembler<S: RecordStore + ?Sized> {
    store: Arc<S>,
}

impl<S: RecordStore + ?Sized> ResultAssembler<S> {
    /// Create an assembler over `store`
    pub fn new(store: Arc<S>) -> Self {
        ResultAssembler { store }
    }

    /// Records for `keys`, in key order
    ///
    /// # Errors
    ///
    /// `MissingRecords` lists every key with no record (a stale index hit);
    /// store failures are returned as-is.
    pub fn fetch(&self, keys: &BTreeSet<RecordKey>) -> Result<Vec<Record>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<RecordKey> = keys.iter().copied().collect();
        let fetched = self.store.get_batch(&keys)?;

        let mut records = Vec::with_capacity(keys.len());
        let mut missing = Vec::new();
        for (key, slot) in keys.iter().zip(fetched) {
            match slot {
                Some(record) => records.push(record),
                None => missing.push(*key),
            }
        }

        if !missing.is_empty() {
            warn!(
                target: "rolodex::search",
                missing = missing.len(),
                "Search hit keys with no record"
            );
            return Err(Error::MissingRecords { keys: missing });
        }
        Ok(records)
    }
}

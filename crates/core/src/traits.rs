//! Core traits for storage abstraction
//!
//! This module defines the `RecordStore` trait: the hierarchical key-value
//! store the indexing and search layers are written against. Swapping the
//! in-memory store for another backend must not change search behavior.

use crate::error::Result;
use crate::key::RecordKey;
use crate::record::Record;
use crate::types::Kind;

/// Inclusive lexicographic range over a multi-valued indexed field
///
/// The range query is keys-only; `keys_only = false` is rejected by stores
/// that cannot project full records out of an index scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRangeQuery {
    /// Kind to scan (kindless index queries are not supported)
    pub kind: Kind,
    /// Indexed field name
    pub field: String,
    /// Inclusive lower bound
    pub lower: String,
    /// Inclusive upper bound
    pub upper: String,
    /// Only keys are wanted
    pub keys_only: bool,
}

/// Storage abstraction for records
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync). Every call is blocking and
/// single-record writes are atomic; there are no cross-call transactions.
pub trait RecordStore: Send + Sync {
    /// Get a record by key
    ///
    /// Returns None if no record exists under the key.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the storage operation fails.
    fn get(&self, key: &RecordKey) -> Result<Option<Record>>;

    /// Write a record, assigning an id if its key is incomplete
    ///
    /// Returns the key the record is stored under.
    ///
    /// # Errors
    ///
    /// Returns `KeyResolution` for a child whose parent does not exist,
    /// or `StoreUnavailable` if the storage operation fails.
    fn put(&self, record: Record) -> Result<RecordKey>;

    /// Write several records in one all-or-nothing call
    ///
    /// Returns keys in input order.
    fn put_batch(&self, records: Vec<Record>) -> Result<Vec<RecordKey>>;

    /// A root record followed by all of its children
    ///
    /// Returns an empty vector when the root does not exist.
    fn query_by_ancestor(&self, root: &RecordKey) -> Result<Vec<Record>>;

    /// Keys of records of `query.kind` with at least one indexed value in range
    ///
    /// Each key appears once even if several of its values fall in range.
    fn query_by_index_range(&self, query: &IndexRangeQuery) -> Result<Vec<RecordKey>>;

    /// Fetch many records at once
    ///
    /// The result has one slot per requested key, `None` where the key has
    /// no record.
    fn get_batch(&self, keys: &[RecordKey]) -> Result<Vec<Option<Record>>>;

    /// Up to `limit` records of `kind` with keys strictly after `after`, in key order
    fn query_kind(&self, kind: Kind, after: Option<&RecordKey>, limit: usize) -> Result<Vec<Record>>;
}

//! MemoryStore: in-memory record store with BTreeMap and a token index
//!
//! This module implements the RecordStore trait using:
//! - `BTreeMap<RecordKey, Record>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for monotonically increasing record ids
//! - A secondary token index for prefix range scans over `words`
//!
//! # Design Notes
//!
//! - **Key order is hierarchy order**: a person and its children are
//!   contiguous, so ancestor queries are a single range scan.
//! - **Id allocation before write lock**: ids are shared across kinds and
//!   never reused, even if the write then fails.
//! - **Index updated under the same locks as data**: a reader never sees a
//!   record whose index entries are stale.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

use rolodex_core::{
    Error, IndexRangeQuery, Kind, Record, RecordKey, RecordStore, Result, TOKENS_FIELD,
};

use crate::index::TokenIndex;

/// In-memory hierarchical record store
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`.
/// All indices are updated atomically with the main data store within the
/// same write lock.
#[derive(Debug)]
pub struct MemoryStore {
    /// The main data store: ordered map from RecordKey to Record
    data: RwLock<BTreeMap<RecordKey, Record>>,
    /// Secondary index: (Kind, token) → Keys
    tokens: RwLock<TokenIndex>,
    /// Last id handed out
    last_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty MemoryStore
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            tokens: RwLock::new(TokenIndex::new()),
            last_id: AtomicU64::new(0),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Remove one record and its index entries
    ///
    /// Children of a deleted person are left in place; tidying them up is
    /// the caller's job. Returns the removed record if it existed.
    pub fn delete(&self, key: &RecordKey) -> Option<Record> {
        let mut data = self.data.write();
        let mut tokens = self.tokens.write();
        let removed = data.remove(key)?;
        tokens.remove(key, removed.tokens());
        debug!(target: "rolodex::store", key = %key, "Record deleted");
        Some(removed)
    }

    /// Allocate the next id atomically
    fn next_id(&self) -> u64 {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Keep caller-supplied ids out of the allocator's way
    fn reserve_id(&self, id: u64) {
        self.last_id.fetch_max(id, Ordering::SeqCst);
    }

    /// Reject a child whose parent is neither stored nor about to be
    fn check_parent(
        data: &BTreeMap<RecordKey, Record>,
        record: &Record,
        pending_roots: &[RecordKey],
    ) -> Result<()> {
        if let Some(parent) = record.key().parent() {
            if !data.contains_key(&parent) && !pending_roots.contains(&parent) {
                return Err(Error::key_resolution(format!(
                    "parent {} of {} does not exist",
                    parent,
                    record.key()
                )));
            }
        }
        Ok(())
    }

    /// Final key for a record about to be written
    fn resolve_key(&self, record: &mut Record) -> Result<RecordKey> {
        let key = if record.key().is_incomplete() {
            record.key().with_id(self.next_id())
        } else {
            self.reserve_id(record.key().id());
            *record.key()
        };
        record.assign_key(key)?;
        Ok(key)
    }

    /// Write one record with its index entries; caller holds both write locks
    fn apply(data: &mut BTreeMap<RecordKey, Record>, tokens: &mut TokenIndex, record: Record) {
        let key = *record.key();
        if let Some(previous) = data.get(&key) {
            tokens.remove(&key, previous.tokens());
        }
        tokens.insert(key, record.tokens());
        data.insert(key, record);
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, mut record: Record) -> Result<RecordKey> {
        let key = self.resolve_key(&mut record)?;

        let mut data = self.data.write();
        let mut tokens = self.tokens.write();
        Self::check_parent(&data, &record, &[])?;
        Self::apply(&mut data, &mut tokens, record);

        trace!(target: "rolodex::store", key = %key, "Record written");
        Ok(key)
    }

    fn put_batch(&self, records: Vec<Record>) -> Result<Vec<RecordKey>> {
        let mut prepared = Vec::with_capacity(records.len());
        for mut record in records {
            self.resolve_key(&mut record)?;
            prepared.push(record);
        }
        let roots: Vec<RecordKey> = prepared
            .iter()
            .map(|r| *r.key())
            .filter(RecordKey::is_root)
            .collect();

        // Acquire ALL locks ONCE for the entire batch
        let mut data = self.data.write();
        let mut tokens = self.tokens.write();
        for record in &prepared {
            Self::check_parent(&data, record, &roots)?;
        }

        let keys: Vec<RecordKey> = prepared.iter().map(|r| *r.key()).collect();
        for record in prepared {
            Self::apply(&mut data, &mut tokens, record);
        }

        debug!(target: "rolodex::store", count = keys.len(), "Batch written");
        Ok(keys)
    }

    fn query_by_ancestor(&self, root: &RecordKey) -> Result<Vec<Record>> {
        let data = self.data.read();
        if !root.is_root() {
            return Ok(data.get(root).cloned().into_iter().collect());
        }
        if !data.contains_key(root) {
            return Ok(Vec::new());
        }
        Ok(data
            .range(*root..)
            .take_while(|(k, _)| k.root() == *root)
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn query_by_index_range(&self, query: &IndexRangeQuery) -> Result<Vec<RecordKey>> {
        if query.field != TOKENS_FIELD {
            return Err(Error::InvalidOperation(format!(
                "field '{}' is not indexed for range queries",
                query.field
            )));
        }
        if !query.keys_only {
            return Err(Error::InvalidOperation(
                "index range queries are keys-only".to_string(),
            ));
        }
        let keys = self
            .tokens
            .read()
            .range(query.kind, &query.lower, &query.upper);
        Ok(keys.into_iter().collect())
    }

    fn get_batch(&self, keys: &[RecordKey]) -> Result<Vec<Option<Record>>> {
        let data = self.data.read();
        Ok(keys.iter().map(|k| data.get(k).cloned()).collect())
    }

    fn query_kind(&self, kind: Kind, after: Option<&RecordKey>, limit: usize) -> Result<Vec<Record>> {
        let data = self.data.read();
        let start = match after {
            Some(k) => Bound::Excluded(*k),
            None => Bound::Unbounded,
        };
        Ok(data
            .range((start, Bound::Unbounded))
            .filter(|(k, _)| k.kind() == kind)
            .take(limit)
            .map(|(_, r)| r.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolodex_core::{FieldValue, Privilege, TokenSet};

    fn tokens(words: &[&str]) -> TokenSet {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn range_query(kind: Kind, lower: &str, upper: &str) -> IndexRangeQuery {
        IndexRangeQuery {
            kind,
            field: TOKENS_FIELD.to_string(),
            lower: lower.to_string(),
            upper: upper.to_string(),
            keys_only: true,
        }
    }

    fn stored_person(store: &MemoryStore, words: &[&str]) -> RecordKey {
        let mut person = Record::new_person();
        person.replace_tokens(tokens(words));
        store.put(person).unwrap()
    }

    #[test]
    fn test_put_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = stored_person(&store, &[]);
        let b = stored_person(&store, &[]);
        assert!(!a.is_incomplete());
        assert!(b.id() > a.id());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_put_with_supplied_key_reserves_id() {
        let store = MemoryStore::new();
        store.put(Record::new(RecordKey::person(40))).unwrap();
        let next = stored_person(&store, &[]);
        assert!(next.id() > 40);
    }

    #[test]
    fn test_put_child_requires_parent() {
        let store = MemoryStore::new();
        let orphan = Record::new_child(Kind::Contact, &RecordKey::person(9)).unwrap();
        let err = store.put(orphan).unwrap_err();
        assert!(err.is_key_resolution());
        assert!(store.is_empty());
    }

    #[test]
    fn test_overwrite_replaces_index_entries() {
        let store = MemoryStore::new();
        let key = stored_person(&store, &["boston"]);

        let mut person = store.get(&key).unwrap().unwrap();
        person.replace_tokens(tokens(&["seattle"]));
        store.put(person).unwrap();

        let q = range_query(Kind::Person, "boston", "boston");
        assert!(store.query_by_index_range(&q).unwrap().is_empty());
        let q = range_query(Kind::Person, "seattle", "seattle");
        assert_eq!(store.query_by_index_range(&q).unwrap(), vec![key]);
    }

    #[test]
    fn test_query_by_ancestor_returns_root_then_children() {
        let store = MemoryStore::new();
        let a = stored_person(&store, &[]);
        let b = stored_person(&store, &[]);
        let mut address = Record::new_child(Kind::Address, &a).unwrap();
        address
            .set("City", FieldValue::text("Boston"), Privilege::User)
            .unwrap();
        store.put(address).unwrap();
        store.put(Record::new_child(Kind::Contact, &b).unwrap()).unwrap();

        let family = store.query_by_ancestor(&a).unwrap();
        assert_eq!(family.len(), 2);
        assert_eq!(family[0].key(), &a);
        assert_eq!(family[1].kind(), Kind::Address);
        assert_eq!(family[1].key().parent(), Some(a));
    }

    #[test]
    fn test_query_by_ancestor_missing_root() {
        let store = MemoryStore::new();
        assert!(store
            .query_by_ancestor(&RecordKey::person(3))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_index_range_rejects_unindexed_field() {
        let store = MemoryStore::new();
        let mut q = range_query(Kind::Person, "a", "b");
        q.field = "comments".to_string();
        assert!(matches!(
            store.query_by_index_range(&q),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_put_batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        let person = stored_person(&store, &["fred"]);
        let mut edited = store.get(&person).unwrap().unwrap();
        edited.replace_tokens(tokens(&["frederick"]));
        let orphan = Record::new_child(Kind::Contact, &RecordKey::person(77)).unwrap();

        assert!(store.put_batch(vec![edited, orphan]).is_err());
        let unchanged = store.get(&person).unwrap().unwrap();
        assert_eq!(unchanged.tokens(), &tokens(&["fred"]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_batch_accepts_parent_in_same_batch() {
        let store = MemoryStore::new();
        let root = Record::new(RecordKey::person(10));
        let child = Record::new_child(Kind::Calendar, &RecordKey::person(10)).unwrap();
        let keys = store.put_batch(vec![root, child]).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].parent(), Some(RecordKey::person(10)));
    }

    #[test]
    fn test_get_batch_marks_misses() {
        let store = MemoryStore::new();
        let a = stored_person(&store, &[]);
        let got = store.get_batch(&[a, RecordKey::person(999)]).unwrap();
        assert!(got[0].is_some());
        assert!(got[1].is_none());
    }

    #[test]
    fn test_query_kind_pages_after_cursor() {
        let store = MemoryStore::new();
        let keys: Vec<RecordKey> = (0..5).map(|_| stored_person(&store, &[])).collect();
        store.put(Record::new_child(Kind::Contact, &keys[0]).unwrap()).unwrap();

        let first = store.query_kind(Kind::Person, None, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].key(), &keys[0]);

        let rest = store
            .query_kind(Kind::Person, Some(first[1].key()), 10)
            .unwrap();
        assert_eq!(rest.len(), 3);
        assert!(rest.iter().all(|r| r.kind() == Kind::Person));
    }

    #[test]
    fn test_delete_removes_index_entries() {
        let store = MemoryStore::new();
        let key = stored_person(&store, &["boston"]);
        assert!(store.delete(&key).is_some());
        let q = range_query(Kind::Person, "boston", "boston");
        assert!(store.query_by_index_range(&q).unwrap().is_empty());
        assert!(store.delete(&key).is_none());
    }
}

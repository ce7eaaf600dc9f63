//! Record index maintainer
//!
//! The only writer of a record's token set. Every save goes through
//! [`IndexMaintainer::reindex_and_persist`], which recomputes the tokens from
//! the current field values and writes the record in the same store call.
//! Tokens are replaced wholesale; there is no incremental diffing.

use std::sync::Arc;

use rolodex_core::{ClassificationMap, Error, Kind, Record, RecordKey, RecordStore, Result, Schema};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::tokenizer::tokenize;

/// Outcome of a bulk re-index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Keys the records were persisted under, in input order
    pub keys: Vec<RecordKey>,
    /// How many records ended up with a different token set
    pub changed: usize,
}

impl BatchReport {
    /// Records whose tokens were already current
    pub fn unchanged(&self) -> usize {
        self.keys.len() - self.changed
    }
}

/// Recomputes and persists record token sets
pub struct IndexMaintainer<S: RecordStore + ?Sized> {
    store: Arc<S>,
    classes: FxHashMap<Kind, ClassificationMap>,
}

impl<S: RecordStore + ?Sized> IndexMaintainer<S> {
    /// Maintainer using the standard classification table of every kind
    pub fn new(store: Arc<S>) -> Self {
        let classes = Kind::ALL
            .iter()
            .map(|kind| (*kind, Schema::standard(*kind).classifications()))
            .collect();
        IndexMaintainer { store, classes }
    }

    /// Replace the classification table for the schema's kind
    pub fn with_schema(mut self, schema: &Schema) -> Self {
        self.classes.insert(schema.kind(), schema.classifications());
        self
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Classification table in use for `kind`
    pub fn classifications(&self, kind: Kind) -> Option<&ClassificationMap> {
        self.classes.get(&kind)
    }

    /// Recompute the tokens of `record` in place
    ///
    /// Returns true if the token set changed.
    pub fn reindex(&self, record: &mut Record) -> bool {
        let tokens = self
            .classes
            .get(&record.kind())
            .map(|classes| tokenize(record.fields(), classes))
            .unwrap_or_default();
        let changed = &tokens != record.tokens();
        record.replace_tokens(tokens);
        changed
    }

    /// Recompute tokens and write the record in one store call
    ///
    /// Returns the key the record is stored under, which is newly assigned
    /// when the record had an incomplete key.
    ///
    /// # Errors
    ///
    /// Store failures are returned as-is; nothing is persisted in that case.
    pub fn reindex_and_persist(&self, mut record: Record) -> Result<RecordKey> {
        let changed = self.reindex(&mut record);
        let tokens = record.tokens().len();
        let key = self.store.put(record)?;
        debug!(target: "rolodex::index", key = %key, tokens, changed, "Record reindexed");
        Ok(key)
    }

    /// Recompute tokens for already-fetched records and write them in one batch
    ///
    /// Every record is written, changed or not.
    ///
    /// # Errors
    ///
    /// A failed write is reported as `BatchInterrupted` listing the keys that
    /// were to be written, so an operator can resume.
    pub fn reindex_batch(&self, records: Vec<Record>) -> Result<BatchReport> {
        if records.is_empty() {
            return Ok(BatchReport::default());
        }

        let mut changed = 0;
        let mut pending = Vec::with_capacity(records.len());
        let mut batch = Vec::with_capacity(records.len());
        for mut record in records {
            if self.reindex(&mut record) {
                changed += 1;
            }
            pending.push(*record.key());
            batch.push(record);
        }

        match self.store.put_batch(batch) {
            Ok(keys) => {
                debug!(
                    target: "rolodex::index",
                    records = keys.len(),
                    changed,
                    "Batch reindexed"
                );
                Ok(BatchReport { keys, changed })
            }
            Err(e) => {
                warn!(
                    target: "rolodex::index",
                    pending = pending.len(),
                    error = %e,
                    "Batch reindex write failed"
                );
                Err(Error::BatchInterrupted {
                    completed: 0,
                    pending,
                    source: Box::new(e),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolodex_core::{FieldClass, FieldSpec, FieldValue, Privilege};
    use rolodex_storage::testing::{FaultyStore, Op};
    use rolodex_storage::MemoryStore;

    fn maintainer() -> IndexMaintainer<MemoryStore> {
        IndexMaintainer::new(Arc::new(MemoryStore::new()))
    }

    fn person(first: &str, last: &str) -> Record {
        let mut p = Record::new_person();
        p.set("FirstName", FieldValue::text(first), Privilege::User)
            .unwrap();
        p.set("LastName", FieldValue::text(last), Privilege::User)
            .unwrap();
        p
    }

    #[test]
    fn test_reindex_replaces_tokens() {
        let m = maintainer();
        let mut p = person("Fred", "Sauer");
        assert!(m.reindex(&mut p));
        assert!(p.tokens().contains("fred"));
        assert!(p.tokens().contains("sauer"));
        assert!(p.tokens().contains("enabled"));
        assert!(p.tokens().contains("category=unspecified"));

        p.set("FirstName", FieldValue::text("Frederick"), Privilege::User)
            .unwrap();
        assert!(m.reindex(&mut p));
        assert!(!p.tokens().contains("fred"));
        assert!(p.tokens().contains("frederick"));
    }

    #[test]
    fn test_reindex_unchanged_reports_false() {
        let m = maintainer();
        let mut p = person("Fred", "Sauer");
        m.reindex(&mut p);
        assert!(!m.reindex(&mut p));
    }

    #[test]
    fn test_reindex_and_persist_assigns_key() {
        let m = maintainer();
        let key = m.reindex_and_persist(person("Ann", "Lee")).unwrap();
        assert!(!key.is_incomplete());

        let stored = m.store().get(&key).unwrap().unwrap();
        assert!(stored.tokens().contains("ann"));
    }

    #[test]
    fn test_stale_tokens_are_overwritten_on_save() {
        let m = maintainer();
        let mut p = person("Ann", "Lee");
        let mut stale = p.tokens().clone();
        stale.insert("bogus".to_string());
        p.replace_tokens(stale);

        let key = m.reindex_and_persist(p).unwrap();
        let stored = m.store().get(&key).unwrap().unwrap();
        assert!(!stored.tokens().contains("bogus"));
    }

    #[test]
    fn test_custom_schema_internal_field() {
        let schema = Schema::new(
            Kind::Contact,
            vec![
                FieldSpec::text("ContactText"),
                FieldSpec::internal("ImportId"),
            ],
        );
        let m = maintainer().with_schema(&schema);
        assert_eq!(
            m.classifications(Kind::Contact).unwrap().get("ImportId"),
            Some(&FieldClass::Internal)
        );

        let parent = m.reindex_and_persist(person("A", "B")).unwrap();
        let mut contact = Record::with_schema(
            RecordKey::incomplete_child(Kind::Contact, &parent).unwrap(),
            &schema,
        );
        contact
            .set_with_schema(&schema, "ImportId", FieldValue::text("legacy42"), Privilege::Admin)
            .unwrap();
        contact
            .set_with_schema(&schema, "ContactText", FieldValue::text("a@b.org"), Privilege::User)
            .unwrap();
        m.reindex(&mut contact);
        assert!(!contact.tokens().contains("legacy42"));
        assert!(contact.tokens().contains("org"));
    }

    #[test]
    fn test_batch_writes_all_records() {
        let m = maintainer();
        let a = m.reindex_and_persist(person("Ann", "Lee")).unwrap();
        let b = m.reindex_and_persist(person("Bob", "Ray")).unwrap();

        let mut records = m.store().get_batch(&[a, b]).unwrap();
        let mut first = records.remove(0).unwrap();
        first
            .set("Comments", FieldValue::text("moved"), Privilege::User)
            .unwrap();
        let second = records.remove(0).unwrap();

        let report = m.reindex_batch(vec![first, second]).unwrap();
        assert_eq!(report.keys, vec![a, b]);
        assert_eq!(report.changed, 1);
        assert_eq!(report.unchanged(), 1);
        assert!(m.store().get(&a).unwrap().unwrap().tokens().contains("moved"));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let m = maintainer();
        let report = m.reindex_batch(Vec::new()).unwrap();
        assert!(report.keys.is_empty());
    }

    #[test]
    fn test_store_failure_surfaces() {
        let store = Arc::new(FaultyStore::new(MemoryStore::new()));
        store.fail_after(Op::Put, 0);
        let m = IndexMaintainer::new(Arc::clone(&store));
        let err = m.reindex_and_persist(person("Ann", "Lee")).unwrap_err();
        assert!(err.is_store_unavailable());
        assert!(store.inner().is_empty());
    }

    #[test]
    fn test_batch_failure_reports_pending_keys() {
        let store = Arc::new(FaultyStore::new(MemoryStore::new()));
        let m = IndexMaintainer::new(Arc::clone(&store));
        let a = m.reindex_and_persist(person("Ann", "Lee")).unwrap();
        let b = m.reindex_and_persist(person("Bob", "Ray")).unwrap();
        let records: Vec<Record> = store
            .get_batch(&[a, b])
            .unwrap()
            .into_iter()
            .flatten()
            .collect();

        store.fail_after(Op::PutBatch, 0);
        match m.reindex_batch(records) {
            Err(Error::BatchInterrupted {
                completed,
                pending,
                source,
            }) => {
                assert_eq!(completed, 0);
                assert_eq!(pending, vec![a, b]);
                assert!(source.is_store_unavailable());
            }
            other => panic!("expected BatchInterrupted, got {:?}", other),
        }
    }
}

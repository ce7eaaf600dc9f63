//! The `Rolodex` facade
//!
//! Owns the store, the index maintainer and the word search, and exposes
//! the record operations the surrounding application calls: create, load,
//! edit, save, view and search. Every write goes through the maintainer so
//! a stored record's tokens always match its fields.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use rolodex_core::{Error, FieldValue, Kind, Privilege, Record, RecordKey, RecordStore, Result};
use rolodex_search::{AncestorResolver, IndexMaintainer, WordSearch};
use rolodex_storage::MemoryStore;
use tracing::{debug, info};

use crate::config::RolodexConfig;

/// Person, address, contact and calendar records with word search
///
/// # Example
///
/// ```
/// use rolodex_core::{FieldValue, Kind, Privilege};
/// use rolodex_engine::Rolodex;
///
/// let rolodex = Rolodex::ephemeral();
///
/// let mut person = rolodex.new_person();
/// person.set("LastName", FieldValue::text("Sauer"), Privilege::User).unwrap();
/// let key = rolodex.save(person).unwrap();
///
/// let mut contact = rolodex.new_child(Kind::Contact, &key).unwrap();
/// contact.set("ContactText", FieldValue::text("fred@example.com"), Privilege::User).unwrap();
/// rolodex.save(contact).unwrap();
///
/// let found = rolodex.search("sauer example").unwrap();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].key(), &key);
/// ```
pub struct Rolodex<S: RecordStore + ?Sized = MemoryStore> {
    store: Arc<S>,
    maintainer: IndexMaintainer<S>,
    search: WordSearch<S>,
    config: RolodexConfig,
}

impl Rolodex<MemoryStore> {
    /// In-memory rolodex with default configuration
    pub fn ephemeral() -> Self {
        Rolodex::assemble(Arc::new(MemoryStore::new()), RolodexConfig::default())
    }

    /// In-memory rolodex configured from `rolodex.toml` in `dir`
    ///
    /// The file is created with defaults if missing.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Config` if the config cannot be written, read or validated.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let config = RolodexConfig::load_or_create(dir)?;
        info!(
            target: "rolodex::config",
            path = %dir.display(),
            batch = config.reindex_batch_size,
            "Opened rolodex"
        );
        Ok(Rolodex::assemble(Arc::new(MemoryStore::new()), config))
    }
}

impl<S: RecordStore + ?Sized> Rolodex<S> {
    /// Rolodex over an existing store
    ///
    /// # Errors
    ///
    /// Returns `Config` if `config` does not validate.
    pub fn with_store(store: Arc<S>, config: RolodexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Rolodex::assemble(store, config))
    }

    fn assemble(store: Arc<S>, config: RolodexConfig) -> Self {
        Rolodex {
            maintainer: IndexMaintainer::new(Arc::clone(&store)),
            search: WordSearch::new(Arc::clone(&store)),
            store,
            config,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &RolodexConfig {
        &self.config
    }

    pub(crate) fn maintainer(&self) -> &IndexMaintainer<S> {
        &self.maintainer
    }

    /// Every record of `kind` in key order, read in pages of `reindex_batch_size`
    pub(crate) fn scan_kind(&self, kind: Kind) -> Result<Vec<Record>> {
        let limit = self.config.reindex_batch_size;
        let mut all = Vec::new();
        let mut after: Option<RecordKey> = None;
        loop {
            let page = self.store.query_kind(kind, after.as_ref(), limit)?;
            let full = page.len() == limit;
            after = page.last().map(|r| *r.key());
            all.extend(page);
            if !full {
                break;
            }
        }
        debug!(target: "rolodex::store", kind = %kind, records = all.len(), "Scanned kind");
        Ok(all)
    }

    /// A blank person with schema defaults; not stored until saved
    pub fn new_person(&self) -> Record {
        Record::new_person()
    }

    /// A blank child of an existing person; not stored until saved
    ///
    /// # Errors
    ///
    /// `KeyResolution` if `kind` is `Person` or `parent` is not a stored person.
    pub fn new_child(&self, kind: Kind, parent: &RecordKey) -> Result<Record> {
        let child = Record::new_child(kind, parent)?;
        if self.store.get(parent)?.is_none() {
            return Err(Error::key_resolution(format!(
                "parent {} does not exist",
                parent
            )));
        }
        Ok(child)
    }

    /// Load one record
    ///
    /// # Errors
    ///
    /// `KeyResolution` if no record is stored under `key`.
    pub fn load(&self, key: &RecordKey) -> Result<Record> {
        self.store
            .get(key)?
            .ok_or_else(|| Error::key_resolution(format!("no record for {}", key)))
    }

    /// Load a record by its text-encoded key, e.g. `Person:12/Contact:7`
    pub fn load_encoded(&self, encoded: &str) -> Result<Record> {
        let key = RecordKey::decode(encoded)?;
        self.load(&key)
    }

    /// Re-tokenize and persist a record; returns its (possibly new) key
    pub fn save(&self, record: Record) -> Result<RecordKey> {
        let kind = record.kind();
        let key = self.maintainer.reindex_and_persist(record)?;
        debug!(target: "rolodex::index", key = %key, kind = %kind, "Saved");
        Ok(key)
    }

    /// Load a record, apply every edit, and save it
    ///
    /// Edits are validated against the kind's schema; the first invalid
    /// edit aborts the whole call and nothing is written.
    pub fn edit<I, N>(&self, key: &RecordKey, edits: I, privilege: Privilege) -> Result<RecordKey>
    where
        I: IntoIterator<Item = (N, FieldValue)>,
        N: AsRef<str>,
    {
        let mut record = self.load(key)?;
        for (name, value) in edits {
            record.set(name.as_ref(), value, privilege)?;
        }
        self.save(record)
    }

    /// A person followed by all of its children
    ///
    /// A child key shows its whole family.
    ///
    /// # Errors
    ///
    /// `KeyResolution` if the person does not exist.
    pub fn view(&self, key: &RecordKey) -> Result<Vec<Record>> {
        let root = AncestorResolver::to_root(key);
        let family = self.store.query_by_ancestor(&root)?;
        if family.is_empty() {
            return Err(Error::key_resolution(format!("no person {}", root)));
        }
        Ok(family)
    }

    /// People matching every word of `phrase` as a prefix, in key order
    pub fn search(&self, phrase: &str) -> Result<Vec<Record>> {
        self.search.search(phrase)
    }

    /// Keys of people matching `phrase`
    pub fn search_keys(&self, phrase: &str) -> Result<BTreeSet<RecordKey>> {
        self.search.search_keys(phrase)
    }
}

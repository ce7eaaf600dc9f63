//! Word indexing and search for the rolodex
//!
//! This crate provides:
//! - Tokenizer deriving a record's token set from its fields
//! - IndexMaintainer, the only writer of token sets
//! - WordQueryPlanner for multi-term prefix queries (AND across terms)
//! - AncestorResolver mapping child hits to their person
//! - ResultAssembler batch-fetching the matched people
//! - WordSearch composing planner and assembler
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use rolodex_core::{FieldValue, Privilege, Record};
//! use rolodex_search::{IndexMaintainer, WordSearch};
//! use rolodex_storage::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let maintainer = IndexMaintainer::new(Arc::clone(&store));
//!
//! let mut person = Record::new_person();
//! person.set("LastName", FieldValue::text("Sauer"), Privilege::User).unwrap();
//! maintainer.reindex_and_persist(person).unwrap();
//!
//! let found = WordSearch::new(store).search("sau").unwrap();
//! assert_eq!(found.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod maintainer;
pub mod planner;
pub mod resolver;
pub mod tokenizer;

use std::collections::BTreeSet;
use std::sync::Arc;

use rolodex_core::{Record, RecordKey, RecordStore, Result};

// Re-export commonly used types
pub use assembler::ResultAssembler;
pub use maintainer::{BatchReport, IndexMaintainer};
pub use planner::{normalize_phrase, prefix_bounds, WordQueryPlanner, PREFIX_SENTINEL};
pub use resolver::AncestorResolver;
pub use tokenizer::{split_words, tokenize};

/// Phrase search returning full person records
pub struct WordSearch<S: RecordStore + ?Sized> {
    planner: WordQueryPlanner<S>,
    assembler: ResultAssembler<S>,
}

impl<S: RecordStore + ?Sized> WordSearch<S> {
    /// Search over `store`
    pub fn new(store: Arc<S>) -> Self {
        WordSearch {
            planner: WordQueryPlanner::new(Arc::clone(&store)),
            assembler: ResultAssembler::new(store),
        }
    }

    /// People matching every term of `phrase`, in key order
    ///
    /// # Errors
    ///
    /// Store failures abort the search. A matched key with no record
    /// surfaces as `MissingRecords`.
    pub fn search(&self, phrase: &str) -> Result<Vec<Record>> {
        let keys = self.planner.search(phrase)?;
        self.assembler.fetch(&keys)
    }

    /// Root keys only, without fetching records
    pub fn search_keys(&self, phrase: &str) -> Result<BTreeSet<RecordKey>> {
        self.planner.search(phrase)
    }
}

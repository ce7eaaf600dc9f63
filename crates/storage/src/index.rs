//! Secondary token index
//!
//! Maps Kind → (token → Set<RecordKey>) so a prefix lookup over the
//! `words` field is a `BTreeMap::range` scan instead of a full table walk.
//! Kept per kind because word queries are issued per kind.

use rolodex_core::{Kind, RecordKey, TokenSet};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Secondary index: (Kind, token) → Keys
#[derive(Debug, Default)]
pub struct TokenIndex {
    index: FxHashMap<Kind, BTreeMap<String, BTreeSet<RecordKey>>>,
}

impl TokenIndex {
    /// Create a new empty TokenIndex
    pub fn new() -> Self {
        Self {
            index: FxHashMap::default(),
        }
    }

    /// Add every token of a record
    pub fn insert(&mut self, key: RecordKey, tokens: &TokenSet) {
        let by_token = self.index.entry(key.kind()).or_default();
        for token in tokens {
            by_token.entry(token.clone()).or_default().insert(key);
        }
    }

    /// Remove every token of a record
    ///
    /// Empty sets are dropped so that range scans never see stale tokens.
    pub fn remove(&mut self, key: &RecordKey, tokens: &TokenSet) {
        let kind = key.kind();
        if let Some(by_token) = self.index.get_mut(&kind) {
            for token in tokens {
                if let Some(keys) = by_token.get_mut(token) {
                    keys.remove(key);
                    if keys.is_empty() {
                        by_token.remove(token);
                    }
                }
            }
            if by_token.is_empty() {
                self.index.remove(&kind);
            }
        }
    }

    /// Keys of `kind` with a token in `[lower, upper]`, each once, in key order
    pub fn range(&self, kind: Kind, lower: &str, upper: &str) -> BTreeSet<RecordKey> {
        let mut keys = BTreeSet::new();
        if lower > upper {
            return keys;
        }
        if let Some(by_token) = self.index.get(&kind) {
            let bounds = (
                Bound::Included(lower.to_string()),
                Bound::Included(upper.to_string()),
            );
            for (_, matched) in by_token.range::<String, _>(bounds) {
                keys.extend(matched.iter().copied());
            }
        }
        keys
    }

    /// Number of distinct tokens for a kind
    pub fn token_count(&self, kind: Kind) -> usize {
        self.index.get(&kind).map_or(0, BTreeMap::len)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

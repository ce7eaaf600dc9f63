//! Ancestor resolution
//!
//! Every key the search layer hands back is a root (`Person`) key. Index
//! hits on child records are converted here and nowhere else.

use std::collections::BTreeSet;

use rolodex_core::RecordKey;

/// Maps matched keys to their owning root key
#[derive(Debug, Clone, Copy, Default)]
pub struct AncestorResolver;

impl AncestorResolver {
    /// Root key of `key`
    ///
    /// A `Person` key is its own root; a child resolves to its parent.
    /// Keys nest at most one level, so this is a single step.
    pub fn to_root(key: &RecordKey) -> RecordKey {
        match key.parent() {
            Some(parent) => parent,
            None => *key,
        }
    }

    /// Root keys of every key in `keys`, de-duplicated
    pub fn resolve_all<'a, I>(keys: I) -> BTreeSet<RecordKey>
    where
        I: IntoIterator<Item = &'a RecordKey>,
    {
        keys.into_iter().map(Self::to_root).collect()
    }
}

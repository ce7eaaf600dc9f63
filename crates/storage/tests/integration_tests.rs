//! Integration tests for the storage layer
//!
//! These tests verify that MemoryStore works correctly as a complete system:
//! - Storage operations under concurrent access
//! - Token index consistency with stored records
//! - Range scans agree with a brute-force prefix filter

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use rolodex_core::{IndexRangeQuery, Kind, Record, RecordKey, RecordStore, TokenSet, TOKENS_FIELD};
use rolodex_storage::MemoryStore;

// ============================================================================
// Helper Functions
// ============================================================================

fn tokens<S: AsRef<str>>(words: &[S]) -> TokenSet {
    words.iter().map(|w| w.as_ref().to_string()).collect()
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

fn put_person(store: &MemoryStore, words: &[&str]) -> RecordKey {
    let mut person = Record::new_person();
    person.replace_tokens(tokens(words));
    store.put(person).unwrap()
}

fn put_child(store: &MemoryStore, kind: Kind, parent: &RecordKey, words: &[&str]) -> RecordKey {
    let mut child = Record::new_child(kind, parent).unwrap();
    child.replace_tokens(tokens(words));
    store.put(child).unwrap()
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn test_concurrent_puts_get_distinct_ids() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| put_person(&store, &["same"]))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = BTreeSet::new();
        for handle in handles {
            for key in handle.join().unwrap() {
                assert!(all.insert(key), "duplicate key {}", key);
            }
        }
        assert_eq!(all.len(), 400);
        assert_eq!(store.len(), 400);

        let hits = store
            .query_by_index_range(&range_query(Kind::Person, "same", "same"))
            .unwrap();
        assert_eq!(hits.len(), 400);
    }

    #[test]
    fn test_readers_never_see_half_written_index() {
        let store = Arc::new(MemoryStore::new());
        let key = put_person(&store, &["alpha"]);

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..200 {
                    let mut person = store.get(&key).unwrap().unwrap();
                    let word = if i % 2 == 0 { "beta" } else { "alpha" };
                    person.replace_tokens(tokens(&[word]));
                    store.put(person).unwrap();
                }
            })
        };

        for _ in 0..200 {
            let alpha = store
                .query_by_index_range(&range_query(Kind::Person, "alpha", "alpha"))
                .unwrap();
            let beta = store
                .query_by_index_range(&range_query(Kind::Person, "beta", "beta"))
                .unwrap();
            // One write at a time: the key is in at most one of the two sets
            // per scan, and each scan sees a consistent index.
            assert!(alpha.len() <= 1 && beta.len() <= 1);
        }
        writer.join().unwrap();
    }
}

// ============================================================================
// Hierarchy Tests
// ============================================================================

mod hierarchy {
    use super::*;

    #[test]
    fn test_ancestor_query_isolates_people() {
        let store = MemoryStore::new();
        let a = put_person(&store, &[]);
        let b = put_person(&store, &[]);
        for kind in [Kind::Address, Kind::Contact, Kind::Calendar] {
            put_child(&store, kind, &a, &[]);
        }
        put_child(&store, Kind::Contact, &b, &[]);

        let family_a = store.query_by_ancestor(&a).unwrap();
        assert_eq!(family_a.len(), 4);
        assert!(family_a.iter().all(|r| r.key().root() == a));

        let family_b = store.query_by_ancestor(&b).unwrap();
        assert_eq!(family_b.len(), 2);
    }

    #[test]
    fn test_ancestor_query_on_child_returns_child() {
        let store = MemoryStore::new();
        let a = put_person(&store, &[]);
        let c = put_child(&store, Kind::Contact, &a, &[]);
        let result = store.query_by_ancestor(&c).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].key(), &c);
    }
}

// ============================================================================
// Range Scan Properties
// ============================================================================

fn word() -> impl Strategy<Value = String> {
    "[a-d]{1,4}"
}

proptest! {
    #[test]
    fn prop_range_matches_prefix_filter(
        people in prop::collection::vec(prop::collection::vec(word(), 0..4), 1..12),
        prefix in word(),
    ) {
        let store = MemoryStore::new();
        let mut expected = BTreeSet::new();
        for words in &people {
            let key = put_person(&store, &words.iter().map(String::as_str).collect::<Vec<_>>());
            if words.iter().any(|w| w.starts_with(prefix.as_str())) {
                expected.insert(key);
            }
        }

        let upper = format!("{}{}", prefix, char::MAX);
        let hits: BTreeSet<RecordKey> = store
            .query_by_index_range(&range_query(Kind::Person, &prefix, &upper))
            .unwrap()
            .into_iter()
            .collect();
        prop_assert_eq!(hits, expected);
    }
}

// ============================================================================
// Stress (use #[ignore])
// ============================================================================

mod stress {
    use super::*;
    use std::time::Instant;

    /// Run with: cargo test --release -- --ignored test_hundred_thousand_people
    #[test]
    #[ignore]
    fn test_hundred_thousand_people() {
        let store = MemoryStore::new();
        let start = Instant::now();
        for i in 0..100_000u64 {
            let word = format!("w{:05}", i % 1000);
            let key = put_person(&store, &[word.as_str()]);
            put_child(&store, Kind::Contact, &key, &["gmail"]);
        }
        println!("Inserted 200K records in {:?}", start.elapsed());

        let hits = store
            .query_by_index_range(&range_query(Kind::Person, "w00001", "w00001"))
            .unwrap();
        assert_eq!(hits.len(), 100);
    }
}

//! Testing utilities for callers of the record store
//!
//! - **FaultyStore**: wraps any `RecordStore` and fails chosen operations
//!   on demand, to exercise error propagation in indexing, search and bulk
//!   maintenance.
//!
//! # Example
//!
//! ```
//! use rolodex_core::{RecordKey, RecordStore};
//! use rolodex_storage::testing::{FaultyStore, Op};
//! use rolodex_storage::MemoryStore;
//!
//! let store = FaultyStore::new(MemoryStore::new());
//! store.fail_after(Op::Get, 0);
//! assert!(store.get(&RecordKey::person(1)).is_err());
//! ```

mod faulty;

pub use faulty::{FaultyStore, Op};

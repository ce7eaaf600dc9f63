//! Storage layer for the rolodex
//!
//! This crate implements the record store backend with:
//! - MemoryStore: BTreeMap-based storage with RwLock
//! - TokenIndex: per-kind secondary index over record tokens
//! - Id allocation with AtomicU64
//! - FaultyStore: fault injection for tests of the layers above

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod memory;
pub mod testing;

pub use index::TokenIndex;
pub use memory::MemoryStore;

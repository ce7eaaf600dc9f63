//! Core types and traits for the rolodex
//!
//! This crate defines the foundational types used throughout the system:
//! - Kind: Record type tag (Person, Address, Contact, Calendar)
//! - RecordKey: Two-level hierarchical key with a text encoding
//! - FieldValue: Typed field values
//! - Schema: Per-kind field classification tables
//! - Record: A stored entity and its derived token set
//! - Error: Error type hierarchy
//! - RecordStore: Storage trait consumed by indexing and search

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod record;
pub mod schema;
pub mod traits;
pub mod types;
pub mod value;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use key::{KeyError, RecordKey};
pub use record::{Record, TokenSet, TOKENS_FIELD};
pub use schema::{ClassificationMap, FieldClass, FieldSpec, Privilege, Schema, ENABLED_FIELD};
pub use traits::{IndexRangeQuery, RecordStore};
pub use types::Kind;
pub use value::{format_date, FieldValue, DATE_FORMAT};

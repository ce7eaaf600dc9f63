//! Rolodex - personal contact, address and event book with word search
//!
//! Records form a two-level tree: a Person owns Address, Contact and
//! Calendar records. Every save derives a token set from the record's
//! fields; a search phrase matches people for whom every word is a prefix
//! of some token on the person or one of its children.
//!
//! # Quick Start
//!
//! ```
//! use rolodex::{FieldValue, Kind, Privilege, Rolodex};
//!
//! let rolodex = Rolodex::ephemeral();
//!
//! let mut person = rolodex.new_person();
//! person.set("FirstName", FieldValue::text("Fred"), Privilege::User)?;
//! let key = rolodex.save(person)?;
//!
//! let mut address = rolodex.new_child(Kind::Address, &key)?;
//! address.set("City", FieldValue::text("Boston"), Privilege::User)?;
//! rolodex.save(address)?;
//!
//! assert_eq!(rolodex.search("fred bos")?.len(), 1);
//! # Ok::<(), rolodex::Error>(())
//! ```
//!
//! # Architecture
//!
//! The [`Rolodex`] facade is the entry point. Lower layers are re-exported
//! for callers that bring their own store or drive indexing directly.

pub use rolodex_core::{
    Error, FieldClass, FieldValue, Kind, Privilege, Record, RecordKey, RecordStore, Result,
    Schema,
};
pub use rolodex_engine::{DueEvent, FixAllPage, FixReport, MailingRow, Rolodex, RolodexConfig};
pub use rolodex_search::{IndexMaintainer, WordSearch};
pub use rolodex_storage::MemoryStore;

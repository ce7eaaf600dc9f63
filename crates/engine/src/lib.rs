//! Rolodex engine
//!
//! This crate ties the lower layers together:
//! - Rolodex: create, load, edit, save, view and search records
//! - Configuration via `rolodex.toml`
//! - Bulk maintenance: re-index one person or page through all of them
//! - Events of the day and the greeting-card mailing list
//!
//! The engine is the only component that knows about:
//! - Which store backs the rolodex
//! - Batch sizing and continuation of bulk re-index runs
//! - Data repairs applied while re-indexing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod events;
pub mod mailing;
pub mod maintenance;
pub mod rolodex;

pub use config::{RolodexConfig, CONFIG_FILE_NAME};
pub use events::{recurs_on, DueEvent};
pub use mailing::{locality_line, MailingRow, ADDRESS_PLACEHOLDER};
pub use maintenance::{repair_date, FixAllPage, FixReport};
pub use rolodex::Rolodex;

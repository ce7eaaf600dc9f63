//! Error types for the rolodex
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Store failures and key-resolution failures are kept apart so callers can
//! decide to skip a dangling key while still failing loudly on an outage.

use crate::key::{KeyError, RecordKey};
use std::io;
use thiserror::Error;

/// Result type alias for rolodex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the rolodex
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying store call failed. Never retried internally.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A key could not be decoded, or it names a record that does not exist
    #[error("Key resolution failed: {0}")]
    KeyResolution(String),

    /// A batch fetch reported keys with no record behind them
    #[error("Missing records: {}", format_keys(.keys))]
    MissingRecords {
        /// Keys that resolved to nothing, in request order
        keys: Vec<RecordKey>,
    },

    /// A field edit was rejected by the kind's schema
    #[error("Invalid field {field}: {reason}")]
    InvalidField {
        /// Field name as given by the caller
        field: String,
        /// Why the edit was rejected
        reason: String,
    },

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A bulk write stopped part way through
    #[error("Batch interrupted after {completed} record(s), {} pending: {source}", .pending.len())]
    BatchInterrupted {
        /// Records persisted before the failure
        completed: usize,
        /// Keys that were not persisted, in processing order
        pending: Vec<RecordKey>,
        /// The failure that stopped the batch
        #[source]
        source: Box<Error>,
    },

    /// Configuration could not be read or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (config file access)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn format_keys(keys: &[RecordKey]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create a store failure from any displayable cause
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Error::StoreUnavailable(msg.into())
    }

    /// Create a key-resolution failure
    pub fn key_resolution(msg: impl Into<String>) -> Self {
        Error::KeyResolution(msg.into())
    }

    /// Create an invalid-field failure
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for failures a caller may treat as a stale index (skip) rather than fatal
    pub fn is_key_resolution(&self) -> bool {
        match self {
            Error::KeyResolution(_) | Error::MissingRecords { .. } => true,
            Error::BatchInterrupted { source, .. } => source.is_key_resolution(),
            _ => false,
        }
    }

    /// True if the root cause is the store itself
    pub fn is_store_unavailable(&self) -> bool {
        match self {
            Error::StoreUnavailable(_) => true,
            Error::BatchInterrupted { source, .. } => source.is_store_unavailable(),
            _ => false,
        }
    }
}

impl From<KeyError> for Error {
    fn from(e: KeyError) -> Self {
        Error::KeyResolution(e.to_string())
    }
}

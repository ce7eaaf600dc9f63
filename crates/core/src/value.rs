//! Field values
//!
//! A record's fields are a name → `FieldValue` map. The variant says how the
//! value is stored; the kind's schema says how it is classified for editing
//! and indexing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Date format used for parsing, display and index tokens
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Free text
    Text(String),
    /// Boolean flag
    Flag(bool),
    /// Calendar date, `None` for the zero date
    Date(Option<NaiveDate>),
    /// One value out of a bounded choice set
    Choice(String),
}

impl FieldValue {
    /// Text value from anything string-like
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Choice value from anything string-like
    pub fn choice(s: impl Into<String>) -> Self {
        FieldValue::Choice(s.into())
    }

    /// Parse a `YYYY-MM-DD` date; the empty string is the zero date
    pub fn parse_date(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(FieldValue::Date(None));
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(|d| FieldValue::Date(Some(d)))
            .map_err(|e| Error::invalid_field("date", format!("failed to parse date {:?}: {}", s, e)))
    }

    /// True when the value carries nothing worth indexing or displaying
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => s.is_empty(),
            FieldValue::Flag(_) => false,
            FieldValue::Date(d) => d.is_none(),
        }
    }

    /// String content of text and choice values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => Some(s),
            _ => None,
        }
    }

    /// Flag value
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Date value (`Some(None)` is the zero date)
    pub fn as_date(&self) -> Option<Option<NaiveDate>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Short variant name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Flag(_) => "flag",
            FieldValue::Date(_) => "date",
            FieldValue::Choice(_) => "choice",
        }
    }
}

/// Format a date the way it is displayed and indexed
pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

//! Record kinds
//!
//! Every record carries a `Kind` tag. `Person` is the root kind; the other
//! three only ever appear as direct children of a `Person`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type tag of a record
///
/// Ordering: Person < Address < Contact < Calendar. Children of one person
/// are grouped by kind in this order when keys are sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum Kind {
    /// Root record: a person or organisation
    Person,
    /// Postal address of a person
    Address,
    /// Phone number, email, URL, ...
    Contact,
    /// Recurring event (birthday, anniversary)
    Calendar,
}

impl Kind {
    /// All kinds, in the order word queries visit them
    pub const ALL: [Kind; 4] = [Kind::Person, Kind::Address, Kind::Contact, Kind::Calendar];

    /// Exact kind name as used in encoded keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Person => "Person",
            Kind::Address => "Address",
            Kind::Contact => "Contact",
            Kind::Calendar => "Calendar",
        }
    }

    /// True only for the root kind
    pub fn is_root(&self) -> bool {
        matches!(self, Kind::Person)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A string that names no kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown kind '{0}'")]
pub struct UnknownKind(pub String);

//! Hierarchical record keys
//!
//! A key is either a root `Person` key or a child key that embeds its
//! parent's id. The tree is exactly two levels deep, so a child key never
//! needs more than one parent.
//!
//! ## Encoding
//!
//! - `Person:12`
//! - `Person:12/Contact:7`
//!
//! Id `0` marks an incomplete key (not yet assigned by the store). Only the
//! last segment may be incomplete: a child always points at a stored parent.

use crate::types::Kind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Key of a stored (or about to be stored) record
///
/// # Ordering
///
/// Keys sort by person id first, then the person itself before its
/// children, then children by (kind, id). All records of one person are
/// therefore contiguous, which turns ancestor queries into range scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    person: u64,
    child: Option<ChildKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
struct ChildKey {
    kind: Kind,
    id: u64,
}

impl RecordKey {
    /// Key of a person with the given id
    pub fn person(id: u64) -> Self {
        RecordKey {
            person: id,
            child: None,
        }
    }

    /// Key for a person not yet stored
    pub fn incomplete_person() -> Self {
        Self::person(0)
    }

    /// Key of a child record under `parent`
    pub fn child(kind: Kind, id: u64, parent: &RecordKey) -> Result<Self, KeyError> {
        if kind.is_root() {
            return Err(KeyError::ChildIsPerson);
        }
        if !parent.is_root() {
            return Err(KeyError::TooDeep);
        }
        if parent.is_incomplete() {
            return Err(KeyError::IncompleteParent);
        }
        Ok(RecordKey {
            person: parent.person,
            child: Some(ChildKey { kind, id }),
        })
    }

    /// Key for a child not yet stored
    pub fn incomplete_child(kind: Kind, parent: &RecordKey) -> Result<Self, KeyError> {
        Self::child(kind, 0, parent)
    }

    /// Kind of the record this key names
    pub fn kind(&self) -> Kind {
        match self.child {
            Some(c) => c.kind,
            None => Kind::Person,
        }
    }

    /// Id of the last segment (0 when incomplete)
    pub fn id(&self) -> u64 {
        match self.child {
            Some(c) => c.id,
            None => self.person,
        }
    }

    /// True for `Person` keys
    pub fn is_root(&self) -> bool {
        self.child.is_none()
    }

    /// True if the store has not assigned an id yet
    pub fn is_incomplete(&self) -> bool {
        self.id() == 0
    }

    /// Parent key, `None` for a person
    pub fn parent(&self) -> Option<RecordKey> {
        self.child.map(|_| RecordKey::person(self.person))
    }

    /// Owning person key (the key itself for a person)
    pub fn root(&self) -> RecordKey {
        RecordKey::person(self.person)
    }

    /// Same kind and parent, with a store-assigned id
    pub fn with_id(&self, id: u64) -> RecordKey {
        match self.child {
            Some(c) => RecordKey {
                person: self.person,
                child: Some(ChildKey { kind: c.kind, id }),
            },
            None => RecordKey::person(id),
        }
    }

    /// Text form, see module docs
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse the text form produced by [`RecordKey::encode`]
    pub fn decode(s: &str) -> Result<Self, KeyError> {
        if s.is_empty() {
            return Err(KeyError::Empty);
        }

        let mut segments = s.split('/');
        let (root_kind, person) = parse_segment(segments.next().unwrap_or_default())?;
        if !root_kind.is_root() {
            return Err(KeyError::RootNotPerson(root_kind));
        }
        let root = RecordKey::person(person);

        let key = match segments.next() {
            None => root,
            Some(segment) => {
                let (kind, id) = parse_segment(segment)?;
                RecordKey::child(kind, id, &root)?
            }
        };

        if segments.next().is_some() {
            return Err(KeyError::TooDeep);
        }
        Ok(key)
    }
}

fn parse_segment(segment: &str) -> Result<(Kind, u64), KeyError> {
    let (kind, id) = segment
        .split_once(':')
        .ok_or_else(|| KeyError::Malformed(segment.to_string()))?;
    let kind = kind
        .parse::<Kind>()
        .map_err(|e| KeyError::UnknownKind(e.0))?;
    let id = id
        .parse::<u64>()
        .map_err(|_| KeyError::BadId(id.to_string()))?;
    Ok((kind, id))
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", Kind::Person, self.person)?;
        if let Some(c) = self.child {
            write!(f, "/{}:{}", c.kind, c.id)?;
        }
        Ok(())
    }
}

impl FromStr for RecordKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKey::decode(s)
    }
}

/// Key decoding and construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Encoded key is empty
    #[error("key cannot be empty")]
    Empty,

    /// Segment is not `Kind:id`
    #[error("malformed key segment '{0}'")]
    Malformed(String),

    /// Segment names an unknown kind
    #[error("unknown kind '{0}'")]
    UnknownKind(String),

    /// Segment id is not an unsigned integer
    #[error("invalid id '{0}'")]
    BadId(String),

    /// First segment is not a person
    #[error("root must be a Person, got {0}")]
    RootNotPerson(Kind),

    /// A person cannot be the child of another record
    #[error("a Person cannot have a parent")]
    ChildIsPerson,

    /// More than one level of nesting
    #[error("keys are at most two levels deep")]
    TooDeep,

    /// Parent id was never assigned
    #[error("parent key is incomplete")]
    IncompleteParent,
}

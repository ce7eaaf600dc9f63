//! Per-kind field classification tables
//!
//! Each kind has a fixed table of fields. The classification decides how a
//! field is edited and how it is tokenized:
//!
//! | Class        | Tokens                                   |
//! |--------------|------------------------------------------|
//! | `PlainText`  | every word, plus the parts of `a=b` words |
//! | `Flag`       | the field name, only when true            |
//! | `Date`       | `YYYY-MM-DD`, unless zero                 |
//! | `Enumerated` | `field=value`, parentheses stripped       |
//! | `Internal`   | none                                     |
//!
//! Field names are part of the search vocabulary (`sendcard`,
//! `category=relatives`), so renaming a field changes what users can find.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::types::Kind;
use crate::value::FieldValue;

/// How a field is edited and indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldClass {
    /// Free text, split into words
    PlainText,
    /// Boolean flag
    Flag,
    /// Calendar date
    Date,
    /// Bounded choice set
    Enumerated,
    /// Never indexed; editable with admin privilege only
    Internal,
}

/// Field name → classification, the Tokenizer's view of a schema
pub type ClassificationMap = BTreeMap<String, FieldClass>;

/// Who is editing a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Privilege {
    /// Regular end user
    #[default]
    User,
    /// Elevated privilege; may edit internal fields
    Admin,
}

/// One row of a classification table
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Classification
    pub class: FieldClass,
    /// Allowed values for enumerated fields
    pub choices: Vec<String>,
    /// Value a new record starts with
    pub default: FieldValue,
}

impl FieldSpec {
    /// Plain text field, empty by default
    pub fn text(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            class: FieldClass::PlainText,
            choices: Vec::new(),
            default: FieldValue::text(""),
        }
    }

    /// Flag field with the given default
    pub fn flag(name: &str, default: bool) -> Self {
        FieldSpec {
            name: name.to_string(),
            class: FieldClass::Flag,
            choices: Vec::new(),
            default: FieldValue::Flag(default),
        }
    }

    /// Date field, zero by default
    pub fn date(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            class: FieldClass::Date,
            choices: Vec::new(),
            default: FieldValue::Date(None),
        }
    }

    /// Enumerated field defaulting to its first choice
    pub fn enumerated(name: &str, choices: &[&str]) -> Self {
        let default = choices.first().copied().unwrap_or_default();
        FieldSpec {
            name: name.to_string(),
            class: FieldClass::Enumerated,
            choices: choices.iter().map(|c| c.to_string()).collect(),
            default: FieldValue::choice(default),
        }
    }

    /// Internal text field
    pub fn internal(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            class: FieldClass::Internal,
            choices: Vec::new(),
            default: FieldValue::text(""),
        }
    }

    fn accepts(&self, value: &FieldValue) -> bool {
        match (self.class, value) {
            (FieldClass::PlainText, FieldValue::Text(_)) => true,
            (FieldClass::Flag, FieldValue::Flag(_)) => true,
            (FieldClass::Date, FieldValue::Date(_)) => true,
            (FieldClass::Enumerated, FieldValue::Choice(_)) => true,
            (FieldClass::Internal, _) => true,
            _ => false,
        }
    }
}

/// Classification table of one kind
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: Kind,
    fields: Vec<FieldSpec>,
}

/// Fields every kind carries
const COMMON_COMMENTS: &str = "Comments";
/// Name of the flag that marks a record as enabled
pub const ENABLED_FIELD: &str = "Enabled";

impl Schema {
    /// Custom table for `kind`
    pub fn new(kind: Kind, fields: Vec<FieldSpec>) -> Self {
        Schema { kind, fields }
    }

    /// Built-in table for `kind`
    pub fn standard(kind: Kind) -> &'static Schema {
        static TABLES: OnceLock<[Schema; 4]> = OnceLock::new();
        let tables = TABLES.get_or_init(|| {
            [
                build_standard(Kind::Person),
                build_standard(Kind::Address),
                build_standard(Kind::Contact),
                build_standard(Kind::Calendar),
            ]
        });
        match kind {
            Kind::Person => &tables[0],
            Kind::Address => &tables[1],
            Kind::Contact => &tables[2],
            Kind::Calendar => &tables[3],
        }
    }

    /// Kind this table describes
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Rows in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Row for a field name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Name → class map consumed by the tokenizer
    pub fn classifications(&self) -> ClassificationMap {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.class))
            .collect()
    }

    /// Default values for a new record
    pub fn defaults(&self) -> BTreeMap<String, FieldValue> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect()
    }

    /// Check an edit against the table
    pub fn validate(&self, name: &str, value: &FieldValue, privilege: Privilege) -> Result<&FieldSpec> {
        let spec = self.field(name).ok_or_else(|| {
            Error::invalid_field(name, format!("no such field for kind {}", self.kind))
        })?;

        if spec.class == FieldClass::Internal && privilege != Privilege::Admin {
            return Err(Error::invalid_field(name, "internal field requires admin privilege"));
        }

        if !spec.accepts(value) {
            return Err(Error::invalid_field(
                name,
                format!("expected {:?} value, got {}", spec.class, value.type_name()),
            ));
        }

        if let FieldValue::Choice(choice) = value {
            if !choice.is_empty() && !spec.choices.iter().any(|c| c == choice) {
                return Err(Error::invalid_field(
                    name,
                    format!("{:?} is not one of {:?}", choice, spec.choices),
                ));
            }
        }

        Ok(spec)
    }
}

fn build_standard(kind: Kind) -> Schema {
    let mut fields = match kind {
        Kind::Person => vec![
            FieldSpec::enumerated(
                "Category",
                &[
                    "(Unspecified)",
                    "Relatives",
                    "Personal",
                    "Hospitality",
                    "Freelance",
                    "Company",
                    "Professional",
                ],
            ),
            FieldSpec::flag("SendCard", false),
            FieldSpec::text("Title"),
            FieldSpec::text("MailingName"),
            FieldSpec::text("FirstName"),
            FieldSpec::text("LastName"),
            FieldSpec::text("CompanyName"),
        ],
        Kind::Address => vec![
            FieldSpec::enumerated("AddressType", &["(Unspecified)", "Home", "Business"]),
            FieldSpec::text("AddressLine1"),
            FieldSpec::text("AddressLine2"),
            FieldSpec::text("City"),
            FieldSpec::text("StateProvince"),
            FieldSpec::text("PostalCode"),
            FieldSpec::text("Country"),
            FieldSpec::text("Directions"),
        ],
        Kind::Contact => vec![
            FieldSpec::enumerated("ContactMethod", &["(Unspecified)", "Personal", "Business"]),
            FieldSpec::enumerated(
                "ContactType",
                &[
                    "(Unspecified)",
                    "Voice",
                    "Data",
                    "Email",
                    "Mobile",
                    "URL",
                    "Facsimile",
                ],
            ),
            FieldSpec::text("ContactText"),
        ],
        Kind::Calendar => vec![
            FieldSpec::date("FirstOccurrence"),
            FieldSpec::enumerated("Frequency", &["Annual"]),
            FieldSpec::text("Occasion"),
        ],
    };
    fields.push(FieldSpec::text(COMMON_COMMENTS));
    fields.push(FieldSpec::flag(ENABLED_FIELD, true));
    Schema::new(kind, fields)
}

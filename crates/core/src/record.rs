//! Records
//!
//! A `Record` is one stored entity: its key, its field values, and the token
//! set derived from those values. The token set is written only by the
//! index maintainer and is always recomputed in full before a save.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::key::RecordKey;
use crate::schema::{Privilege, Schema, ENABLED_FIELD};
use crate::types::Kind;
use crate::value::FieldValue;

/// Lower-cased, de-duplicated index tokens of a record
pub type TokenSet = BTreeSet<String>;

/// Name of the persisted multi-valued index field
pub const TOKENS_FIELD: &str = "words";

/// A stored entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    key: RecordKey,
    fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    tokens: TokenSet,
}

impl Record {
    /// New record seeded with the standard schema defaults of the key's kind
    pub fn new(key: RecordKey) -> Self {
        Self::with_schema(key, Schema::standard(key.kind()))
    }

    /// New record seeded with the defaults of a custom schema
    pub fn with_schema(key: RecordKey, schema: &Schema) -> Self {
        Record {
            key,
            fields: schema.defaults(),
            tokens: TokenSet::new(),
        }
    }

    /// New, not yet stored person
    pub fn new_person() -> Self {
        Self::new(RecordKey::incomplete_person())
    }

    /// New, not yet stored child of `parent`
    pub fn new_child(kind: Kind, parent: &RecordKey) -> Result<Self> {
        Ok(Self::new(RecordKey::incomplete_child(kind, parent)?))
    }

    /// Record key
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Kind of this record
    pub fn kind(&self) -> Kind {
        self.key.kind()
    }

    /// Field values by name
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// One field value
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text of a text or choice field, empty when unset
    pub fn text(&self, name: &str) -> &str {
        self.get(name).and_then(FieldValue::as_str).unwrap_or("")
    }

    /// Enabled records are shown normally; disabled ones are de-emphasized
    ///
    /// A record without an `Enabled` flag (custom schemas) counts as enabled,
    /// matching the standard default.
    pub fn enabled(&self) -> bool {
        self.get(ENABLED_FIELD)
            .and_then(FieldValue::as_flag)
            .unwrap_or(true)
    }

    /// Index tokens as last computed by the index maintainer
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// Validate against the kind's standard schema and set a field
    pub fn set(&mut self, name: &str, value: FieldValue, privilege: Privilege) -> Result<()> {
        let schema = Schema::standard(self.kind());
        self.set_with_schema(schema, name, value, privilege)
    }

    /// Validate against `schema` and set a field
    pub fn set_with_schema(
        &mut self,
        schema: &Schema,
        name: &str,
        value: FieldValue,
        privilege: Privilege,
    ) -> Result<()> {
        if schema.kind() != self.kind() {
            return Err(Error::InvalidOperation(format!(
                "schema for {} applied to {} record",
                schema.kind(),
                self.kind()
            )));
        }
        schema.validate(name, &value, privilege)?;
        self.fields.insert(name.to_string(), value);
        Ok(())
    }

    /// Replace the token set
    ///
    /// Reserved for the index maintainer and store test fixtures. Tokens set
    /// here do not survive a save: the maintainer recomputes them from the
    /// fields before every write.
    #[doc(hidden)]
    pub fn replace_tokens(&mut self, tokens: TokenSet) {
        self.tokens = tokens;
    }

    /// Give an incomplete key its store-assigned id
    ///
    /// Kind and parent are fixed for the life of a record; a key that
    /// differs in anything but the id is rejected.
    pub fn assign_key(&mut self, key: RecordKey) -> Result<()> {
        if key.kind() != self.key.kind() || key.parent() != self.key.parent() {
            return Err(Error::InvalidOperation(format!(
                "cannot re-key {} as {}",
                self.key, key
            )));
        }
        if !self.key.is_incomplete() && key != self.key {
            return Err(Error::InvalidOperation(format!(
                "key {} is already assigned",
                self.key
            )));
        }
        self.key = key;
        Ok(())
    }

    /// Person display name: `[MailingName] CompanyName Title FirstName LastName`
    pub fn display_name(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mailing = self.text("MailingName");
        if !mailing.is_empty() {
            parts.push(format!("[{}]", mailing));
        }
        for name in ["CompanyName", "Title", "FirstName", "LastName"] {
            let part = self.text(name);
            if !part.is_empty() {
                parts.push(part.to_string());
            }
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    #[test]
    fn test_new_person_has_defaults() {
        let person = Record::new_person();
        assert!(person.key().is_incomplete());
        assert!(person.enabled());
        assert_eq!(person.get("SendCard"), Some(&FieldValue::Flag(false)));
        assert_eq!(person.text("Category"), "(Unspecified)");
        assert!(person.tokens().is_empty());
    }

    #[test]
    fn test_enabled_defaults_true_without_flag() {
        let schema = Schema::new(Kind::Person, vec![FieldSpec::text("LastName")]);
        let person = Record::with_schema(RecordKey::person(1), &schema);
        assert!(person.get(ENABLED_FIELD).is_none());
        assert!(person.enabled());
    }

    #[test]
    fn test_enabled_follows_flag() {
        let mut person = Record::new_person();
        person
            .set(ENABLED_FIELD, FieldValue::Flag(false), Privilege::User)
            .unwrap();
        assert!(!person.enabled());
    }

    #[test]
    fn test_new_child_requires_stored_parent() {
        assert!(Record::new_child(Kind::Contact, &RecordKey::incomplete_person()).is_err());
        let child = Record::new_child(Kind::Contact, &RecordKey::person(2)).unwrap();
        assert_eq!(child.kind(), Kind::Contact);
        assert_eq!(child.key().parent(), Some(RecordKey::person(2)));
    }

    #[test]
    fn test_set_validates() {
        let mut person = Record::new_person();
        person
            .set("FirstName", FieldValue::text("Fred"), Privilege::User)
            .unwrap();
        assert_eq!(person.text("FirstName"), "Fred");
        assert!(person
            .set("City", FieldValue::text("Boston"), Privilege::User)
            .is_err());
    }

    #[test]
    fn test_assign_key_fills_incomplete_id() {
        let mut contact = Record::new_child(Kind::Contact, &RecordKey::person(2)).unwrap();
        let stored = contact.key().with_id(8);
        contact.assign_key(stored).unwrap();
        assert_eq!(contact.key(), &stored);
    }

    #[test]
    fn test_assign_key_cannot_move_parent() {
        let mut contact = Record::new_child(Kind::Contact, &RecordKey::person(2)).unwrap();
        let elsewhere = RecordKey::child(Kind::Contact, 8, &RecordKey::person(3)).unwrap();
        assert!(contact.assign_key(elsewhere).is_err());
    }

    #[test]
    fn test_assign_key_cannot_change_assigned_id() {
        let mut person = Record::new(RecordKey::person(5));
        assert!(person.assign_key(RecordKey::person(6)).is_err());
        assert!(person.assign_key(RecordKey::person(5)).is_ok());
    }

    #[test]
    fn test_display_name() {
        let mut person = Record::new_person();
        for (name, value) in [
            ("MailingName", "The Sauers"),
            ("Title", "Dr."),
            ("FirstName", "Fred"),
            ("LastName", "Sauer"),
        ] {
            person.set(name, FieldValue::text(value), Privilege::User).unwrap();
        }
        assert_eq!(person.display_name(), "[The Sauers] Dr. Fred Sauer");
    }

    #[test]
    fn test_serde_keeps_tokens() {
        let mut person = Record::new(RecordKey::person(1));
        person.replace_tokens(["fred".to_string()].into_iter().collect());
        let json = serde_json::to_string(&person).unwrap();
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, person);
    }
}

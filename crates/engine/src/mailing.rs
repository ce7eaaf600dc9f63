//! Mailing list for greeting cards
//!
//! Lists one row per mailing address of every enabled person marked
//! `SendCard`. A person contributes up to two enabled addresses, or a single
//! placeholder row when it has none so the gap is visible. Rows are plain
//! data; turning them into CSV or labels is up to the caller.

use rolodex_core::{FieldValue, Kind, Record, RecordStore, Result};
use tracing::{debug, info};

use crate::rolodex::Rolodex;

/// Person flag selecting it for the mailing list
pub const SEND_CARD_FIELD: &str = "SendCard";

/// Addresses listed per person at most
pub const MAX_ADDRESSES_PER_PERSON: usize = 2;

/// Filler for the address lines of a person without an address
pub const ADDRESS_PLACEHOLDER: &str = "___________";

/// One mailing label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailingRow {
    /// Addressee
    pub name: String,
    /// Street line
    pub line1: String,
    /// Second street line
    pub line2: String,
    /// City, region and postal code, laid out by country
    pub line3: String,
    /// Country
    pub line4: String,
}

impl MailingRow {
    /// Row for a person with no usable address
    pub fn placeholder(name: &str) -> Self {
        MailingRow {
            name: name.to_string(),
            line1: ADDRESS_PLACEHOLDER.to_string(),
            line2: ADDRESS_PLACEHOLDER.to_string(),
            line3: ADDRESS_PLACEHOLDER.to_string(),
            line4: ADDRESS_PLACEHOLDER.to_string(),
        }
    }

    /// Row for one address record
    pub fn for_address(name: &str, address: &Record) -> Self {
        MailingRow {
            name: name.to_string(),
            line1: address.text("AddressLine1").to_string(),
            line2: address.text("AddressLine2").to_string(),
            line3: locality_line(address),
            line4: address.text("Country").to_string(),
        }
    }

    /// Whether this is a placeholder row
    pub fn is_placeholder(&self) -> bool {
        self.line1 == ADDRESS_PLACEHOLDER
    }
}

/// City, region and postal code in the order the address's country writes them
///
/// US layout (`City, ST 12345`) unless the country says otherwise.
pub fn locality_line(address: &Record) -> String {
    let city = address.text("City");
    let region = address.text("StateProvince");
    let postal = address.text("PostalCode");

    let line = match address.text("Country") {
        "The Netherlands" | "Portugal" => {
            let mut line = format!("{}  {}", postal, city);
            if !region.is_empty() {
                line.push_str(", ");
                line.push_str(region);
            }
            line
        }
        "Canada" => format!("{} {}  {}", city, region, postal),
        _ => format!("{}, {} {}", city, region, postal),
    };
    line.trim().to_string()
}

/// Name printed on the label: the mailing name, else the display name
pub fn addressee(person: &Record) -> String {
    match person.text("MailingName") {
        "" => person.display_name(),
        name => name.to_string(),
    }
}

fn sends_card(person: &Record) -> bool {
    person.enabled()
        && person
            .get(SEND_CARD_FIELD)
            .and_then(FieldValue::as_flag)
            .unwrap_or(false)
}

impl<S: RecordStore + ?Sized> Rolodex<S> {
    /// Mailing rows for every enabled person that receives a card, in key order
    ///
    /// # Errors
    ///
    /// Store errors as-is; no partial list is returned.
    pub fn mailing_list(&self) -> Result<Vec<MailingRow>> {
        let people = self.scan_kind(Kind::Person)?;
        let mut rows = Vec::new();
        let mut recipients = 0;

        for person in people.iter().filter(|p| sends_card(p)) {
            recipients += 1;
            let name = addressee(person);
            let family = self.store().query_by_ancestor(person.key())?;
            let before = rows.len();
            rows.extend(
                family
                    .iter()
                    .filter(|r| r.kind() == Kind::Address && r.enabled())
                    .take(MAX_ADDRESSES_PER_PERSON)
                    .map(|address| MailingRow::for_address(&name, address)),
            );
            if rows.len() == before {
                debug!(target: "rolodex::mailing", key = %person.key(), "No address on file");
                rows.push(MailingRow::placeholder(&name));
            }
        }

        info!(
            target: "rolodex::mailing",
            people = people.len(),
            recipients,
            rows = rows.len(),
            "Mailing list built"
        );
        Ok(rows)
    }
}

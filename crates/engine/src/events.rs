//! Events of the day
//!
//! Calendar records recur every year on the month and day of their first
//! occurrence. `events_on` picks the enabled ones that fall on a given day
//! and pairs each with its person, ready for a reminder. Sending the
//! reminder is up to the caller.

use chrono::{Datelike, NaiveDate};
use rolodex_core::{format_date, FieldValue, Kind, Record, RecordStore, Result};
use rolodex_search::AncestorResolver;
use tracing::{debug, info};

use crate::maintenance::FIRST_OCCURRENCE_FIELD;
use crate::rolodex::Rolodex;

/// Calendar field naming the occasion
pub const OCCASION_FIELD: &str = "Occasion";

/// A calendar event due on the requested day
#[derive(Debug, Clone, PartialEq)]
pub struct DueEvent {
    /// The calendar record
    pub event: Record,
    /// The person owning it
    pub person: Record,
}

impl DueEvent {
    /// First occurrence of the event
    pub fn first_occurrence(&self) -> Option<NaiveDate> {
        first_occurrence(&self.event)
    }

    /// One-line description: date, occasion and comments
    pub fn summary(&self) -> String {
        let date = self
            .first_occurrence()
            .map(|d| format_date(&d))
            .unwrap_or_default();
        [
            date.as_str(),
            self.event.text(OCCASION_FIELD),
            self.event.text("Comments"),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn first_occurrence(record: &Record) -> Option<NaiveDate> {
    match record.get(FIRST_OCCURRENCE_FIELD) {
        Some(FieldValue::Date(date)) => *date,
        _ => None,
    }
}

/// Whether an annual event first seen on `first` falls on `day`
///
/// Only month and day are compared, so a Feb 29 event is due on leap days only.
pub fn recurs_on(first: NaiveDate, day: NaiveDate) -> bool {
    first.month() == day.month() && first.day() == day.day()
}

impl<S: RecordStore + ?Sized> Rolodex<S> {
    /// Enabled calendar events recurring on `day`, each with its person
    ///
    /// Events without a first occurrence are never due.
    ///
    /// # Errors
    ///
    /// `KeyResolution` if a due event's person is missing; store errors
    /// as-is.
    pub fn events_on(&self, day: NaiveDate) -> Result<Vec<DueEvent>> {
        let events = self.scan_kind(Kind::Calendar)?;
        let considered = events.len();

        let mut due = Vec::new();
        for event in events {
            if !event.enabled() {
                continue;
            }
            let Some(first) = first_occurrence(&event) else {
                continue;
            };
            if !recurs_on(first, day) {
                continue;
            }
            let person = self.load(&AncestorResolver::to_root(event.key()))?;
            let due_event = DueEvent { event, person };
            debug!(
                target: "rolodex::events",
                key = %due_event.event.key(),
                summary = %due_event.summary(),
                "Event due"
            );
            due.push(due_event);
        }

        info!(
            target: "rolodex::events",
            day = %format_date(&day),
            considered,
            due = due.len(),
            "Events of the day"
        );
        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_recurs_on_ignores_year() {
        assert!(recurs_on(date(1980, 5, 17), date(2026, 5, 17)));
        assert!(!recurs_on(date(1980, 5, 17), date(2026, 5, 18)));
        assert!(!recurs_on(date(1980, 5, 17), date(2026, 6, 17)));
    }

    #[test]
    fn test_leap_day_only_on_leap_years() {
        let leap = date(1996, 2, 29);
        assert!(recurs_on(leap, date(2024, 2, 29)));
        assert!(!recurs_on(leap, date(2025, 2, 28)));
        assert!(!recurs_on(leap, date(2025, 3, 1)));
    }
}

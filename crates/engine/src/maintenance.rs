//! Bulk re-index ("fix")
//!
//! `fix_person` re-tokenizes a person and all of its children, applying
//! data repairs on the way. `fix_all` walks Persons one bounded page per
//! call and hands back a continuation cursor; scheduling the next page is
//! the caller's job.
//!
//! Writes go out in chunks of `reindex_batch_size`. If a chunk fails, the
//! error is `BatchInterrupted` with the number of records already written
//! and every key still pending, so the run can be resumed.

use chrono::{Datelike, NaiveDate};
use rolodex_core::{Error, FieldValue, Kind, Privilege, Record, RecordKey, RecordStore, Result};
use rolodex_search::AncestorResolver;
use tracing::{debug, info, warn};

use crate::rolodex::Rolodex;

/// Calendar field holding the first occurrence date
pub const FIRST_OCCURRENCE_FIELD: &str = "FirstOccurrence";

/// Outcome of fixing one person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixReport {
    /// The person
    pub root: RecordKey,
    /// Every record written, person first
    pub keys: Vec<RecordKey>,
    /// Records whose token set changed
    pub changed: usize,
    /// Records whose field values were repaired
    pub repaired: usize,
}

impl FixReport {
    /// Records written with tokens that were already current
    pub fn unchanged(&self) -> usize {
        self.keys.len() - self.changed
    }
}

/// One page of `fix_all`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixAllPage {
    /// Reports for the persons on this page, in key order
    pub fixed: Vec<FixReport>,
    /// Cursor for the next page; `None` once the last page has been handled
    pub continuation: Option<RecordKey>,
}

impl FixAllPage {
    /// Records written across the page
    pub fn records(&self) -> usize {
        self.fixed.iter().map(|r| r.keys.len()).sum()
    }
}

/// Move a date before `min_year` into `min_year`, keeping month and day
///
/// Feb 29 becomes Feb 28 when `min_year` is not a leap year. Returns `None`
/// if the date needs no repair.
pub fn repair_date(date: NaiveDate, min_year: i32) -> Option<NaiveDate> {
    if date.year() >= min_year {
        return None;
    }
    date.with_year(min_year)
        .or_else(|| NaiveDate::from_ymd_opt(min_year, date.month(), 28))
}

/// Apply data repairs to one record; returns true if a field changed
fn repair_record(record: &mut Record, min_year: i32) -> Result<bool> {
    if record.kind() != Kind::Calendar {
        return Ok(false);
    }
    let repaired = match record.get(FIRST_OCCURRENCE_FIELD) {
        Some(FieldValue::Date(Some(date))) => repair_date(*date, min_year),
        _ => None,
    };
    match repaired {
        Some(date) => {
            debug!(
                target: "rolodex::maintenance",
                key = %record.key(),
                date = %date,
                "Calendar date repaired"
            );
            record.set(
                FIRST_OCCURRENCE_FIELD,
                FieldValue::Date(Some(date)),
                Privilege::Admin,
            )?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Merge an error into a `BatchInterrupted` that accounts for earlier progress
fn interrupted(completed: usize, mut pending: Vec<RecordKey>, error: Error) -> Error {
    match error {
        Error::BatchInterrupted {
            completed: inner_completed,
            pending: inner_pending,
            source,
        } => {
            let mut all = inner_pending;
            all.append(&mut pending);
            Error::BatchInterrupted {
                completed: completed + inner_completed,
                pending: all,
                source,
            }
        }
        other => Error::BatchInterrupted {
            completed,
            pending,
            source: Box::new(other),
        },
    }
}

impl<S: RecordStore + ?Sized> Rolodex<S> {
    /// Repair and re-tokenize a person and all of its children
    ///
    /// A child key fixes its whole family.
    ///
    /// # Errors
    ///
    /// `KeyResolution` if the person does not exist; `BatchInterrupted` if
    /// a write fails part way.
    pub fn fix_person(&self, key: &RecordKey) -> Result<FixReport> {
        let root = AncestorResolver::to_root(key);
        let mut family = self.store().query_by_ancestor(&root)?;
        if family.is_empty() {
            return Err(Error::key_resolution(format!("no person {}", root)));
        }

        let config = self.config();
        let mut repaired = 0;
        if config.repair_calendar_dates {
            for record in &mut family {
                if repair_record(record, config.min_calendar_year)? {
                    repaired += 1;
                }
            }
        }

        let name = family[0].display_name();
        let mut report = FixReport {
            root,
            keys: Vec::with_capacity(family.len()),
            changed: 0,
            repaired,
        };
        let all_keys: Vec<RecordKey> = family.iter().map(|r| *r.key()).collect();

        let mut remaining = family.into_iter();
        loop {
            let chunk: Vec<Record> = remaining
                .by_ref()
                .take(config.reindex_batch_size)
                .collect();
            if chunk.is_empty() {
                break;
            }
            let chunk_len = chunk.len();
            match self.maintainer().reindex_batch(chunk) {
                Ok(batch) => {
                    report.changed += batch.changed;
                    report.keys.extend(batch.keys);
                }
                Err(e) => {
                    let completed = report.keys.len();
                    warn!(
                        target: "rolodex::maintenance",
                        root = %root,
                        completed,
                        error = %e,
                        "Fix interrupted"
                    );
                    // A failed batch already lists its own keys as pending.
                    let skip = if matches!(e, Error::BatchInterrupted { .. }) {
                        chunk_len
                    } else {
                        0
                    };
                    let rest = all_keys[completed + skip..].to_vec();
                    return Err(interrupted(completed, rest, e));
                }
            }
        }

        info!(
            target: "rolodex::maintenance",
            root = %root,
            name = %name,
            records = report.keys.len(),
            changed = report.changed,
            repaired = report.repaired,
            "Fixed person"
        );
        Ok(report)
    }

    /// Fix one page of persons strictly after `after`
    ///
    /// The page holds at most `reindex_batch_size` persons. A full page
    /// returns its last key as the continuation; a short page ends the run.
    ///
    /// # Errors
    ///
    /// `BatchInterrupted` counting the records written so far on this page
    /// and listing what was left, persons not yet started included.
    pub fn fix_all(&self, after: Option<&RecordKey>) -> Result<FixAllPage> {
        let limit = self.config().reindex_batch_size;
        let people = self.store().query_kind(Kind::Person, after, limit)?;
        let keys: Vec<RecordKey> = people.iter().map(|p| *p.key()).collect();

        let mut page = FixAllPage::default();
        for (i, key) in keys.iter().enumerate() {
            match self.fix_person(key) {
                Ok(report) => page.fixed.push(report),
                Err(e) => {
                    let completed = page.records();
                    let skip = usize::from(matches!(e, Error::BatchInterrupted { .. }));
                    let rest = keys[i + skip..].to_vec();
                    return Err(interrupted(completed, rest, e));
                }
            }
        }

        if keys.len() == limit {
            page.continuation = keys.last().copied();
        }
        info!(
            target: "rolodex::maintenance",
            persons = page.fixed.len(),
            records = page.records(),
            more = page.continuation.is_some(),
            "Fix page done"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_date_moves_old_years() {
        let old = NaiveDate::from_ymd_opt(1066, 10, 14).unwrap();
        assert_eq!(
            repair_date(old, 1900),
            NaiveDate::from_ymd_opt(1900, 10, 14)
        );
    }

    #[test]
    fn test_repair_date_leaves_recent_years() {
        let recent = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        assert_eq!(repair_date(recent, 1900), None);
    }

    #[test]
    fn test_repair_leap_day() {
        let leap = NaiveDate::from_ymd_opt(1896, 2, 29).unwrap();
        assert_eq!(
            repair_date(leap, 1900),
            NaiveDate::from_ymd_opt(1900, 2, 28)
        );
        assert_eq!(
            repair_date(leap, 1904),
            NaiveDate::from_ymd_opt(1904, 2, 29)
        );
    }

    #[test]
    fn test_interrupted_merges_nested() {
        let a = RecordKey::person(1);
        let b = RecordKey::person(2);
        let inner = Error::BatchInterrupted {
            completed: 2,
            pending: vec![a],
            source: Box::new(Error::store_unavailable("down")),
        };
        match interrupted(5, vec![b], inner) {
            Error::BatchInterrupted {
                completed,
                pending,
                source,
            } => {
                assert_eq!(completed, 7);
                assert_eq!(pending, vec![a, b]);
                assert!(source.is_store_unavailable());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_interrupted_wraps_plain_error() {
        let a = RecordKey::person(1);
        let err = interrupted(0, vec![a], Error::store_unavailable("down"));
        assert!(err.is_store_unavailable());
        assert!(matches!(err, Error::BatchInterrupted { completed: 0, .. }));
    }
}

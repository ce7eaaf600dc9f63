//! Word query planner
//!
//! Turns a raw search phrase into root keys:
//!
//! 1. Normalize: trim, lower-case, split on whitespace, drop duplicates
//! 2. For each term and each kind, one keys-only range query over the token
//!    field from `term` to `term + PREFIX_SENTINEL` (prefix match)
//! 3. Resolve hits to root keys; within a term, kinds are unioned
//! 4. Intersect the per-term sets (AND across terms)
//!
//! A phrase with no terms matches nothing. Any store error aborts the whole
//! search; partial results are never returned.
//!
//! The range queries are not a snapshot: a concurrent edit may be seen by
//! some terms and not others.

use std::collections::BTreeSet;
use std::sync::Arc;

use rolodex_core::{IndexRangeQuery, Kind, RecordKey, RecordStore, Result, TOKENS_FIELD};
use tracing::debug;

use crate::resolver::AncestorResolver;

/// Appended to a term to form the inclusive upper bound of its prefix range
///
/// `char::MAX` sorts after every other scalar value, so `term + MAX` is
/// greater than any token extending `term`. Plain-text tokens never hold it
/// since it is not alphanumeric.
pub const PREFIX_SENTINEL: char = char::MAX;

/// Split a phrase into distinct lower-cased terms, in first-seen order
pub fn normalize_phrase(phrase: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    phrase
        .trim()
        .to_lowercase()
        .split_whitespace()
        .filter(|term| seen.insert(term.to_string()))
        .map(str::to_string)
        .collect()
}

/// Inclusive `(lower, upper)` bounds matching every token that starts with `term`
pub fn prefix_bounds(term: &str) -> (String, String) {
    let mut upper = String::with_capacity(term.len() + PREFIX_SENTINEL.len_utf8());
    upper.push_str(term);
    upper.push(PREFIX_SENTINEL);
    (term.to_string(), upper)
}

/// Answers multi-word queries against a store's token index
pub struct WordQueryPlanner<S: RecordStore + ?Sized> {
    store: Arc<S>,
}

impl<S: RecordStore + ?Sized> WordQueryPlanner<S> {
    /// Create a planner over `store`
    pub fn new(store: Arc<S>) -> Self {
        WordQueryPlanner { store }
    }

    /// Root keys of people matching every term of `phrase`
    ///
    /// # Errors
    ///
    /// Returns the first store error; no partial result is produced.
    pub fn search(&self, phrase: &str) -> Result<BTreeSet<RecordKey>> {
        let terms = normalize_phrase(phrase);
        if terms.is_empty() {
            debug!(target: "rolodex::search", "Empty phrase matches nothing");
            return Ok(BTreeSet::new());
        }

        let mut result: Option<BTreeSet<RecordKey>> = None;
        for term in &terms {
            let roots = self.match_term(term)?;
            debug!(
                target: "rolodex::search",
                term = %term,
                roots = roots.len(),
                "Term matched"
            );

            let narrowed = match result {
                None => roots,
                Some(acc) => acc.intersection(&roots).copied().collect(),
            };
            if narrowed.is_empty() {
                // AND of anything with nothing is nothing.
                return Ok(narrowed);
            }
            result = Some(narrowed);
        }
        Ok(result.unwrap_or_default())
    }

    /// Root keys with at least one record of any kind matching `term` as a prefix
    pub fn match_term(&self, term: &str) -> Result<BTreeSet<RecordKey>> {
        let (lower, upper) = prefix_bounds(term);
        let mut roots = BTreeSet::new();
        for kind in Kind::ALL {
            let query = IndexRangeQuery {
                kind,
                field: TOKENS_FIELD.to_string(),
                lower: lower.clone(),
                upper: upper.clone(),
                keys_only: true,
            };
            let hits = self.store.query_by_index_range(&query)?;
            roots.extend(AncestorResolver::resolve_all(&hits));
        }
        Ok(roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize_phrase("  Gmail   BOSTON "), vec!["gmail", "boston"]);
    }

    #[test]
    fn test_normalize_drops_duplicates() {
        assert_eq!(normalize_phrase("bos Bos bos"), vec!["bos"]);
    }

    #[test]
    fn test_normalize_blank() {
        assert!(normalize_phrase("").is_empty());
        assert!(normalize_phrase(" \t\n ").is_empty());
    }

    #[test]
    fn test_normalize_keeps_punctuation() {
        assert_eq!(normalize_phrase("fred@sauer.com"), vec!["fred@sauer.com"]);
    }

    #[test]
    fn test_prefix_bounds() {
        let (lower, upper) = prefix_bounds("sau");
        assert_eq!(lower, "sau");
        assert!(upper.as_str() > "sau");
        assert!(upper.as_str() > "sauer");
        assert!(upper.as_str() > "sauzzzz");
        assert!(upper.as_str() < "sav");
    }

    #[test]
    fn test_prefix_bounds_non_ascii() {
        let (_, upper) = prefix_bounds("zü");
        assert!(upper.as_str() > "zürich");
        assert!(upper.as_str() < "zý");
    }
}

//! Record tokenizer
//!
//! Derives the index token set of a record from its field values and the
//! kind's classification map. Pure: the same fields and map always give the
//! same set.
//!
//! Per classification:
//! - `Internal`: nothing
//! - `Flag`: the lower-cased field name, only when true
//! - `Date`: `YYYY-MM-DD`, unless the date is zero
//! - `Enumerated`: `field=value` with surrounding parentheses stripped
//! - `PlainText`: every word, where a word is a run of alphanumerics, `_`
//!   and `=`; a word containing `=` also contributes its `=`-separated parts
//!
//! Every token is lower-cased and the result never contains `""`.

use std::collections::BTreeMap;

use rolodex_core::{format_date, ClassificationMap, FieldClass, FieldValue, TokenSet};
use tracing::trace;

/// Separator between field name and value in compound tokens
pub const COMPOUND_SEPARATOR: char = '=';

/// Characters that make up a word in plain text
#[inline]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == COMPOUND_SEPARATOR
}

/// Split plain text on runs of non-word characters
///
/// # Example
///
/// ```
/// use rolodex_search::tokenizer::split_words;
///
/// let words: Vec<&str> = split_words("Fred@Sauer.com").collect();
/// assert_eq!(words, vec!["Fred", "Sauer", "com"]);
/// ```
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c))
        .filter(|w| !w.is_empty())
}

/// Tokenize all fields of a record
///
/// Fields missing from `classes` are not indexed, and a value whose variant
/// does not fit its classification contributes nothing.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use rolodex_core::{ClassificationMap, FieldClass, FieldValue};
/// use rolodex_search::tokenizer::tokenize;
///
/// let mut fields = BTreeMap::new();
/// fields.insert("ContactText".to_string(), FieldValue::text("Fred@Sauer.com"));
/// let mut classes = ClassificationMap::new();
/// classes.insert("ContactText".to_string(), FieldClass::PlainText);
///
/// let tokens = tokenize(&fields, &classes);
/// assert!(tokens.contains("fred") && tokens.contains("sauer") && tokens.contains("com"));
/// ```
pub fn tokenize(fields: &BTreeMap<String, FieldValue>, classes: &ClassificationMap) -> TokenSet {
    let mut tokens = TokenSet::new();
    for (name, value) in fields {
        match classes.get(name) {
            Some(class) => field_tokens(name, *class, value, &mut tokens),
            None => trace!(target: "rolodex::index", field = %name, "Unclassified field not indexed"),
        }
    }
    tokens
}

/// Tokens contributed by a single field
pub fn field_tokens(name: &str, class: FieldClass, value: &FieldValue, out: &mut TokenSet) {
    match (class, value) {
        (FieldClass::Internal, _) => {}
        (FieldClass::Flag, FieldValue::Flag(set)) => {
            // Only act on true: unset and false look the same.
            if *set {
                out.insert(name.to_lowercase());
            }
        }
        (FieldClass::Date, FieldValue::Date(date)) => {
            if let Some(date) = date {
                out.insert(format_date(date));
            }
        }
        (FieldClass::Enumerated, FieldValue::Choice(choice)) => {
            if !choice.is_empty() {
                let choice = choice.trim_matches(|c| c == '(' || c == ')');
                out.insert(format!("{}{}{}", name, COMPOUND_SEPARATOR, choice).to_lowercase());
            }
        }
        (FieldClass::PlainText, FieldValue::Text(text)) => text_tokens(text, out),
        (class, value) => {
            trace!(
                target: "rolodex::index",
                field = %name,
                class = ?class,
                value = value.type_name(),
                "Value does not fit classification; not indexed"
            );
        }
    }
}

/// Tokens of a plain-text value
pub fn text_tokens(text: &str, out: &mut TokenSet) {
    for word in split_words(text) {
        let word = word.to_lowercase();
        if word.contains(COMPOUND_SEPARATOR) {
            for part in word.split(COMPOUND_SEPARATOR).filter(|p| !p.is_empty()) {
                out.insert(part.to_string());
            }
        }
        out.insert(word);
    }
}

//! Line oriented N-Triples parsing.
//!
//! This is deliberately not a full N-Triples grammar: a line is split on
//! whitespace, the first two words are subject and predicate and the rest is
//! the object, so literals containing spaces survive. A trailing `.` is
//! treated as the statement terminator.

use crate::errors::{NttoError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref LITERAL_LANGUAGE: Regex =
        Regex::new(r#""@([A-Za-z]+(?:-[A-Za-z0-9]+)*)$"#).unwrap();
    static ref LANGUAGE_TAG: Regex = Regex::new(r"^[A-Za-z]+(?:-[A-Za-z0-9]+)*$").unwrap();
}

/// A subject/predicate/object record.
///
/// Whether the fields carry N-Triples delimiters (`<…>`, `"…"`) depends on
/// where the triple is in the pipeline: [`parse_ntriple`] keeps them,
/// [`Triple::unembellished`] removes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    #[serde(rename = "s")]
    pub subject: String,
    #[serde(rename = "p")]
    pub predicate: String,
    #[serde(rename = "o")]
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Triple {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Strips brackets and quotes from every field.
    pub fn unembellished(self) -> Self {
        Triple {
            subject: strip_term(&self.subject).to_string(),
            predicate: strip_term(&self.predicate).to_string(),
            object: strip_term(&self.object).to_string(),
        }
    }

    /// Applies `f` to each field in place.
    pub fn map_fields<F>(self, mut f: F) -> Self
    where
        F: FnMut(String) -> String,
    {
        Triple {
            subject: f(self.subject),
            predicate: f(self.predicate),
            object: f(self.object),
        }
    }
}

/// Parses one data line.
///
/// Returns `Ok(None)` for blank lines and `#` comments. Fewer than three
/// words is a [`NttoError::MalformedTriple`]; the line number is filled in
/// by the caller with [`NttoError::at_line`].
pub fn parse_ntriple(line: &str) -> Result<Option<Triple>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() < 3 {
        return Err(NttoError::MalformedTriple {
            line_no: 0,
            line: line.to_string(),
        });
    }
    let mut rest = &words[2..];
    if rest.len() > 1 && rest[rest.len() - 1] == "." {
        rest = &rest[..rest.len() - 1];
    }
    let mut object = rest.join(" ");
    // terminator glued to the object, as in `<s> <p> "o".`
    if object.len() > 1
        && object.ends_with('.')
        && is_complete_term(&object[..object.len() - 1])
    {
        object.pop();
    }
    Ok(Some(Triple::new(words[0], words[1], object)))
}

fn is_complete_term(s: &str) -> bool {
    if is_uri_ref(s) || is_blank_node(s) {
        return true;
    }
    is_literal(s)
        && s.len() > 1
        && (s.ends_with('"') || s.ends_with('>') || literal_language(s).is_some())
}

/// Removes leading and trailing `<`, `>` and `"` characters.
pub fn strip_term(s: &str) -> &str {
    s.trim_matches(|c| c == '<' || c == '>' || c == '"')
}

pub fn is_uri_ref(s: &str) -> bool {
    s.starts_with('<') && s.ends_with('>')
}

pub fn is_literal(s: &str) -> bool {
    s.starts_with('"')
}

pub fn is_blank_node(s: &str) -> bool {
    s.starts_with("_:")
}

/// The `@lang` tag of a literal term, if any.
pub fn literal_language(s: &str) -> Option<&str> {
    if !is_literal(s) {
        return None;
    }
    LITERAL_LANGUAGE
        .captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Language filter primitive: non-literals and untagged literals always
/// pass, tagged literals pass only with exactly `language`.
pub fn matches_language(s: &str, language: &str) -> bool {
    match literal_language(s) {
        Some(tag) => tag == language,
        None => true,
    }
}

pub fn is_valid_language_tag(tag: &str) -> bool {
    LANGUAGE_TAG.is_match(tag)
}

//! Prefix abbreviation.
//!
//! A field that starts with a rule's prefix has every occurrence of that
//! prefix replaced by `shortcut:`. Rules are tried in table order, so a
//! specific prefix has to come before a generic prefix that is a stem of it:
//!
//! ```
//! use ntto::abbreviate::apply_rules;
//! use ntto::options::MatchMode;
//! use ntto::rules::{Rule, Rules};
//!
//! let rules = Rules::new(vec![Rule::new("a", "http://x/y/"), Rule::new("b", "http://x/")]);
//! assert_eq!(apply_rules("http://x/y/Foo", &rules, "<NULL>", MatchMode::AllMatches), "a:Foo");
//! ```
//!
//! A rule whose shortcut equals the null marker deletes the prefix instead.

use crate::options::MatchMode;
use crate::rules::Rules;
use crate::triple::{is_literal, is_uri_ref};
use std::borrow::Cow;
use std::sync::Arc;

/// Default null marker, see [`Abbreviator::with_null_marker`].
pub const DEFAULT_NULL_MARKER: &str = "<NULL>";

fn rewrite<'a, 'r, I>(field: &'a str, rules: I, mode: MatchMode) -> Cow<'a, str>
where
    I: IntoIterator<Item = (&'r str, &'r str)>,
{
    let mut out = Cow::Borrowed(field);
    for (prefix, replacement) in rules {
        if out.starts_with(prefix) {
            out = Cow::Owned(out.replace(prefix, replacement));
            if mode.is_first_match() {
                break;
            }
        }
    }
    out
}

/// Applies `rules` to a single field. Unmatched fields come back borrowed.
pub fn apply_rules<'a>(
    field: &'a str,
    rules: &Rules,
    null_marker: &str,
    mode: MatchMode,
) -> Cow<'a, str> {
    let replacements: Vec<(&str, String)> = rules
        .iter()
        .map(|r| (r.prefix.as_str(), replacement_for(&r.shortcut, null_marker)))
        .collect();
    rewrite(
        field,
        replacements.iter().map(|(p, r)| (*p, r.as_str())),
        mode,
    )
}

fn replacement_for(shortcut: &str, null_marker: &str) -> String {
    if shortcut == null_marker {
        String::new()
    } else {
        format!("{}:", shortcut)
    }
}

#[derive(Debug)]
struct CompiledRule {
    prefix: String,
    replacement: String,
}

/// A rule table with its replacement strings computed once, ready to be
/// shared by every worker.
#[derive(Debug, Clone)]
pub struct Abbreviator {
    rules: Arc<Vec<CompiledRule>>,
    mode: MatchMode,
}

impl Abbreviator {
    pub fn new(rules: &Rules, mode: MatchMode) -> Self {
        Self::with_null_marker(rules, DEFAULT_NULL_MARKER, mode)
    }

    pub fn with_null_marker(rules: &Rules, null_marker: &str, mode: MatchMode) -> Self {
        let compiled = rules
            .iter()
            .map(|r| CompiledRule {
                prefix: r.prefix.clone(),
                replacement: replacement_for(&r.shortcut, null_marker),
            })
            .collect();
        Abbreviator {
            rules: Arc::new(compiled),
            mode,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Abbreviates a bare (unembellished) field.
    pub fn apply<'a>(&self, field: &'a str) -> Cow<'a, str> {
        rewrite(
            field,
            self.rules
                .iter()
                .map(|r| (r.prefix.as_str(), r.replacement.as_str())),
            self.mode,
        )
    }

    /// Abbreviates an N-Triples term, touching only what sits inside its
    /// delimiters: the IRI of `<…>`, the lexical form of a literal and its
    /// `^^<…>` datatype. Blank nodes pass through.
    pub fn apply_to_term(&self, term: &str) -> String {
        if is_uri_ref(term) {
            return format!("<{}>", self.apply(&term[1..term.len() - 1]));
        }
        if is_literal(term) {
            if let Some(close) = term.rfind('"').filter(|&i| i > 0) {
                let lexical = self.apply(&term[1..close]);
                let suffix = &term[close + 1..];
                return match suffix.strip_prefix("^^") {
                    Some(datatype) if is_uri_ref(datatype) => {
                        format!("\"{}\"^^{}", lexical, self.apply_to_term(datatype))
                    }
                    _ => format!("\"{}\"{}", lexical, suffix),
                };
            }
        }
        term.to_string()
    }
}

//! The abbreviation rule table: an ordered list of (shortcut, prefix) pairs.
//!
//! Rules are read from a simple line format, one `shortcut prefix` pair per
//! line. Blank lines and lines starting with `#` or `//` are ignored.
//!
//! ```
//! use ntto::rules::Rules;
//!
//! let rules = Rules::parse("dbp http://dbpedia.org/resource/\n# comment\n").unwrap();
//! assert_eq!(rules.len(), 1);
//! assert_eq!(rules.dump(), "dbp\thttp://dbpedia.org/resource/");
//! ```

use crate::errors::{NttoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Built-in table used when no rules file is given.
pub const DEFAULT_RULES: &str = include_str!("default_rules.txt");

/// A single abbreviation: fields starting with `prefix` are shortened to `shortcut:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub prefix: String,
    pub shortcut: String,
}

impl Rule {
    pub fn new(shortcut: impl Into<String>, prefix: impl Into<String>) -> Self {
        Rule {
            prefix: prefix.into(),
            shortcut: shortcut.into(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.shortcut, self.prefix)
    }
}

/// Ordered rule table. Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rules {
    rules: Vec<Rule>,
}

impl Rules {
    pub fn new(rules: Vec<Rule>) -> Self {
        Rules { rules }
    }

    /// Parses a rule table. Stops at the first line with fewer than two fields.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some(shortcut), Some(prefix)) => rules.push(Rule::new(shortcut, prefix)),
                _ => {
                    return Err(NttoError::MalformedRule {
                        line: line.to_string(),
                    })
                }
            }
        }
        Ok(Rules { rules })
    }

    /// The built-in table, see [`DEFAULT_RULES`].
    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_RULES)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| NttoError::io_with_path(e, path))?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn as_slice(&self) -> &[Rule] {
        &self.rules
    }

    /// Renders `shortcut<TAB>prefix` per rule, sorted, newline separated.
    pub fn dump(&self) -> String {
        let mut formatted: Vec<String> = self.rules.iter().map(|r| r.to_string()).collect();
        formatted.sort();
        formatted.join("\n")
    }

    /// Splits the table round-robin into at most `count` partitions.
    pub fn partition(&self, count: usize) -> Vec<Vec<Rule>> {
        let count = count.min(self.rules.len());
        if count == 0 {
            return vec![];
        }
        let mut partitions = vec![Vec::new(); count];
        for (i, rule) in self.rules.iter().enumerate() {
            partitions[i % count].push(rule.clone());
        }
        partitions
    }
}

impl<'a> IntoIterator for &'a Rules {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl FromIterator<Rule> for Rules {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Rules {
            rules: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_world() -> Rules {
        Rules::new(vec![Rule::new("a", "hello"), Rule::new("b", "world")])
    }

    #[test]
    fn test_parse_rules() {
        let rules = Rules::parse("a hello\n      b world").unwrap();
        assert_eq!(rules, hello_world());
    }

    #[test]
    fn test_parse_rules_skips_comments_and_blanks() {
        let inputs = [
            "a hello\n      // just a comment  \n      b world",
            "a hello\n      # just a comment\n\n      b world",
            "a hello\n\n      // do not mix, unless you have to\n      # just a comment\n      \n      b world",
        ];
        for input in inputs {
            assert_eq!(Rules::parse(input).unwrap(), hello_world(), "{}", input);
        }
    }

    #[test]
    fn test_parse_rules_broken_line() {
        let err = Rules::parse("a\n\n  // comment\n  # comment\n  b world").unwrap_err();
        match err {
            NttoError::MalformedRule { line } => assert_eq!(line, "a"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rules_ignores_extra_fields() {
        let rules = Rules::parse("dc http://purl.org/dc/elements/1.1/ trailing words").unwrap();
        assert_eq!(
            rules.as_slice(),
            &[Rule::new("dc", "http://purl.org/dc/elements/1.1/")]
        );
    }

    #[test]
    fn test_dump_rules_sorted() {
        let rules = Rules::new(vec![Rule::new("b", "world"), Rule::new("a", "hello")]);
        assert_eq!(rules.dump(), "a\thello\nb\tworld");
    }

    #[test]
    fn test_builtin_rules() {
        let rules = Rules::builtin().unwrap();
        assert!(rules.len() > 200);
        let first = rules.iter().next().unwrap();
        assert_eq!(first, &Rule::new("dbp", "http://dbpedia.org/resource/"));

        // the populated place rule must be tried before the generic ontology rule
        let pos = |shortcut: &str| rules.iter().position(|r| r.shortcut == shortcut).unwrap();
        assert!(pos("dbpopp") < pos("dbpo"));
        assert!(pos("dbppwp") < pos("dbpp"));
    }

    #[test]
    fn test_partition_rules() {
        let rules: Rules = (0..5).map(|i| Rule::new(format!("s{i}"), format!("p{i}"))).collect();
        let parts = rules.partition(2);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 3);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[1][0].shortcut, "s1");

        // never more partitions than rules
        assert_eq!(rules.partition(10).len(), 5);
        assert!(Rules::default().partition(4).is_empty());
    }
}

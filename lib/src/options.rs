//! Shared option types that replace boolean flag parameters in the Rust API.

use serde::{Deserialize, Serialize};

/// How many rules may rewrite a single field.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Try every rule in table order; each matching rule rewrites the
    /// output of the previous one.
    #[default]
    AllMatches,
    /// Stop after the first rule whose prefix matches.
    FirstMatch,
}

impl MatchMode {
    pub fn is_first_match(self) -> bool {
        matches!(self, MatchMode::FirstMatch)
    }
}

impl From<bool> for MatchMode {
    fn from(first_match: bool) -> Self {
        if first_match {
            MatchMode::FirstMatch
        } else {
            MatchMode::AllMatches
        }
    }
}

/// What happens to a data line that does not parse.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the whole run on the first broken line.
    #[default]
    Abort,
    /// Log the broken line and carry on.
    Skip,
}

impl ErrorPolicy {
    pub fn is_skip(self) -> bool {
        matches!(self, ErrorPolicy::Skip)
    }
}

impl From<bool> for ErrorPolicy {
    fn from(ignore: bool) -> Self {
        if ignore {
            ErrorPolicy::Skip
        } else {
            ErrorPolicy::Abort
        }
    }
}

impl From<ErrorPolicy> for bool {
    fn from(value: ErrorPolicy) -> Self {
        value.is_skip()
    }
}

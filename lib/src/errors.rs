//! Error type shared by every stage of the conversion.

use std::fmt;
use std::io;

/// Everything that can stop (or, under ignore mode, skip) a conversion.
#[derive(Debug)]
pub enum NttoError {
    /// A rule line with fewer than two whitespace separated fields.
    MalformedRule { line: String },
    /// A data line with fewer than three whitespace separated fields.
    MalformedTriple { line_no: u64, line: String },
    /// Output format selector that is not one of json, xml, tsv, nt.
    UnknownFormat(String),
    /// A record could not be encoded by its writer.
    Serialization(String),
    /// Underlying I/O error.
    Io(io::Error),
    /// The requested strategy cannot produce the requested output.
    Unsupported(String),
    /// Invalid run configuration.
    Config(String),
}

impl NttoError {
    /// Process exit status for this error kind, so callers can tell failures apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            NttoError::MalformedRule { .. } => 2,
            NttoError::MalformedTriple { .. } => 3,
            NttoError::UnknownFormat(_) => 4,
            NttoError::Serialization(_) => 5,
            NttoError::Io(_) => 6,
            NttoError::Unsupported(_) | NttoError::Config(_) => 7,
        }
    }

    /// Attaches a line number to a [`NttoError::MalformedTriple`].
    pub fn at_line(self, n: u64) -> Self {
        match self {
            NttoError::MalformedTriple { line, .. } => {
                NttoError::MalformedTriple { line_no: n, line }
            }
            other => other,
        }
    }

    pub(crate) fn io_with_path(err: io::Error, path: &std::path::Path) -> Self {
        NttoError::Io(io::Error::new(
            err.kind(),
            format!("{}: {}", path.display(), err),
        ))
    }
}

impl fmt::Display for NttoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NttoError::MalformedRule { line } => write!(f, "Broken rule: {}", line),
            NttoError::MalformedTriple { line_no, line } => {
                write!(f, "Broken input on line {}: {}", line_no, line)
            }
            NttoError::UnknownFormat(name) => {
                write!(f, "Unknown output format '{}' (expected json, xml, tsv or nt)", name)
            }
            NttoError::Serialization(m) => write!(f, "Serialization error: {}", m),
            NttoError::Io(e) => write!(f, "{}", e),
            NttoError::Unsupported(m) => write!(f, "{}", m),
            NttoError::Config(m) => write!(f, "Invalid configuration: {}", m),
        }
    }
}

impl std::error::Error for NttoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NttoError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for NttoError {
    fn from(e: io::Error) -> Self {
        NttoError::Io(e)
    }
}

impl From<serde_json::Error> for NttoError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            NttoError::Io(e.into())
        } else {
            NttoError::Serialization(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, NttoError>;

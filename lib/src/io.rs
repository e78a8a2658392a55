//! Input sources and output sinks: files or the standard streams.

use crate::errors::{NttoError, Result};
use log::debug;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

const BUFFER_SIZE: usize = 1 << 20;

/// Where lines come from. `-` stands for standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    pub fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        match self {
            Source::Stdin => Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, io::stdin()))),
            Source::File(path) => {
                debug!("Reading file: {}", path.display());
                let file = File::open(path).map_err(|e| NttoError::io_with_path(e, path))?;
                Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
            }
        }
    }
}

impl FromStr for Source {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "-" {
            Ok(Source::Stdin)
        } else {
            Ok(Source::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => write!(f, "-"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Where records go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Sink {
    #[default]
    Stdout,
    File(PathBuf),
}

impl Sink {
    pub fn open(&self) -> Result<Box<dyn Write + Send>> {
        match self {
            Sink::Stdout => Ok(Box::new(BufWriter::with_capacity(BUFFER_SIZE, io::stdout()))),
            Sink::File(path) => {
                debug!("Writing file: {}", path.display());
                let file = File::create(path).map_err(|e| NttoError::io_with_path(e, path))?;
                Ok(Box::new(BufWriter::with_capacity(BUFFER_SIZE, file)))
            }
        }
    }
}

impl From<Option<PathBuf>> for Sink {
    fn from(path: Option<PathBuf>) -> Self {
        path.map(Sink::File).unwrap_or(Sink::Stdout)
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Stdout => write!(f, "<stdout>"),
            Sink::File(path) => write!(f, "{}", path.display()),
        }
    }
}

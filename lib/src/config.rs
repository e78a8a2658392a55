//! Run configuration for a conversion.
//!
//! Built with [`Config::builder`] or loaded from a JSON file; fields missing
//! from the file take their defaults.

use crate::abbreviate::DEFAULT_NULL_MARKER;
use crate::errors::{NttoError, Result as NttoResult};
use crate::options::{ErrorPolicy, MatchMode};
use crate::triple::is_valid_language_tag;
use crate::writer::OutputFormat;
use anyhow::Result;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};
use std::path::Path;

/// Lines buffered in each handoff channel between reader, workers and writer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Builder)]
#[serde(default)]
#[builder(setter(into))]
pub struct Config {
    // rewrite prefixes with the rule table
    #[builder(default = "true")]
    pub abbreviate: bool,
    #[builder(default)]
    pub format: OutputFormat,
    // abort on broken lines, or log and skip them
    #[builder(default)]
    pub error_policy: ErrorPolicy,
    // keep only literals without a language tag or with this one
    #[builder(setter(into, strip_option), default)]
    pub language: Option<String>,
    // shortcut that deletes a prefix instead of abbreviating it
    #[builder(default = "DEFAULT_NULL_MARKER.to_string()")]
    pub null_marker: String,
    #[builder(default = "default_workers()")]
    pub workers: usize,
    #[builder(default = "DEFAULT_QUEUE_CAPACITY")]
    pub queue_capacity: usize,
    // emit records in input order
    #[builder(default)]
    pub ordered: bool,
    #[builder(default)]
    pub match_mode: MatchMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            abbreviate: true,
            format: OutputFormat::default(),
            error_policy: ErrorPolicy::default(),
            language: None,
            null_marker: DEFAULT_NULL_MARKER.to_string(),
            workers: default_workers(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            ordered: false,
            match_mode: MatchMode::default(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Rejects settings no run can work with.
    pub fn validate(&self) -> NttoResult<()> {
        if self.workers == 0 {
            return Err(NttoError::Config("workers must be at least 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(NttoError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if let Some(lang) = &self.language {
            if !is_valid_language_tag(lang) {
                return Err(NttoError::Config(format!(
                    "'{}' is not a language tag",
                    lang
                )));
            }
        }
        Ok(())
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let value: serde_json::Value = serde_json::from_reader(reader)?;
        // surface a bad format name as NttoError::UnknownFormat, not a decode error
        if let Some(format) = value.get("format").and_then(|f| f.as_str()) {
            format.parse::<OutputFormat>()?;
        }
        let config: Config = serde_json::from_value(value)?;
        Ok(config)
    }

    /// Prints out the current Config in a clear and readable way for command line output.
    pub fn print(&self) {
        eprintln!("Configuration:");
        eprintln!("  Abbreviate: {}", self.abbreviate);
        eprintln!("  Format: {}", self.format);
        eprintln!("  Ignore Errors: {}", self.error_policy.is_skip());
        if let Some(lang) = &self.language {
            eprintln!("  Language: {}", lang);
        }
        eprintln!("  Null Marker: {}", self.null_marker);
        eprintln!("  Workers: {}", self.workers);
        eprintln!("  Queue Capacity: {}", self.queue_capacity);
        eprintln!("  Ordered: {}", self.ordered);
        eprintln!("  First Match Only: {}", self.match_mode.is_first_match());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder().build().unwrap();
        assert!(config.abbreviate);
        assert_eq!(config.format, OutputFormat::NTriples);
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
        assert_eq!(config.null_marker, "<NULL>");
        assert!(config.workers >= 1);
        assert_eq!(config.language, None);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_builder_setters() {
        let config = Config::builder()
            .format(OutputFormat::Json)
            .language("en")
            .workers(3usize)
            .error_policy(ErrorPolicy::Skip)
            .build()
            .unwrap();
        assert_eq!(config.language.as_deref(), Some("en"));
        assert_eq!(config.workers, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let config = Config::builder().workers(0usize).build().unwrap();
        assert!(matches!(config.validate(), Err(NttoError::Config(_))));
        let config = Config::builder().language("@fr").build().unwrap();
        assert!(matches!(config.validate(), Err(NttoError::Config(_))));
    }

    #[test]
    fn test_file_roundtrip_with_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ntto.json");
        std::fs::write(&path, r#"{"format": "json", "workers": 2}"#).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.workers, 2);
        assert!(config.abbreviate);

        let saved = dir.path().join("saved.json");
        config.save_to_file(&saved).unwrap();
        assert_eq!(Config::from_file(&saved).unwrap(), config);
    }

    #[test]
    fn test_file_with_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ntto.json");
        std::fs::write(&path, r#"{"format": "yaml"}"#).unwrap();
        let err = Config::from_file(&path).unwrap_err();
        let err = err.downcast_ref::<NttoError>().unwrap();
        assert!(matches!(err, NttoError::UnknownFormat(f) if f == "yaml"));
        assert_eq!(err.exit_code(), 4);

        std::fs::write(&path, r#"{"format": "ldj"}"#).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().format, OutputFormat::Json);
    }
}

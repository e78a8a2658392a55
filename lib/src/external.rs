//! Prefix rewriting delegated to an external text substitution pipeline.
//!
//! For very large files it can be faster to let `perl` (or the `replace`
//! utility) do the substitutions in a shell pipeline, one stage per rule
//! partition, than to parse every line. The result is always abbreviated
//! N-Triples: the substitutions are purely textual.

use crate::config::Config;
use crate::errors::{NttoError, Result};
use crate::io::{Sink, Source};
use crate::pipeline::{RunSummary, Strategy};
use crate::rules::{Rule, Rules};
use crate::writer::OutputFormat;
use log::{debug, info};
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Executive {
    Perl,
    Replace,
}

impl Executive {
    pub fn program(self) -> &'static str {
        match self {
            Executive::Perl => "perl",
            Executive::Replace => "replace",
        }
    }

    /// Picks `replace` when installed, `perl` otherwise.
    pub fn detect() -> Option<Self> {
        [Executive::Replace, Executive::Perl]
            .into_iter()
            .find(|e| find_in_path(e.program()).is_some())
    }
}

fn find_in_path(program: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Single-quotes `s` for `sh`.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[derive(Debug, Clone)]
pub struct External {
    rules: Rules,
    null_marker: String,
    stages: usize,
    executive: Executive,
}

impl External {
    pub fn new(rules: Rules, config: &Config, executive: Executive) -> Result<Self> {
        config.validate()?;
        if config.format != OutputFormat::NTriples {
            return Err(NttoError::Unsupported(format!(
                "external substitution only produces nt output, not {}",
                config.format
            )));
        }
        if config.language.is_some() {
            return Err(NttoError::Unsupported(
                "external substitution cannot filter by language".to_string(),
            ));
        }
        if let Some(rule) = rules
            .iter()
            .find(|r| r.prefix.contains('@') || r.shortcut.contains('@'))
        {
            return Err(NttoError::Unsupported(format!(
                "rule '{}' contains '@' and cannot be used in a substitution command",
                rule
            )));
        }
        Ok(External {
            rules,
            null_marker: config.null_marker.clone(),
            stages: config.workers,
            executive,
        })
    }

    fn replacement(&self, rule: &Rule) -> String {
        if rule.shortcut == self.null_marker {
            String::new()
        } else {
            format!("{}:", rule.shortcut)
        }
    }

    /// Renders the shell command that converts `source` into `sink`.
    pub fn command(&self, source: &Source, sink: &Sink) -> String {
        let input = match source {
            Source::Stdin => String::new(),
            Source::File(path) => format!(" < {}", shell_quote(&path.to_string_lossy())),
        };
        let mut command = match self.executive {
            Executive::Perl => {
                let stages: Vec<String> = self
                    .rules
                    .partition(self.stages)
                    .iter()
                    .enumerate()
                    .map(|(i, partition)| {
                        let substitutions: Vec<String> = partition
                            .iter()
                            .map(|r| format!("s@\\Q{}\\E@{}@g", r.prefix, self.replacement(r)))
                            .collect();
                        let stage = format!(
                            "LANG=C perl -lnpe {}",
                            shell_quote(&substitutions.join("; "))
                        );
                        if i == 0 {
                            stage + &input
                        } else {
                            stage
                        }
                    })
                    .collect();
                if stages.is_empty() {
                    format!("cat{}", input)
                } else {
                    stages.join(" | ")
                }
            }
            Executive::Replace => {
                let pairs: Vec<String> = self
                    .rules
                    .iter()
                    .map(|r| {
                        format!(
                            "{} {}",
                            shell_quote(&r.prefix),
                            shell_quote(&self.replacement(r))
                        )
                    })
                    .collect();
                format!("replace {}{}", pairs.join(" "), input)
            }
        };
        if let Sink::File(path) = sink {
            command.push_str(&format!(" > {}", shell_quote(&path.to_string_lossy())));
        }
        command
    }
}

impl Strategy for External {
    fn name(&self) -> &'static str {
        "external"
    }

    fn execute(&self, source: &Source, sink: &Sink) -> Result<RunSummary> {
        let start = Instant::now();
        let command = self.command(source, sink);
        debug!("running: {}", command);
        let status = Command::new("sh").arg("-c").arg(&command).status()?;
        if !status.success() {
            return Err(NttoError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} exited with {}", self.executive.program(), status),
            )));
        }
        let summary = RunSummary {
            elapsed: start.elapsed(),
            ..RunSummary::default()
        };
        info!("external substitution finished in {:.2?}", summary.elapsed);
        Ok(summary)
    }
}

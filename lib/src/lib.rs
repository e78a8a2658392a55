//! Bulk conversion of N-Triples dumps into abbreviated JSON, XML, TSV or
//! N-Triples records.
//!
//! Lines are parsed with a lenient whitespace splitter, optionally filtered
//! by the language tag of their object, stripped of brackets and quotes and
//! rewritten with a prefix table such as `dbp http://dbpedia.org/resource/`.
//! The work is spread over a pool of threads; see [`pipeline`].

extern crate derive_builder;

pub mod abbreviate;
pub mod config;
pub mod errors;
pub mod external;
pub mod io;
pub mod options;
pub mod pipeline;
pub mod rules;
pub mod triple;
pub mod writer;

pub use crate::abbreviate::{apply_rules, Abbreviator, DEFAULT_NULL_MARKER};
pub use crate::config::Config;
pub use crate::errors::{NttoError, Result};
pub use crate::external::{Executive, External};
pub use crate::io::{Sink, Source};
pub use crate::options::{ErrorPolicy, MatchMode};
pub use crate::pipeline::{LineOutcome, Pipeline, PipelineState, RunSummary, Strategy};
pub use crate::rules::{Rule, Rules, DEFAULT_RULES};
pub use crate::triple::{parse_ntriple, Triple};
pub use crate::writer::{new_writer, OutputFormat, TripleWriter};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes logging for the ntto library.
///
/// If `NTTO_LOG` is set, `RUST_LOG` is set to its value, so `NTTO_LOG` takes
/// precedence. The logger itself (e.g. `env_logger::try_init()`) must be
/// initialized after this call for the level to take effect.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("NTTO_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}

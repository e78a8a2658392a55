use anyhow::{anyhow, Error, Result};
use clap::Parser;
use log::info;
use ntto::config::Config;
use ntto::external::{Executive, External};
use ntto::io::{Sink, Source};
use ntto::options::{ErrorPolicy, MatchMode};
use ntto::pipeline::{Pipeline, Strategy};
use ntto::rules::Rules;
use ntto::writer::OutputFormat;
use ntto::NttoError;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ntto")]
#[command(version = ntto::VERSION)]
#[command(about = "Convert and abbreviate N-Triples dumps")]
struct Cli {
    /// N-Triples file to convert, `-` for standard input
    file: Option<String>,
    /// Abbreviate IRIs with the rule table
    #[clap(long, short, action)]
    abbreviate: bool,
    /// Output format: json, xml, tsv or nt
    #[clap(long, short)]
    format: Option<String>,
    /// Shorthand for --format json
    #[clap(long, short, action, conflicts_with = "format")]
    json: bool,
    /// Log and skip broken lines instead of stopping
    #[clap(long, short, action)]
    ignore: bool,
    /// Keep only literals without a language tag or tagged with LANGUAGE
    #[clap(long, short)]
    language: Option<String>,
    /// Shortcut that deletes a prefix instead of abbreviating it
    #[clap(long, short)]
    null: Option<String>,
    /// Write output to this file instead of standard output
    #[clap(long, short)]
    output: Option<PathBuf>,
    /// Rules file with `shortcut prefix` lines, the built-in table if not given
    #[clap(long, short)]
    rules: Option<PathBuf>,
    /// Number of worker threads, defaults to the number of processors
    #[clap(long, short)]
    workers: Option<usize>,
    /// Write records in input order
    #[clap(long, action)]
    ordered: bool,
    /// Stop at the first rule whose prefix matches a field
    #[clap(long, action)]
    first_match: bool,
    /// Let perl or replace do the substitutions; always abbreviates, nt output only
    #[clap(long, action)]
    external: bool,
    /// Print the external substitution command and exit
    #[clap(long, short = 'c', action)]
    dump_command: bool,
    /// Print the rule table and exit
    #[clap(long, short, action)]
    dump_rules: bool,
    /// JSON configuration file; flags given on the command line take precedence
    #[clap(long)]
    config: Option<PathBuf>,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false")]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false")]
    debug: bool,
}

pub fn run() -> Result<()> {
    ntto::init_logging();
    let cmd = match Cli::try_parse() {
        Ok(cmd) => cmd,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => return Err(Error::from(e)),
    };
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    ntto::init_logging();
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn build_config(cmd: &Cli) -> Result<Config> {
    let mut config = match &cmd.config {
        Some(path) => Config::from_file(path)?,
        None => Config::builder().abbreviate(cmd.abbreviate).build()?,
    };
    if cmd.abbreviate || cmd.external {
        config.abbreviate = true;
    }
    if cmd.json {
        config.format = OutputFormat::Json;
    } else if let Some(format) = &cmd.format {
        config.format = format.parse::<OutputFormat>()?;
    }
    if cmd.ignore {
        config.error_policy = ErrorPolicy::Skip;
    }
    if let Some(language) = &cmd.language {
        config.language = Some(language.clone());
    }
    if let Some(null) = &cmd.null {
        config.null_marker = null.clone();
    }
    if let Some(workers) = cmd.workers {
        config.workers = workers;
    }
    if cmd.ordered {
        config.ordered = true;
    }
    if cmd.first_match {
        config.match_mode = MatchMode::FirstMatch;
    }
    config.validate()?;
    Ok(config)
}

fn external(rules: Rules, config: &Config) -> Result<External> {
    let executive = Executive::detect().ok_or_else(|| {
        NttoError::Unsupported("external substitution requires perl or replace".to_string())
    })?;
    Ok(External::new(rules, config, executive)?)
}

fn execute(cmd: Cli) -> Result<()> {
    // The RUST_LOG env var is set by `init_logging` if NTTO_LOG is present.
    // CLI flags for verbosity take precedence. If nothing is set, we default to "warn".
    if cmd.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if cmd.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::try_init();

    let rules = match &cmd.rules {
        Some(path) => Rules::from_file(path)?,
        None => Rules::builtin()?,
    };
    info!("Loaded {} rules", rules.len());

    if cmd.dump_rules {
        println!("{}", rules.dump());
        return Ok(());
    }

    let config = build_config(&cmd)?;
    if cmd.verbose || cmd.debug {
        config.print();
    }

    let source: Source = match &cmd.file {
        Some(file) => file.parse()?,
        None => return Err(anyhow!("no input FILE given, use `-` for standard input")),
    };
    let sink = Sink::from(cmd.output.clone());

    if cmd.dump_command {
        let strategy = external(rules, &config)?;
        println!("{}", strategy.command(&source, &sink));
        return Ok(());
    }

    let strategy: Box<dyn Strategy> = if cmd.external {
        Box::new(external(rules, &config)?)
    } else {
        Box::new(Pipeline::new(config, &rules)?)
    };
    info!("Converting {} to {} ({})", source, sink, strategy.name());
    strategy.execute(&source, &sink)?;
    Ok(())
}

//! The concurrent line pipeline.
//!
//! One reader thread (the caller) hands lines to a fixed pool of workers over
//! a bounded channel. Each worker parses, filters, strips and abbreviates its
//! line and forwards the result to a single writer thread, the only thing
//! that touches the output. A run moves through
//! [`PipelineState::Init`] → `Streaming` → `Draining` → `Done`.
//!
//! Records come out in whatever order workers finish them unless
//! [`Config::ordered`] is set, in which case the writer buffers out-of-order
//! results and releases them by line number.

use crate::abbreviate::Abbreviator;
use crate::config::Config;
use crate::errors::{NttoError, Result};
use crate::io::{Sink, Source};
use crate::rules::Rules;
use crate::triple::{matches_language, parse_ntriple, Triple};
use crate::writer::{new_writer, TripleWriter};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Streaming,
    Draining,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Init => "init",
            PipelineState::Streaming => "streaming",
            PipelineState::Draining => "draining",
            PipelineState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lines_read: u64,
    pub records_written: u64,
    pub skipped_blank: u64,
    pub skipped_invalid: u64,
    pub filtered_language: u64,
    pub elapsed: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines read, {} records written, {} blank/comment, {} invalid, {} filtered by language in {:.2?}",
            self.lines_read,
            self.records_written,
            self.skipped_blank,
            self.skipped_invalid,
            self.filtered_language,
            self.elapsed
        )
    }
}

/// What became of a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Record(Triple),
    /// Blank line or comment.
    Blank,
    /// Literal object with a different language tag.
    Filtered,
}

#[derive(Debug, Copy, Clone)]
enum Skip {
    Blank,
    Filtered,
    Invalid,
}

#[derive(Debug)]
enum Message {
    Record(u64, Triple),
    Skipped(u64, Skip),
    Failed(u64, NttoError),
}

impl Message {
    fn seq(&self) -> u64 {
        match self {
            Message::Record(seq, _) | Message::Skipped(seq, _) | Message::Failed(seq, _) => *seq,
        }
    }
}

/// Executes a conversion from a source to a sink.
pub trait Strategy {
    fn name(&self) -> &'static str;

    fn execute(&self, source: &Source, sink: &Sink) -> Result<RunSummary>;
}

/// In-process conversion: parse, abbreviate and serialize every line on a
/// pool of worker threads.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    abbreviator: Option<Abbreviator>,
}

impl Pipeline {
    pub fn new(config: Config, rules: &Rules) -> Result<Self> {
        config.validate()?;
        let abbreviator = if config.abbreviate {
            Some(Abbreviator::with_null_marker(
                rules,
                &config.null_marker,
                config.match_mode,
            ))
        } else {
            None
        };
        Ok(Pipeline {
            config,
            abbreviator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one line through parse → language filter → strip → abbreviate.
    pub fn process_line(&self, line: &str) -> Result<LineOutcome> {
        let triple = match parse_ntriple(line)? {
            Some(triple) => triple,
            None => return Ok(LineOutcome::Blank),
        };
        if let Some(lang) = &self.config.language {
            if !matches_language(&triple.object, lang) {
                return Ok(LineOutcome::Filtered);
            }
        }
        let triple = if self.config.format.keeps_delimiters() {
            match &self.abbreviator {
                Some(abbr) => triple.map_fields(|f| abbr.apply_to_term(&f)),
                None => triple,
            }
        } else {
            let triple = triple.unembellished();
            match &self.abbreviator {
                Some(abbr) => triple.map_fields(|f| abbr.apply(&f).into_owned()),
                None => triple,
            }
        };
        Ok(LineOutcome::Record(triple))
    }

    fn classify(&self, seq: u64, raw: &[u8]) -> Message {
        let outcome = match std::str::from_utf8(raw) {
            Ok(line) => self.process_line(line),
            Err(_) => Err(NttoError::MalformedTriple {
                line_no: seq,
                line: String::from_utf8_lossy(raw).trim().to_string(),
            }),
        };
        match outcome {
            Ok(LineOutcome::Record(triple)) => Message::Record(seq, triple),
            Ok(LineOutcome::Blank) => Message::Skipped(seq, Skip::Blank),
            Ok(LineOutcome::Filtered) => Message::Skipped(seq, Skip::Filtered),
            Err(e) => {
                let e = e.at_line(seq);
                if self.config.error_policy.is_skip() {
                    warn!("{}", e);
                    Message::Skipped(seq, Skip::Invalid)
                } else {
                    Message::Failed(seq, e)
                }
            }
        }
    }

    /// Converts every line of `input` into records on `output`.
    ///
    /// With a single worker everything happens on the calling thread and the
    /// output keeps input order.
    pub fn run<R, W>(&self, input: R, output: W) -> Result<RunSummary>
    where
        R: BufRead,
        W: Write + Send,
    {
        let start = Instant::now();
        let mut state = PipelineState::Init;
        debug!(
            "pipeline {}: {} workers, format {}, abbreviate {}",
            state, self.config.workers, self.config.format, self.config.abbreviate
        );
        let result = if self.config.workers <= 1 {
            self.run_sequential(input, output, &mut state)
        } else {
            self.run_concurrent(input, output, &mut state)
        };
        advance(&mut state, PipelineState::Done);
        match result {
            Ok(mut summary) => {
                summary.elapsed = start.elapsed();
                info!("{}", summary);
                Ok(summary)
            }
            Err(e) => {
                error!("conversion stopped: {}", e);
                Err(e)
            }
        }
    }

    fn run_sequential<R, W>(
        &self,
        mut input: R,
        output: W,
        state: &mut PipelineState,
    ) -> Result<RunSummary>
    where
        R: BufRead,
        W: Write + Send,
    {
        let mut writer = new_writer(self.config.format, output);
        let mut summary = RunSummary::default();
        advance(state, PipelineState::Streaming);
        let mut buf = Vec::new();
        let streamed = (|| -> Result<()> {
            while next_line(&mut input, &mut buf)? {
                summary.lines_read += 1;
                let message = self.classify(summary.lines_read, &buf);
                emit(message, writer.as_mut(), &mut summary)?;
            }
            Ok(())
        })();
        advance(state, PipelineState::Draining);
        let finished = writer.finish();
        streamed.and(finished).map(|_| summary)
    }

    fn run_concurrent<R, W>(
        &self,
        input: R,
        output: W,
        state: &mut PipelineState,
    ) -> Result<RunSummary>
    where
        R: BufRead,
        W: Write + Send,
    {
        let capacity = self.config.queue_capacity;
        let (line_tx, line_rx) = mpsc::sync_channel::<(u64, Vec<u8>)>(capacity);
        let (result_tx, result_rx) = mpsc::sync_channel::<Message>(capacity);
        // dropped with the last worker, which unblocks a reader stuck on a full queue
        let line_rx = Arc::new(Mutex::new(line_rx));
        let abort = AtomicBool::new(false);
        let abort = &abort;

        thread::scope(|scope| -> Result<RunSummary> {
            let writer = thread::Builder::new()
                .name("ntto-writer".into())
                .spawn_scoped(scope, move || self.drain(result_rx, output, abort))?;

            let mut workers = Vec::with_capacity(self.config.workers);
            for id in 0..self.config.workers {
                let rx = Arc::clone(&line_rx);
                let tx = result_tx.clone();
                let handle = thread::Builder::new()
                    .name(format!("ntto-worker-{}", id))
                    .spawn_scoped(scope, move || self.work(rx, tx, abort))?;
                workers.push(handle);
            }
            drop(line_rx);
            drop(result_tx);

            advance(state, PipelineState::Streaming);
            let read = feed(input, line_tx, abort);

            advance(state, PipelineState::Draining);
            let mut panicked = false;
            for handle in workers {
                panicked |= handle.join().is_err();
            }
            let written = writer
                .join()
                .map_err(|_| thread_panicked("writer"))
                .and_then(|r| r);

            let lines_read = read?;
            if panicked {
                return Err(thread_panicked("worker"));
            }
            let mut summary = written?;
            summary.lines_read = lines_read;
            Ok(summary)
        })
    }

    fn work(
        &self,
        lines: Arc<Mutex<Receiver<(u64, Vec<u8>)>>>,
        results: SyncSender<Message>,
        abort: &AtomicBool,
    ) {
        loop {
            if abort.load(Ordering::Relaxed) {
                break;
            }
            let next = match lines.lock() {
                Ok(rx) => rx.recv(),
                Err(_) => break,
            };
            // closed channel: input exhausted
            let (seq, line) = match next {
                Ok(item) => item,
                Err(_) => break,
            };
            let message = self.classify(seq, &line);
            if matches!(message, Message::Failed(..)) {
                abort.store(true, Ordering::Relaxed);
            }
            if results.send(message).is_err() {
                break;
            }
        }
    }

    fn drain<W: Write + Send>(
        &self,
        results: Receiver<Message>,
        output: W,
        abort: &AtomicBool,
    ) -> Result<RunSummary> {
        let mut writer = new_writer(self.config.format, output);
        let mut summary = RunSummary::default();
        let drained = self.drain_into(results, writer.as_mut(), &mut summary);
        if drained.is_err() {
            abort.store(true, Ordering::Relaxed);
        }
        // keep whatever was written before a failure
        let finished = writer.finish();
        drained.and(finished).map(|_| summary)
    }

    fn drain_into(
        &self,
        results: Receiver<Message>,
        writer: &mut dyn TripleWriter,
        summary: &mut RunSummary,
    ) -> Result<()> {
        if !self.config.ordered {
            for message in results {
                emit(message, writer, summary)?;
            }
            return Ok(());
        }

        let mut pending: BTreeMap<u64, Message> = BTreeMap::new();
        let mut next_seq = 1;
        for message in results {
            pending.insert(message.seq(), message);
            while let Some(message) = pending.remove(&next_seq) {
                emit(message, writer, summary)?;
                next_seq += 1;
            }
        }
        // gaps are only left behind when a failure stopped the reader early
        for (_, message) in pending {
            if let Message::Failed(_, e) = message {
                return Err(e);
            }
        }
        Ok(())
    }
}

impl Strategy for Pipeline {
    fn name(&self) -> &'static str {
        "in-process"
    }

    fn execute(&self, source: &Source, sink: &Sink) -> Result<RunSummary> {
        let input = source.open()?;
        let output = sink.open()?;
        self.run(input, output)
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    debug!("pipeline {} -> {}", state, next);
    *state = next;
}

/// Reads the next line into `buf` without its `\n` or `\r\n` terminator.
/// Bytes are not decoded here, so a line of broken UTF-8 stays a per-line
/// failure instead of an I/O error for the whole stream.
fn next_line<R: BufRead>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if input.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(true)
}

fn feed<R: BufRead>(
    mut input: R,
    lines: SyncSender<(u64, Vec<u8>)>,
    abort: &AtomicBool,
) -> Result<u64> {
    let mut seq = 0;
    let mut buf = Vec::new();
    loop {
        if abort.load(Ordering::Relaxed) {
            break;
        }
        match next_line(&mut input, &mut buf) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                abort.store(true, Ordering::Relaxed);
                return Err(e.into());
            }
        }
        seq += 1;
        if lines.send((seq, std::mem::take(&mut buf))).is_err() {
            break;
        }
    }
    Ok(seq)
}

fn emit(message: Message, writer: &mut dyn TripleWriter, summary: &mut RunSummary) -> Result<()> {
    match message {
        Message::Record(_, triple) => {
            writer.write_triple(&triple)?;
            summary.records_written += 1;
        }
        Message::Skipped(_, Skip::Blank) => summary.skipped_blank += 1,
        Message::Skipped(_, Skip::Filtered) => summary.filtered_language += 1,
        Message::Skipped(_, Skip::Invalid) => summary.skipped_invalid += 1,
        Message::Failed(_, e) => return Err(e),
    }
    Ok(())
}

fn thread_panicked(which: &str) -> NttoError {
    NttoError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("{} thread panicked", which),
    ))
}

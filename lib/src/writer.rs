//! Record writers, one per output format.
//!
//! Every writer emits exactly one newline terminated record per triple. The
//! XML writer produces a stream of `<t>` fragments without a root element.

use crate::errors::{NttoError, Result};
use crate::triple::Triple;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Xml,
    Tsv,
    #[default]
    #[serde(rename = "nt")]
    NTriples,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Json,
        OutputFormat::Xml,
        OutputFormat::Tsv,
        OutputFormat::NTriples,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
            OutputFormat::Tsv => "tsv",
            OutputFormat::NTriples => "nt",
        }
    }

    /// N-Triples output keeps brackets and quotes, the structured formats
    /// carry bare values.
    pub fn keeps_delimiters(self) -> bool {
        matches!(self, OutputFormat::NTriples)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = NttoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "ldj" | "jsonl" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            "tsv" => Ok(OutputFormat::Tsv),
            "nt" | "ntriples" | "n-triples" => Ok(OutputFormat::NTriples),
            _ => Err(NttoError::UnknownFormat(s.to_string())),
        }
    }
}

// accepts the same names and aliases as `FromStr`
impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

pub trait TripleWriter {
    fn write_triple(&mut self, triple: &Triple) -> Result<()>;

    /// Flushes buffered output. Called once after the last record.
    fn finish(&mut self) -> Result<()>;
}

/// Creates the writer for `format` around `out`.
pub fn new_writer<'a, W>(format: OutputFormat, out: W) -> Box<dyn TripleWriter + Send + 'a>
where
    W: Write + Send + 'a,
{
    match format {
        OutputFormat::Json => Box::new(JsonWriter { out }),
        OutputFormat::Xml => Box::new(XmlWriter { out }),
        OutputFormat::Tsv => Box::new(TsvWriter { out }),
        OutputFormat::NTriples => Box::new(NTriplesWriter { out }),
    }
}

/// One compact JSON object per line: `{"s":…,"p":…,"o":…}`.
pub struct JsonWriter<W> {
    out: W,
}

impl<W: Write> TripleWriter for JsonWriter<W> {
    fn write_triple(&mut self, triple: &Triple) -> Result<()> {
        serde_json::to_writer(&mut self.out, triple)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(self.out.flush()?)
    }
}

pub struct XmlWriter<W> {
    out: W,
}

impl<W: Write> TripleWriter for XmlWriter<W> {
    fn write_triple(&mut self, triple: &Triple) -> Result<()> {
        use quick_xml::escape::escape;
        writeln!(
            self.out,
            "<t><s>{}</s><p>{}</p><o>{}</o></t>",
            escape(&triple.subject),
            escape(&triple.predicate),
            escape(&triple.object)
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(self.out.flush()?)
    }
}

/// Tab separated values. Tabs or newlines inside a field are not escaped.
pub struct TsvWriter<W> {
    out: W,
}

impl<W: Write> TripleWriter for TsvWriter<W> {
    fn write_triple(&mut self, triple: &Triple) -> Result<()> {
        writeln!(
            self.out,
            "{}\t{}\t{}",
            triple.subject, triple.predicate, triple.object
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(self.out.flush()?)
    }
}

pub struct NTriplesWriter<W> {
    out: W,
}

impl<W: Write> TripleWriter for NTriplesWriter<W> {
    fn write_triple(&mut self, triple: &Triple) -> Result<()> {
        writeln!(
            self.out,
            "{} {} {} .",
            triple.subject, triple.predicate, triple.object
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(self.out.flush()?)
    }
}

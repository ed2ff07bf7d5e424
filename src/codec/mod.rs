//! Metric encoding and decoding
//!
//! Metrics travel one per line, either as Influx line protocol or as JSON
//! objects. [`MetricReader`] and [`MetricWriter`] wrap buffered I/O for the
//! command-line filter.

pub mod json;
pub mod line_protocol;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

use crate::error::CodecResult;
use crate::metric::Metric;
use crate::transformer::to_valid_utf8;

pub use json::{format_json, parse_json};
pub use line_protocol::{format_line, parse_line};

/// Wire format of a metric stream
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Influx line protocol
    #[default]
    Line,
    /// JSON object per line
    Json,
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFormat::Line => write!(f, "line"),
            DataFormat::Json => write!(f, "json"),
        }
    }
}

/// Decode one line in the given format
pub fn decode(format: DataFormat, line: &str) -> CodecResult<Metric> {
    match format {
        DataFormat::Line => parse_line(line),
        DataFormat::Json => parse_json(line),
    }
}

/// Encode one metric in the given format, without trailing newline
pub fn encode(format: DataFormat, metric: &Metric) -> CodecResult<String> {
    match format {
        DataFormat::Line => format_line(metric),
        DataFormat::Json => format_json(metric),
    }
}

/// Line-oriented metric reader
///
/// Yields `(line_number, result)` pairs; line numbers start at 1. Blank
/// lines and lines starting with `#` are skipped. Bytes that are not valid
/// UTF-8 are replaced with U+FFFD before decoding.
pub struct MetricReader<R> {
    lines: std::io::Split<R>,
    format: DataFormat,
    line_number: usize,
}

impl<R: BufRead> MetricReader<R> {
    /// Create a reader over buffered input
    pub fn new(reader: R, format: DataFormat) -> Self {
        Self {
            lines: reader.split(b'\n'),
            format,
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for MetricReader<R> {
    type Item = (usize, CodecResult<Metric>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.lines.next()?;
            self.line_number += 1;

            let bytes = match next {
                Ok(bytes) => bytes,
                Err(e) => return Some((self.line_number, Err(e.into()))),
            };

            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(
                        line = self.line_number,
                        "Input is not valid UTF-8, replacing invalid bytes"
                    );
                    to_valid_utf8(err.as_bytes(), "\u{FFFD}")
                }
            };

            let line = text.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            return Some((self.line_number, decode(self.format, line)));
        }
    }
}

/// Line-oriented metric writer
pub struct MetricWriter<W> {
    writer: W,
    format: DataFormat,
}

impl<W: Write> MetricWriter<W> {
    /// Create a writer over the given output
    pub fn new(writer: W, format: DataFormat) -> Self {
        Self { writer, format }
    }

    /// Encode and write one metric followed by a newline
    pub fn write(&mut self, metric: &Metric) -> CodecResult<()> {
        let line = encode(self.format, metric)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> CodecResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

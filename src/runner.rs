//! Stream runner
//!
//! Reads metrics from a buffered input, applies the processor batch by
//! batch and writes the results. Lines that cannot be decoded are logged
//! and skipped; every decoded metric reaches the processor.

use std::io::{BufRead, Write};

use tracing::{info, warn};

use crate::codec::{MetricReader, MetricWriter};
use crate::config::Config;
use crate::error::AppResult;
use crate::metric::Metric;
use crate::transformer::StringsProcessor;

/// Counters describing one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Metrics written to the output
    pub processed: usize,
    /// Input lines that could not be decoded
    pub skipped: usize,
    /// Processed metrics the output format could not represent
    pub unencodable: usize,
    /// Batches handed to the processor
    pub batches: usize,
}

/// Process every metric from `input` and write it to `output`
///
/// Formats and batch size come from `config`.
///
/// # Errors
///
/// Returns an error only when reading or writing the stream itself fails.
pub fn run<R: BufRead, W: Write>(
    config: &Config,
    processor: &StringsProcessor,
    input: R,
    output: W,
) -> AppResult<RunSummary> {
    let rules = processor.compile();
    info!(
        rules = rules.len(),
        input_format = %config.input_format,
        output_format = %config.output_format,
        "Processing metrics"
    );

    let reader = MetricReader::new(input, config.input_format);
    let mut writer = MetricWriter::new(output, config.output_format);
    let mut summary = RunSummary::default();
    let mut batch: Vec<Metric> = Vec::with_capacity(config.batch_size);

    for (line, result) in reader {
        match result {
            Ok(metric) => {
                batch.push(metric);
                if batch.len() >= config.batch_size {
                    flush_batch(processor, &mut batch, &mut writer, &mut summary)?;
                }
            }
            Err(e) if e.is_per_line() => {
                warn!(line, error = %e, "Skipping undecodable input line");
                summary.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if !batch.is_empty() {
        flush_batch(processor, &mut batch, &mut writer, &mut summary)?;
    }
    writer.flush()?;

    Ok(summary)
}

fn flush_batch<W: Write>(
    processor: &StringsProcessor,
    batch: &mut Vec<Metric>,
    writer: &mut MetricWriter<W>,
    summary: &mut RunSummary,
) -> AppResult<()> {
    let metrics = processor.apply(std::mem::take(batch));
    summary.batches += 1;

    for metric in &metrics {
        match writer.write(metric) {
            Ok(()) => summary.processed += 1,
            Err(e) if e.is_per_line() => {
                warn!(measurement = %metric.name, error = %e, "Metric cannot be encoded, skipping");
                summary.unencodable += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

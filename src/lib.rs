//! strings-processor library
//!
//! This crate provides declarative string transformations over telemetry
//! metrics: measurement names, tag keys and values, field keys and string
//! field values. Metrics are read and written as Influx line protocol or
//! JSON lines.

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod metric;
pub mod runner;
pub mod transformer;

use anyhow::Result;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::cli::LogFormat;

/// Initialize the logging subsystem
///
/// Logs are written to stderr so that stdout carries only metrics.
///
/// # Arguments
/// * `level` - Default level, used when `RUST_LOG` is not set
/// * `format` - Human-readable text or one JSON object per event
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: tracing::Level, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
    });
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

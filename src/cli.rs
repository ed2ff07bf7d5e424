//! CLI argument parsing for strings-processor
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: strings.yaml, env: STRINGS_CONFIG)
//! - `--input` / `-i`: Input file (default: stdin, env: STRINGS_INPUT)
//! - `--output` / `-o`: Output file (default: stdout, env: STRINGS_OUTPUT)
//! - `--input-format`: Input metric format, line or json (env: STRINGS_INPUT_FORMAT)
//! - `--output-format`: Output metric format, line or json (env: STRINGS_OUTPUT_FORMAT)
//! - `--batch-size`: Metrics per processor batch (env: STRINGS_BATCH_SIZE)
//! - `--validate`: Validate configuration and exit
//! - `--dry-run`: Show the compiled converters and exit
//! - `--report-format`: Output format for --dry-run (text/json/yaml)
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: STRINGS_LOG_LEVEL)
//! - `--log-format`: Log line format (text/json, env: STRINGS_LOG_FORMAT)
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::codec::DataFormat;
use crate::config::Config;

/// strings-processor - rewrite metric names, tags and fields
///
/// Reads metrics (Influx line protocol or JSON lines), applies the
/// configured string converters and writes the metrics back out.
/// Logs go to stderr so stdout stays a clean metric stream.
#[derive(Parser, Debug)]
#[command(name = "strings-processor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "strings.yaml",
        env = "STRINGS_CONFIG"
    )]
    pub config: PathBuf,

    /// Read metrics from FILE instead of stdin
    #[arg(short, long, value_name = "FILE", env = "STRINGS_INPUT")]
    pub input: Option<PathBuf>,

    /// Write metrics to FILE instead of stdout
    #[arg(short, long, value_name = "FILE", env = "STRINGS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Input metric format (overrides config file)
    #[arg(long, value_enum, env = "STRINGS_INPUT_FORMAT")]
    pub input_format: Option<DataFormat>,

    /// Output metric format (overrides config file)
    #[arg(long, value_enum, env = "STRINGS_OUTPUT_FORMAT")]
    pub output_format: Option<DataFormat>,

    /// Number of metrics processed per batch (overrides config file)
    #[arg(long, value_name = "N", env = "STRINGS_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Validate configuration and exit
    #[arg(long)]
    pub validate: bool,

    /// Show the compiled converters and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for --dry-run
    #[arg(long, value_enum, default_value = "text")]
    pub report_format: ReportFormat,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "STRINGS_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", env = "STRINGS_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Apply command-line and environment overrides on top of the file config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(format) = self.input_format {
            config.input_format = format;
        }
        if let Some(format) = self.output_format {
            config.output_format = format;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log line format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// One JSON object per event
    Json,
}

/// Output format options for dry-run mode
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Yaml => write!(f, "yaml"),
        }
    }
}

//! strings-processor - declarative string transformations for metrics
//!
//! This binary reads metrics from stdin or a file, applies the configured
//! string converters and writes the metrics to stdout or a file.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use strings_processor::{
    cli::{Cli, ReportFormat},
    config::Config,
    error::{AppError, AppResult},
    runner,
    transformer::{RuleSet, StringsProcessor},
};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    strings_processor::init_logging(cli.log_level.into(), cli.log_format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %cli.log_level,
        "Starting strings-processor"
    );

    let config = load_config(&cli)?;

    let processor = StringsProcessor::new(config.strings.clone());

    if cli.validate {
        let rules = processor.compile();
        println!("Configuration is valid ({} rules)", rules.len());
        return Ok(());
    }

    if cli.dry_run {
        print_rules(processor.compile(), cli.report_format)?;
        return Ok(());
    }

    let summary = match (&cli.input, &cli.output) {
        (Some(input), Some(output)) => {
            runner::run(&config, &processor, open_input(input)?, create_output(output)?)?
        }
        (Some(input), None) => runner::run(
            &config,
            &processor,
            open_input(input)?,
            BufWriter::new(io::stdout().lock()),
        )?,
        (None, Some(output)) => {
            runner::run(&config, &processor, io::stdin().lock(), create_output(output)?)?
        }
        (None, None) => runner::run(
            &config,
            &processor,
            io::stdin().lock(),
            BufWriter::new(io::stdout().lock()),
        )?,
    };

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        unencodable = summary.unencodable,
        batches = summary.batches,
        "Finished processing metrics"
    );

    Ok(())
}

/// Load the config file and layer CLI and environment overrides on top
fn load_config(cli: &Cli) -> AppResult<Config> {
    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn open_input(path: &Path) -> Result<BufReader<File>, AppError> {
    File::open(path).map(BufReader::new).map_err(|source| AppError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn create_output(path: &Path) -> Result<BufWriter<File>, AppError> {
    File::create(path).map(BufWriter::new).map_err(|source| AppError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Print the compiled rules in the requested format
fn print_rules(rules: &RuleSet, format: ReportFormat) -> Result<()> {
    let mut stdout = io::stdout().lock();

    match format {
        ReportFormat::Text => {
            writeln!(stdout, "Compiled {} rules:", rules.len())?;
            for (index, rule) in rules.iter().enumerate() {
                writeln!(stdout, "  [{}] {}", index, rule)?;
            }
        }
        ReportFormat::Json => {
            writeln!(stdout, "{}", serde_json::to_string_pretty(rules)?)?;
        }
        ReportFormat::Yaml => {
            write!(stdout, "{}", serde_yaml::to_string(rules)?)?;
        }
    }

    Ok(())
}

//! Extractor - log-to-metric extraction
//!
//! Watches a text log file, parses each line against a declarative schema,
//! and publishes structured counter events to a message bus.
//!
//! # Usage
//!
//! ```bash
//! # Tail a live log from its end, forever
//! extractor follow /var/log/app.log
//! extractor follow --config /etc/extractor/config.json /var/log/app.log
//!
//! # Process an existing file once, from the start
//! extractor process /var/log/app.log
//!
//! # Add an ad-hoc metric from command-line field overrides
//! extractor process -n lines -f '!0:at:timestamp' -f '1:status:number' /var/log/app.log
//! ```

mod cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use extractor_config::{Config, LogConfig, LogFormat};

/// Extractor - log-to-metric extraction
#[derive(Parser, Debug)]
#[command(name = "extractor")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Delimiter used by command-line field overrides
    #[arg(short, long, default_value = "=", global = true)]
    delim: String,

    /// Field overrides in the form '[!]position[:label[:type]]'
    #[arg(short = 'f', long = "field", global = true)]
    fields: Vec<String>,

    /// Metric name for the definition built from field overrides
    #[arg(short = 'n', long, default_value = "cmdline", global = true)]
    name: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tail a log file from its current end, following rotations
    Follow {
        /// File to consume
        path: PathBuf,
    },

    /// Process an existing file from the start, once
    Process {
        /// File to consume
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    init_logging(&config.log)?;

    cmd::apply_field_overrides(&mut config, &cli.fields, &cli.delim, &cli.name);
    config.validate().context("invalid configuration")?;

    match cli.command {
        Command::Follow { path } => cmd::follow::run(config, path).await,
        Command::Process { path } => cmd::process::run(config, path).await,
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.level.as_str())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match config.format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }

    Ok(())
}

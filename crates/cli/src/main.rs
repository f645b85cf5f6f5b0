//! # Delivery Tester CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Settings loading and validation
//! - A bulk delivery run with live progress
//! - Ctrl+C handling that stops the run between attempts

mod cli;
mod commands;
mod error;
mod stats;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_delivery, run_validate, RunOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Delivery tester starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => match run_delivery(args).await {
            Ok(RunOutcome::Completed) => Ok(()),
            Ok(RunOutcome::Stopped) => {
                info!("Run stopped by user");
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(observability_config(cli))
}

fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let log_format = match cli.log_format {
        cli::LogFormat::Json => observability::LogFormat::Json,
        cli::LogFormat::Pretty => observability::LogFormat::Pretty,
        cli::LogFormat::Compact => observability::LogFormat::Compact,
    };

    ObservabilityConfig {
        log_format,
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
    }
}

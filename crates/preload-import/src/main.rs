//! Preload Import - Main entry point

use anyhow::Context;
use clap::Parser;
use preload_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use preload_import::{Cli, Commands, ImportOutcome};
use std::process;
use tracing::error;

/// Exit code after an interrupted import, as for SIGINT
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Verbose mode logs debug to the console, otherwise only warnings
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("preload-import")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.clone().merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring logging environment: {}", e);
            log_config
        }
    };

    // The CLI works without logging
    let log_guard = init_logging(&log_config).ok();

    let code = match execute_command(&cli).await {
        Ok(ImportOutcome::Succeeded) => 0,
        Ok(ImportOutcome::Cancelled) => EXIT_CANCELLED,
        Ok(ImportOutcome::Failed) => 1,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Command failed");
            eprintln!("Error: {:#}", e);
            1
        }
    };

    // Flush file logs before exiting
    drop(log_guard);
    process::exit(code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<ImportOutcome> {
    let config = cli
        .import_config()
        .context("Failed to resolve import configuration")?;

    match &cli.command {
        Commands::Run { json, .. } => {
            let outcome = preload_import::commands::run::run(config, *json).await?;
            Ok(outcome)
        }

        Commands::Status { limit } => {
            preload_import::commands::status::run(&config, *limit).await?;
            Ok(ImportOutcome::Succeeded)
        }

        Commands::Reset => {
            preload_import::commands::reset::run(&config).await?;
            Ok(ImportOutcome::Succeeded)
        }
    }
}

//! `preload-import run` command implementation
//!
//! Starts one import session and follows it until a terminal event. Ctrl-C
//! cancels the session; the worker then rolls back before it stops.

use crate::config::ImportConfig;
use crate::error::Result;
use crate::observer::ChannelObserver;
use crate::progress::{create_import_progress, render_event};
use crate::session::ImportSession;
use crate::types::ImportOutcome;
use colored::Colorize;
use preload_common::PreloadError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run the import and return how the session ended
pub async fn run(config: ImportConfig, json: bool) -> Result<ImportOutcome> {
    info!(
        input = %config.input_path.display(),
        database = %config.database_path.display(),
        "Starting import"
    );

    let (observer, mut events) = ChannelObserver::channel();
    let session = ImportSession::new(config.coordinator(Arc::new(observer)));

    if !session.start() {
        return Err(PreloadError::state("Import worker could not be started").into());
    }

    let pb = (!json).then(create_import_progress);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    debug!("Event channel closed before a terminal event");
                    break;
                };

                if json {
                    println!("{}", serde_json::to_string(&event).map_err(PreloadError::from)?);
                } else if let Some(pb) = &pb {
                    render_event(pb, &event);
                }

                if event.is_terminal() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c(), if !session.is_cancelled() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                if !json {
                    eprintln!("{}", "Cancelling import...".yellow());
                }
                session.cancel();
            }
        }
    }

    let outcome = session.join().await.unwrap_or(ImportOutcome::Failed);

    if !json {
        print_summary(&config, outcome);
    }

    Ok(outcome)
}

fn print_summary(config: &ImportConfig, outcome: ImportOutcome) {
    println!();
    match outcome {
        ImportOutcome::Succeeded => {
            println!("{} {}", "✓".green().bold(), "Import finished".green());
            println!("  Database: {}", config.database_path.display());
        }
        ImportOutcome::Cancelled => {
            println!("{} {}", "!".yellow().bold(), "Import cancelled".yellow());
            println!("  Run the command again to import from scratch.");
        }
        ImportOutcome::Failed => {
            println!("{} {}", "✗".red().bold(), "Import failed".red());
            println!("  Input:    {}", config.input_path.display());
            println!("  Run with --verbose for details.");
        }
    }
}

//! Preload Import Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! One-shot bulk import of a tab-separated dataset into SQLite, run on a
//! background worker with coarse progress reporting and cooperative
//! cancellation.
//!
//! # Overview
//!
//! - **Parsing**: [`record`] turns `name<TAB>identifier` lines into records
//! - **Loading**: [`loader`] materializes the whole input before any write
//! - **Storage**: [`sink`] wraps a single SQLite write transaction
//! - **Coordination**: [`coordinator`] sequences load, insert and commit or
//!   rollback, and decides the outcome
//! - **Notifications**: [`observer`] delivers started / progress / terminal
//!   events to the host
//! - **Control**: [`session`] starts, cancels and joins the worker
//!
//! # Example
//!
//! ```no_run
//! use preload_import::{ChannelObserver, ImportConfig, ImportSession};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (observer, mut events) = ChannelObserver::channel();
//!     let session = ImportSession::new(ImportConfig::from_env()?.coordinator(Arc::new(observer)));
//!
//!     session.start();
//!     while let Some(event) = events.recv().await {
//!         tracing::info!(?event, "import event");
//!     }
//!     let outcome = session.join().await;
//!     tracing::info!(?outcome, "import finished");
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod flags;
pub mod loader;
pub mod observer;
pub mod progress;
pub mod record;
pub mod session;
pub mod sink;
pub mod types;

// Re-export commonly used types
pub use config::ImportConfig;
pub use coordinator::ImportCoordinator;
pub use error::{ImportError, Result};
pub use flags::{FlagStore, MemoryFlagStore, StateFile};
pub use loader::{DatasetSource, FileSource, TextSource};
pub use observer::{ChannelObserver, ImportEvent, ImportObserver};
pub use record::Record;
pub use session::ImportSession;
pub use sink::{SqliteSink, TransactionalSink};
pub use types::{FailureKind, ImportOutcome, ImportState};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Preload - bulk import of tab-separated records into SQLite
#[derive(Parser, Debug)]
#[command(name = "preload-import")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(short, long, env = "PRELOAD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// First-run state file
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import the dataset unless it was already imported
    Run {
        /// Tab-separated input file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Pause in milliseconds before each checkpoint when nothing needs importing
        #[arg(long)]
        idle_wait_ms: Option<u64>,

        /// Print events as JSON lines instead of a progress bar
        #[arg(long)]
        json: bool,
    },

    /// Show the first-run flag and what is stored
    Status {
        /// Number of stored records to list
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Delete stored records and mark the import as pending again
    Reset,
}

impl Cli {
    /// Resolve the effective configuration: defaults, file, environment, flags
    pub fn import_config(&self) -> preload_common::Result<ImportConfig> {
        let base = match &self.config {
            Some(path) => ImportConfig::from_file(path)?,
            None => ImportConfig::default(),
        };
        let mut config = base.merge_env()?;

        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }

        if let Some(state_file) = &self.state_file {
            config.state_path = state_file.clone();
        }

        if let Commands::Run {
            input,
            idle_wait_ms,
            ..
        } = &self.command
        {
            if let Some(input) = input {
                config.input_path = input.clone();
            }
            if let Some(wait) = idle_wait_ms {
                config.idle_wait_ms = *wait;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::parse_from([
            "preload-import",
            "--database",
            "/tmp/cli.db",
            "run",
            "--input",
            "/tmp/cli.tsv",
            "--idle-wait-ms",
            "0",
        ]);

        let config = cli.import_config().unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/cli.db"));
        assert_eq!(config.input_path, PathBuf::from("/tmp/cli.tsv"));
        assert_eq!(config.idle_wait_ms, 0);
    }

    #[test]
    fn test_reset_takes_no_arguments() {
        let cli = Cli::parse_from(["preload-import", "reset"]);
        assert!(matches!(cli.command, Commands::Reset));
        assert!(Cli::try_parse_from(["preload-import", "reset", "--purge"]).is_err());
    }
}

//! `preload-import reset` command implementation
//!
//! Deletes every stored record and marks the import as pending, so the next
//! `run` imports the dataset again from scratch.

use crate::config::ImportConfig;
use crate::error::Result;
use crate::flags::{FlagStore, StateFile};
use crate::sink::sqlite::purge_records;
use colored::Colorize;
use tracing::info;

/// Purge stored records, then reset the first-run flag
///
/// Records go first: a pending flag over a non-empty store would make every
/// later import fail on the unique identifier.
pub async fn run(config: &ImportConfig) -> Result<()> {
    let removed = purge_records(&config.database_path)?;
    info!(removed, "Stored records purged");
    println!("{} Removed {} records", "✓".green(), removed);

    StateFile::new(&config.state_path).set_first_run(true)?;
    info!(state_file = %config.state_path.display(), "First-run flag reset");
    println!("{} Import marked as pending", "✓".green());

    Ok(())
}

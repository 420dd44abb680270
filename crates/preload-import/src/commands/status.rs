//! `preload-import status` command implementation
//!
//! Shows the first-run flag, the last outcome and a sample of stored records.

use crate::config::ImportConfig;
use crate::error::Result;
use crate::flags::StateFile;
use crate::sink::sqlite::{count_records, list_records};
use colored::Colorize;

/// Show the import status
pub async fn run(config: &ImportConfig, limit: usize) -> Result<()> {
    let state = StateFile::new(&config.state_path).load()?;
    let total = count_records(&config.database_path)?;

    println!("{}", "Import State:".cyan().bold());
    if state.first_run {
        println!("  Pending:      {}", "yes".yellow());
    } else {
        println!("  Pending:      {}", "no".green());
    }
    match state.last_outcome {
        Some(outcome) => println!("  Last outcome: {}", outcome),
        None => println!("  Last outcome: {}", "never run".dimmed()),
    }
    if let Some(updated_at) = state.updated_at {
        println!("  Updated:      {}", updated_at.to_rfc3339());
    }
    println!("  State file:   {}", config.state_path.display());
    println!();

    println!("{}", "Storage:".cyan().bold());
    println!("  Database: {}", config.database_path.display());
    println!("  Records:  {}", total);

    if total == 0 {
        println!();
        println!("No records stored.");
        println!("Run 'preload-import run' to import the dataset.");
        return Ok(());
    }

    let records = list_records(&config.database_path, limit)?;
    println!();
    for record in &records {
        println!("  {}  {}", record.identifier.green(), record.name);
    }
    if total > records.len() as u64 {
        println!("  {}", format!("... and {} more", total - records.len() as u64).dimmed());
    }

    Ok(())
}

//! SQLite schema for imported records

use crate::error::Result;
use rusqlite::Connection;

/// Table receiving imported records
pub const RECORDS_TABLE: &str = "records";

/// Create the records table if it does not exist yet
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            identifier TEXT NOT NULL UNIQUE,
            imported_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_records_name ON records(name)",
        [],
    )?;

    Ok(())
}

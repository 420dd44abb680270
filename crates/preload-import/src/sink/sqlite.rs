//! SQLite-backed sink

use super::schema::init_schema;
use super::TransactionalSink;
use crate::error::{ImportError, Result};
use crate::record::Record;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const INSERT_RECORD: &str = "INSERT INTO records (name, identifier) VALUES (?1, ?2)";

/// Writes records into a SQLite database file
///
/// The connection is opened lazily by [`TransactionalSink::open`] so the sink
/// can be built on the host side and moved into the import worker.
pub struct SqliteSink {
    path: PathBuf,
    conn: Option<Connection>,
}

impl SqliteSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a write transaction is currently open
    pub fn in_transaction(&self) -> bool {
        self.conn.as_ref().is_some_and(|conn| !conn.is_autocommit())
    }

    fn connection(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| ImportError::storage("database is not open"))
    }

    fn require_transaction(&self) -> Result<&Connection> {
        let conn = self.connection()?;
        if conn.is_autocommit() {
            return Err(ImportError::storage("no active transaction"));
        }
        Ok(conn)
    }
}

impl TransactionalSink for SqliteSink {
    fn open(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ImportError::storage(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(&self.path).map_err(|e| {
            ImportError::storage(format!(
                "Failed to open database {}: {}",
                self.path.display(),
                e
            ))
        })?;
        init_schema(&conn)?;

        debug!(path = %self.path.display(), "Database opened");
        self.conn = Some(conn);
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        let conn = self.connection()?;
        if !conn.is_autocommit() {
            return Err(ImportError::storage("transaction already open"));
        }

        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn insert(&mut self, record: &Record) -> Result<()> {
        let conn = self.require_transaction()?;
        let mut stmt = conn.prepare_cached(INSERT_RECORD)?;
        stmt.execute(params![record.name, record.identifier])
            .map_err(|e| {
                ImportError::storage(format!(
                    "Failed to insert record '{}': {}",
                    record.identifier, e
                ))
            })?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.require_transaction()?.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Ok(());
        }

        self.connection()?.execute_batch("ROLLBACK")?;
        debug!(path = %self.path.display(), "Transaction rolled back");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.rollback()?;

        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| ImportError::from(e))?;
            debug!(path = %self.path.display(), "Database closed");
        }
        Ok(())
    }
}

impl Drop for SqliteSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "Failed to close database");
        }
    }
}

fn open_existing(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }

    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(Some(conn))
}

/// Number of stored records; zero when the database does not exist yet
pub fn count_records(path: &Path) -> Result<u64> {
    let Some(conn) = open_existing(path)? else {
        return Ok(0);
    };

    let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

/// Stored records in insertion order, at most `limit` of them
pub fn list_records(path: &Path, limit: usize) -> Result<Vec<Record>> {
    let Some(conn) = open_existing(path)? else {
        return Ok(Vec::new());
    };

    let mut stmt = conn.prepare("SELECT name, identifier FROM records ORDER BY id ASC LIMIT ?1")?;
    let rows = stmt.query_map([limit as i64], |row| {
        Ok(Record::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let records = rows.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Delete every stored record in one transaction, returning how many went
pub fn purge_records(path: &Path) -> Result<usize> {
    let Some(mut conn) = open_existing(path)? else {
        return Ok(0);
    };

    let tx = conn.transaction()?;
    let deleted = tx.execute("DELETE FROM records", [])?;
    tx.commit()?;
    Ok(deleted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sink_in(dir: &tempfile::TempDir) -> SqliteSink {
        SqliteSink::new(dir.path().join("preload.db"))
    }

    #[test]
    fn test_commit_makes_records_visible() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        sink.begin().unwrap();
        sink.insert(&Record::new("Ada", "001")).unwrap();
        sink.insert(&Record::new("Ben", "002")).unwrap();
        sink.commit().unwrap();
        sink.close().unwrap();

        let records = list_records(sink.path(), 10).unwrap();
        assert_eq!(records, vec![Record::new("Ada", "001"), Record::new("Ben", "002")]);
    }

    #[test]
    fn test_rollback_discards_staged_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        sink.begin().unwrap();
        sink.insert(&Record::new("Ada", "001")).unwrap();
        sink.rollback().unwrap();
        sink.close().unwrap();

        assert_eq!(count_records(sink.path()).unwrap(), 0);
    }

    #[test]
    fn test_close_with_open_transaction_discards_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        sink.begin().unwrap();
        sink.insert(&Record::new("Ada", "001")).unwrap();
        sink.close().unwrap();

        assert_eq!(count_records(sink.path()).unwrap(), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        sink.close().unwrap();
        sink.close().unwrap();
        assert!(!sink.in_transaction());
    }

    #[test]
    fn test_insert_without_transaction_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        let err = sink.insert(&Record::new("Ada", "001")).unwrap_err();
        assert!(matches!(err, ImportError::StorageWrite(_)));
    }

    #[test]
    fn test_begin_requires_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);
        assert!(sink.begin().is_err());
    }

    #[test]
    fn test_duplicate_identifier_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        sink.begin().unwrap();
        sink.insert(&Record::new("Ada", "001")).unwrap();
        let err = sink.insert(&Record::new("Ben", "001")).unwrap_err();
        assert!(err.to_string().contains("001"));

        sink.rollback().unwrap();
        assert!(!sink.in_transaction());
    }

    #[test]
    fn test_rollback_without_transaction_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);
        sink.rollback().unwrap();

        sink.open().unwrap();
        sink.rollback().unwrap();
    }

    #[test]
    fn test_helpers_on_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-created.db");

        assert_eq!(count_records(&path).unwrap(), 0);
        assert!(list_records(&path, 5).unwrap().is_empty());
        assert_eq!(purge_records(&path).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_purge_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        sink.begin().unwrap();
        sink.insert(&Record::new("Ada", "001")).unwrap();
        sink.commit().unwrap();
        sink.close().unwrap();

        assert_eq!(purge_records(sink.path()).unwrap(), 1);
        assert_eq!(count_records(sink.path()).unwrap(), 0);
    }
}

//! Transactional storage for imported records
//!
//! The coordinator drives a sink through `open -> begin -> insert* ->
//! commit | rollback -> close`. Anything staged after `begin` stays invisible
//! until `commit`, so an interrupted or failed import leaves storage as it was.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteSink;

use crate::error::Result;
use crate::record::Record;

/// Scoped write transaction over persistent storage
///
/// Implementations are moved into the import worker and used from that one
/// thread only.
pub trait TransactionalSink: Send {
    /// Acquire the underlying storage connection
    fn open(&mut self) -> Result<()>;

    /// Start a write transaction
    fn begin(&mut self) -> Result<()>;

    /// Stage one record; only valid between `begin` and `commit`/`rollback`
    fn insert(&mut self, record: &Record) -> Result<()>;

    /// Make every staged record durable and visible at once
    fn commit(&mut self) -> Result<()>;

    /// Discard everything staged since `begin`; a no-op without a transaction
    fn rollback(&mut self) -> Result<()>;

    /// Release storage resources; safe to call more than once
    fn close(&mut self) -> Result<()>;
}

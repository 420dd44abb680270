//! Error types for the import pipeline
//!
//! None of these escape an import session: the coordinator logs them and
//! turns them into a [`crate::ImportOutcome`]. They surface directly only from
//! the building blocks (parser, loader, sink, flag store) and the CLI.

use preload_common::PreloadError;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Error, Debug)]
pub enum ImportError {
    /// A line did not split into exactly two tab-separated fields
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// The input could not be opened or read
    #[error("Input source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Any storage failure during open, begin, insert, commit or rollback
    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    /// The first-run flag could not be read or written
    #[error("First-run flag error: {0}")]
    Flag(String),

    #[error(transparent)]
    Common(#[from] PreloadError),
}

impl ImportError {
    /// Create a malformed record error for a 1-based line number
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    /// Create a source unavailable error
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageWrite(msg.into())
    }

    /// Create a flag store error
    pub fn flag(msg: impl Into<String>) -> Self {
        Self::Flag(msg.into())
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StorageWrite(err.to_string())
    }
}

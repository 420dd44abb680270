//! Record parsing
//!
//! One input line holds a display name and a unique identifier separated by a
//! single tab. There is no header row and no quoting.

use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};

/// Field separator of the input format
pub const FIELD_DELIMITER: char = '\t';

const FIELD_COUNT: usize = 2;

/// One imported row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Human-readable name
    pub name: String,
    /// Unique identifier (stored in a UNIQUE column)
    pub identifier: String,
}

impl Record {
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
        }
    }
}

/// Parse a single line into a [`Record`]
///
/// `line_number` is 1-based and only used for error reporting. A trailing
/// carriage return is ignored so CRLF files parse the same as LF files.
/// Both fields must be non-empty; a truncated line is malformed.
pub fn parse_line(line: &str, line_number: usize) -> Result<Record> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();

    match fields.as_slice() {
        [name, _] if name.is_empty() => Err(ImportError::malformed(line_number, "empty name")),
        [_, identifier] if identifier.is_empty() => {
            Err(ImportError::malformed(line_number, "empty identifier"))
        }
        [name, identifier] => Ok(Record::new(*name, *identifier)),
        [_] => Err(ImportError::malformed(line_number, "missing field delimiter")),
        _ => Err(ImportError::malformed(
            line_number,
            format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
        )),
    }
}

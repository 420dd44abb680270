//! Dataset loading
//!
//! The whole input is materialized before any storage work starts, so a
//! malformed line or an unreadable file aborts the import without touching
//! the database.

use crate::error::{ImportError, Result};
use crate::record::{parse_line, Record};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::PathBuf;
use tracing::debug;

/// Fully parsed input, in file order
pub type Dataset = Vec<Record>;

/// Where the tab-separated input comes from
pub trait DatasetSource: Send {
    /// Open a fresh reader positioned at the start of the input
    fn open(&self) -> std::io::Result<Box<dyn BufRead + Send>>;

    /// Name used in logs and errors
    fn describe(&self) -> String;
}

/// Input read from a file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileSource {
    fn open(&self) -> std::io::Result<Box<dyn BufRead + Send>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Input bundled in memory, e.g. via `include_str!`
#[derive(Debug, Clone)]
pub struct TextSource {
    label: String,
    text: String,
}

impl TextSource {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

impl DatasetSource for TextSource {
    fn open(&self) -> std::io::Result<Box<dyn BufRead + Send>> {
        Ok(Box::new(Cursor::new(self.text.clone().into_bytes())))
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Open `source` and parse every line into a [`Dataset`]
pub fn load(source: &dyn DatasetSource) -> Result<Dataset> {
    let name = source.describe();
    let reader = source
        .open()
        .map_err(|e| ImportError::source_unavailable(&name, e))?;

    read_dataset(reader, &name)
}

/// Parse every line of `reader`
///
/// The final line does not need a terminator. Every line, blank ones
/// included, must parse or the whole load fails.
pub fn read_dataset<R: BufRead>(reader: R, source_name: &str) -> Result<Dataset> {
    let mut dataset = Dataset::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ImportError::source_unavailable(source_name, e))?;
        let line_number = index + 1;

        dataset.push(parse_line(&line, line_number)?);
    }

    debug!(source = %source_name, records = dataset.len(), "Dataset loaded");
    Ok(dataset)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_all_lines_in_order() {
        let source = TextSource::new("inline", "Ada\t001\nBen\t002\n");
        let dataset = load(&source).unwrap();

        assert_eq!(
            dataset,
            vec![Record::new("Ada", "001"), Record::new("Ben", "002")]
        );
    }

    #[test]
    fn test_last_line_without_terminator() {
        let dataset = read_dataset("Ada\t001\nBen\t002".as_bytes(), "inline").unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset[1].identifier, "002");
    }

    #[test]
    fn test_empty_source_is_empty_dataset() {
        let dataset = read_dataset("".as_bytes(), "inline").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_blank_line_aborts_with_line_number() {
        let err = read_dataset("Ada\t001\n\nBen\t002\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, ImportError::MalformedRecord { line: 2, .. }));

        let err = read_dataset("Ada\t001\r\n\r\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, ImportError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_trailing_terminator_adds_no_line() {
        let dataset = read_dataset("Ada\t001\r\nBen\t002\r\n".as_bytes(), "inline").unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_malformed_line_aborts_with_line_number() {
        let err = read_dataset("Ada\t001\nBen 002\nCy\t003\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, ImportError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent.tsv"));

        let err = load(&source).unwrap_err();
        assert!(matches!(err, ImportError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_file_source_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.tsv");
        let mut file = File::create(&path).unwrap();
        write!(file, "Ada\t001\r\nBen\t002").unwrap();

        let dataset = load(&FileSource::new(&path)).unwrap();
        assert_eq!(dataset, vec![Record::new("Ada", "001"), Record::new("Ben", "002")]);
    }

    #[test]
    fn test_invalid_utf8_is_source_unavailable() {
        let bytes: &[u8] = &[b'A', b'\t', 0xff, 0xfe, b'\n'];
        let err = read_dataset(bytes, "inline").unwrap_err();
        assert!(matches!(err, ImportError::SourceUnavailable { .. }));
    }
}

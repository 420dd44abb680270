//! First-run flag persistence
//!
//! The flag is `true` until an import commits. Failed and cancelled runs keep
//! it `true` so the next session imports again from scratch.

use crate::error::{ImportError, Result};
use crate::ImportOutcome;
use chrono::{DateTime, Utc};
use preload_common::PreloadError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Read/write access to the persisted first-run flag
pub trait FlagStore: Send + Sync {
    /// Whether the import still has to run
    fn first_run(&self) -> Result<bool>;

    /// Record whether the import still has to run
    fn set_first_run(&self, first_run: bool) -> Result<()>;

    /// Persist the end of a session in a single write
    ///
    /// Stores that keep no history only persist the flag.
    fn record_session(&self, first_run: bool, _outcome: ImportOutcome) -> Result<()> {
        self.set_first_run(first_run)
    }
}

/// Contents of the JSON state file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub first_run: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<ImportOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            first_run: true,
            last_outcome: None,
            updated_at: None,
        }
    }
}

/// Flag store backed by a small JSON file
///
/// A missing file means nothing was imported yet. Writes go to a sibling
/// temporary file first and are renamed into place.
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full state, defaulting when the file does not exist
    pub fn load(&self) -> Result<PersistedState> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let state = serde_json::from_str(&contents).map_err(PreloadError::from)?;
                Ok(state)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersistedState::default()),
            Err(e) => Err(ImportError::flag(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut PersistedState)) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| ImportError::flag(format!("State file lock poisoned: {}", e)))?;

        let mut state = self.load()?;
        apply(&mut state);
        state.updated_at = Some(Utc::now());

        self.save(&state)
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(PreloadError::from)?;
        }

        let json = serde_json::to_string_pretty(state).map_err(PreloadError::from)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(PreloadError::from)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            ImportError::flag(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

impl FlagStore for StateFile {
    fn first_run(&self) -> Result<bool> {
        Ok(self.load()?.first_run)
    }

    fn set_first_run(&self, first_run: bool) -> Result<()> {
        self.update(|state| state.first_run = first_run)
    }

    fn record_session(&self, first_run: bool, outcome: ImportOutcome) -> Result<()> {
        self.update(|state| {
            state.first_run = first_run;
            state.last_outcome = Some(outcome);
        })
    }
}

/// Process-local flag store
#[derive(Debug)]
pub struct MemoryFlagStore {
    first_run: AtomicBool,
}

impl MemoryFlagStore {
    pub fn new(first_run: bool) -> Self {
        Self {
            first_run: AtomicBool::new(first_run),
        }
    }
}

impl Default for MemoryFlagStore {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FlagStore for MemoryFlagStore {
    fn first_run(&self) -> Result<bool> {
        Ok(self.first_run.load(Ordering::SeqCst))
    }

    fn set_first_run(&self, first_run: bool) -> Result<()> {
        self.first_run.store(first_run, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_state_file_means_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateFile::new(dir.path().join("state.json"));

        assert!(store.first_run().unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_state_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateFile::new(dir.path().join("nested").join("state.json"));

        store.record_session(false, ImportOutcome::Succeeded).unwrap();

        let reopened = StateFile::new(store.path());
        let state = reopened.load().unwrap();
        assert!(!state.first_run);
        assert_eq!(state.last_outcome, Some(ImportOutcome::Succeeded));
        assert!(state.updated_at.is_some());
    }

    #[test]
    fn test_corrupt_state_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = StateFile::new(&path).first_run().unwrap_err();
        assert!(matches!(err, ImportError::Common(PreloadError::Serialization(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryFlagStore::default();
        assert!(store.first_run().unwrap());

        store.set_first_run(false).unwrap();
        assert!(!store.first_run().unwrap());

        store.record_session(true, ImportOutcome::Failed).unwrap();
        assert!(store.first_run().unwrap());
    }
}

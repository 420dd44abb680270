//! Import configuration
//!
//! Resolution order, lowest precedence first: built-in defaults, an optional
//! TOML file, `PRELOAD_*` environment variables, then CLI flags.

use crate::coordinator::{ImportCoordinator, DEFAULT_IDLE_WAIT};
use crate::flags::StateFile;
use crate::loader::FileSource;
use crate::observer::ImportObserver;
use crate::sink::SqliteSink;
use preload_common::{PreloadError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

/// Default tab-separated input file
pub const DEFAULT_INPUT_PATH: &str = "./data/records.tsv";

/// Default SQLite database file
pub const DEFAULT_DATABASE_PATH: &str = "./preload.db";

/// Default JSON file holding the first-run flag
pub const DEFAULT_STATE_PATH: &str = "./preload-state.json";

/// Import configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Tab-separated input (name, identifier)
    pub input_path: PathBuf,

    /// SQLite database receiving the records
    pub database_path: PathBuf,

    /// JSON file persisting the first-run flag
    pub state_path: PathBuf,

    /// Pause before each checkpoint when nothing needs importing
    pub idle_wait_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            idle_wait_ms: DEFAULT_IDLE_WAIT.as_millis() as u64,
        }
    }
}

impl ImportConfig {
    /// Load a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PreloadError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Defaults overridden by the environment
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Apply `PRELOAD_*` environment overrides
    ///
    /// - `PRELOAD_INPUT`: input file
    /// - `PRELOAD_DATABASE`: SQLite database file
    /// - `PRELOAD_STATE_FILE`: first-run state file
    /// - `PRELOAD_IDLE_WAIT_MS`: milliseconds, non-negative integer
    pub fn merge_env(self) -> Result<Self> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(input) = var("PRELOAD_INPUT") {
            self.input_path = PathBuf::from(input);
        }

        if let Some(database) = var("PRELOAD_DATABASE") {
            self.database_path = PathBuf::from(database);
        }

        if let Some(state) = var("PRELOAD_STATE_FILE") {
            self.state_path = PathBuf::from(state);
        }

        if let Some(wait) = var("PRELOAD_IDLE_WAIT_MS") {
            self.idle_wait_ms = wait.trim().parse().map_err(|_| {
                PreloadError::config(format!(
                    "PRELOAD_IDLE_WAIT_MS must be a non-negative integer, got '{}'",
                    wait
                ))
            })?;
        }

        Ok(self)
    }

    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder::default()
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    /// Wire a coordinator from the configured file, database and state file
    pub fn coordinator(&self, observer: Arc<dyn ImportObserver>) -> ImportCoordinator {
        ImportCoordinator::new(
            Box::new(FileSource::new(&self.input_path)),
            Box::new(SqliteSink::new(&self.database_path)),
            Arc::new(StateFile::new(&self.state_path)),
            observer,
        )
        .with_idle_wait(self.idle_wait())
    }
}

/// Builder for ImportConfig
#[derive(Default)]
pub struct ImportConfigBuilder {
    config: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_path = path.into();
        self
    }

    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    pub fn state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.state_path = path.into();
        self
    }

    pub fn idle_wait(mut self, wait: Duration) -> Self {
        self.config.idle_wait_ms = wait.as_millis() as u64;
        self
    }

    pub fn build(self) -> ImportConfig {
        self.config
    }
}

//! Import coordinator
//!
//! Runs one import session from start to a terminal outcome:
//!
//! 1. Notify "started" and read the first-run flag
//! 2. Already imported: replay the 50/100 checkpoints and succeed
//! 3. Otherwise load the whole dataset, open a transaction and insert record
//!    by record, reporting progress and checking for cancellation before
//!    each insert
//! 4. Commit on success, roll back on anything else, close the sink, persist
//!    the flag and emit exactly one terminal notification
//!
//! Errors never leave [`ImportCoordinator::run`]; they are logged and turned
//! into [`ImportOutcome::Failed`].

use crate::error::Result;
use crate::flags::FlagStore;
use crate::loader::{self, DatasetSource};
use crate::observer::ImportObserver;
use crate::record::Record;
use crate::sink::TransactionalSink;
use crate::types::{FailureKind, ImportOutcome, ImportState};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Progress reported once the dataset is in memory
pub const START_CHECKPOINT: u8 = 30;

/// Progress reported right before the commit
pub const PRE_COMMIT_CHECKPOINT: u8 = 80;

/// Progress reported after a successful commit
pub const COMPLETE_CHECKPOINT: u8 = 100;

/// Checkpoints replayed when there is nothing to import
pub const ALREADY_IMPORTED_CHECKPOINTS: [u8; 2] = [50, 100];

/// Default pause before each already-imported checkpoint
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(2000);

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Current state of a coordinator, readable from other threads
#[derive(Debug, Clone)]
pub struct StateCell(Arc<RwLock<ImportState>>);

impl StateCell {
    fn new() -> Self {
        Self(Arc::new(RwLock::new(ImportState::Idle)))
    }

    pub fn get(&self) -> ImportState {
        *self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn set(&self, state: ImportState) {
        *self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }
}

enum InsertEnd {
    Completed { inserted: usize },
    Cancelled { inserted: usize },
}

/// Owns every dependency of one import session
pub struct ImportCoordinator {
    id: Uuid,
    source: Box<dyn DatasetSource>,
    sink: Box<dyn TransactionalSink>,
    flags: Arc<dyn FlagStore>,
    observer: Arc<dyn ImportObserver>,
    idle_wait: Duration,
    state: StateCell,
    last_progress: u8,
}

impl ImportCoordinator {
    pub fn new(
        source: Box<dyn DatasetSource>,
        sink: Box<dyn TransactionalSink>,
        flags: Arc<dyn FlagStore>,
        observer: Arc<dyn ImportObserver>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            sink,
            flags,
            observer,
            idle_wait: DEFAULT_IDLE_WAIT,
            state: StateCell::new(),
            last_progress: 0,
        }
    }

    /// Pause used before each already-imported checkpoint
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Handle for observing the state while the session runs elsewhere
    pub fn state_cell(&self) -> StateCell {
        self.state.clone()
    }

    pub fn observer(&self) -> Arc<dyn ImportObserver> {
        self.observer.clone()
    }

    /// Run the session to completion on the current thread
    ///
    /// Blocking: reads the input, writes storage and may sleep. Run it on a
    /// blocking worker, not on an async executor thread.
    pub fn run(mut self, cancel: &CancellationToken) -> ImportOutcome {
        let span = info_span!("import_session", session_id = %self.id);
        let _enter = span.enter();

        self.transition(ImportState::Preparing);
        self.observer.on_started();

        let outcome = self.execute(cancel);

        self.transition(outcome.state());
        match outcome {
            ImportOutcome::Succeeded => self.observer.on_succeeded(),
            ImportOutcome::Failed => self.observer.on_terminal_failure(FailureKind::Failed),
            ImportOutcome::Cancelled => self.observer.on_terminal_failure(FailureKind::Cancelled),
        }

        info!(outcome = %outcome, "Import session finished");
        outcome
    }

    fn execute(&mut self, cancel: &CancellationToken) -> ImportOutcome {
        if cancel.is_cancelled() {
            info!("Cancelled before the import started");
            return ImportOutcome::Cancelled;
        }

        let first_run = match self.flags.first_run() {
            Ok(first_run) => first_run,
            Err(e) => {
                error!(error = %e, "Failed to read first-run flag");
                return ImportOutcome::Failed;
            }
        };

        if first_run {
            self.import(cancel)
        } else {
            self.replay_already_imported(cancel)
        }
    }

    fn replay_already_imported(&mut self, cancel: &CancellationToken) -> ImportOutcome {
        info!("Records already imported, nothing to do");

        for checkpoint in ALREADY_IMPORTED_CHECKPOINTS {
            if wait_or_cancelled(self.idle_wait, cancel) {
                info!("Cancelled while replaying checkpoints");
                return ImportOutcome::Cancelled;
            }
            self.progress(checkpoint);
        }

        ImportOutcome::Succeeded
    }

    fn import(&mut self, cancel: &CancellationToken) -> ImportOutcome {
        self.transition(ImportState::Loading);

        let result = match loader::load(self.source.as_ref()) {
            Ok(dataset) => {
                info!(
                    source = %self.source.describe(),
                    records = dataset.len(),
                    "Dataset loaded"
                );
                self.progress(START_CHECKPOINT);
                self.insert_all(&dataset, cancel)
            }
            Err(e) => Err(e),
        };

        self.finalize(result)
    }

    fn insert_all(&mut self, dataset: &[Record], cancel: &CancellationToken) -> Result<InsertEnd> {
        self.sink.open()?;
        self.sink.begin()?;
        self.transition(ImportState::Inserting);

        // N + 1 steps keep every per-record value below the pre-commit checkpoint
        let range = f64::from(PRE_COMMIT_CHECKPOINT - START_CHECKPOINT);
        let step = range / (dataset.len() + 1) as f64;

        for (index, record) in dataset.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(InsertEnd::Cancelled { inserted: index });
            }

            self.sink.insert(record)?;

            let progress = f64::from(START_CHECKPOINT) + step * (index + 1) as f64;
            self.progress(progress as u8);
        }

        Ok(InsertEnd::Completed {
            inserted: dataset.len(),
        })
    }

    fn finalize(&mut self, result: Result<InsertEnd>) -> ImportOutcome {
        self.transition(ImportState::Finalizing);

        let outcome = match result {
            Ok(InsertEnd::Completed { inserted }) => {
                self.progress(PRE_COMMIT_CHECKPOINT);
                match self.sink.commit() {
                    Ok(()) => {
                        info!(inserted, "Transaction committed");
                        ImportOutcome::Succeeded
                    }
                    Err(e) => {
                        error!(error = %e, "Commit failed, rolling back");
                        ImportOutcome::Failed
                    }
                }
            }
            Ok(InsertEnd::Cancelled { inserted }) => {
                info!(inserted, "Import cancelled, rolling back");
                ImportOutcome::Cancelled
            }
            Err(e) => {
                error!(error = %e, "Import failed, rolling back");
                ImportOutcome::Failed
            }
        };

        if outcome != ImportOutcome::Succeeded {
            if let Err(e) = self.sink.rollback() {
                error!(error = %e, "Rollback failed");
            }
        }

        if let Err(e) = self.sink.close() {
            warn!(error = %e, "Failed to close storage");
        }

        let first_run = outcome != ImportOutcome::Succeeded;
        if let Err(e) = self.flags.record_session(first_run, outcome) {
            error!(error = %e, first_run, "Failed to persist first-run flag");
        }

        if outcome == ImportOutcome::Succeeded {
            self.progress(COMPLETE_CHECKPOINT);
        }

        outcome
    }

    fn transition(&mut self, next: ImportState) {
        let current = self.state.get();
        debug!(from = %current, to = %next, "Import state transition");
        self.state.set(next);
    }

    /// Report progress, never going backwards within the session
    fn progress(&mut self, percentage: u8) {
        let percentage = percentage.min(COMPLETE_CHECKPOINT).max(self.last_progress);
        self.last_progress = percentage;
        self.observer.on_progress(percentage);
    }
}

/// Sleep for `duration` unless `cancel` fires first; returns whether it did
fn wait_or_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    let deadline = Instant::now() + duration;

    loop {
        if cancel.is_cancelled() {
            return true;
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }

        std::thread::sleep((deadline - now).min(CANCEL_POLL_INTERVAL));
    }
}

//! Session control surface for the host
//!
//! An [`ImportSession`] wraps one coordinator and the cancellation token
//! shared with its worker. The host starts it once, may cancel it at any time
//! (also before it started), and must keep it alive until the worker is done;
//! dropping the session cancels the worker.

use crate::coordinator::{ImportCoordinator, StateCell};
use crate::observer::ImportObserver;
use crate::types::{FailureKind, ImportOutcome, ImportState};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

pub struct ImportSession {
    id: Uuid,
    cancel: CancellationToken,
    state: StateCell,
    observer: Arc<dyn ImportObserver>,
    started: AtomicBool,
    coordinator: Mutex<Option<ImportCoordinator>>,
    worker: Mutex<Option<JoinHandle<ImportOutcome>>>,
}

impl ImportSession {
    pub fn new(coordinator: ImportCoordinator) -> Self {
        Self {
            id: coordinator.id(),
            cancel: CancellationToken::new(),
            state: coordinator.state_cell(),
            observer: coordinator.observer(),
            started: AtomicBool::new(false),
            coordinator: Mutex::new(Some(coordinator)),
            worker: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Launch the worker on tokio's blocking pool
    ///
    /// Only the first call launches anything; later calls return `false`.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!(session_id = %self.id, "Cannot start import session outside a tokio runtime");
            return false;
        };

        if self.started.swap(true, Ordering::SeqCst) {
            debug!(session_id = %self.id, "Import session already started");
            return false;
        }

        let Some(coordinator) = lock(&self.coordinator).take() else {
            return false;
        };

        let cancel = self.cancel.clone();
        let state = self.state.clone();
        let observer = self.observer.clone();
        let id = self.id;
        let handle = runtime.spawn_blocking(move || {
            match panic::catch_unwind(AssertUnwindSafe(|| coordinator.run(&cancel))) {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!(session_id = %id, "Import worker panicked");
                    finish_unfinished(&state, observer.as_ref())
                }
            }
        });
        *lock(&self.worker) = Some(handle);

        info!(session_id = %self.id, "Import session started");
        true
    }

    /// Ask the worker to stop before its next record
    ///
    /// Safe to call repeatedly and before [`ImportSession::start`].
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            info!(session_id = %self.id, "Import cancellation requested");
        }
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the session was started and has not reached a terminal state
    pub fn is_active(&self) -> bool {
        self.started.load(Ordering::SeqCst) && !self.state.get().is_terminal()
    }

    pub fn state(&self) -> ImportState {
        self.state.get()
    }

    /// Wait for the worker and return its outcome
    ///
    /// Returns `None` if the session never started or was already joined.
    /// A worker that died before deciding an outcome is reported as `Failed`.
    pub async fn join(&self) -> Option<ImportOutcome> {
        let handle = lock(&self.worker).take()?;

        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(session_id = %self.id, error = %e, "Import worker did not finish cleanly");
                Some(finish_unfinished(&self.state, self.observer.as_ref()))
            }
        }
    }
}

impl Drop for ImportSession {
    fn drop(&mut self) {
        if self.is_active() {
            debug!(session_id = %self.id, "Session dropped while active, cancelling worker");
        }
        self.cancel.cancel();
    }
}

/// Outcome of a worker that died; sends the terminal notification it never did
fn finish_unfinished(state: &StateCell, observer: &dyn ImportObserver) -> ImportOutcome {
    if let Some(outcome) = state.get().outcome() {
        return outcome;
    }

    state.set(ImportState::Failed);
    observer.on_terminal_failure(FailureKind::Failed);
    ImportOutcome::Failed
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

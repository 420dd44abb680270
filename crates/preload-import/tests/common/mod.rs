//! Shared test doubles for import pipeline integration tests
//!
//! - [`RecordingSink`] logs every storage call and can fail or trigger
//!   cancellation at a chosen insert
//! - [`RecordingObserver`] keeps every notification in order
//! - [`run_import`] wires both into a coordinator and runs it to the end

#![allow(dead_code)]

use preload_import::{
    FailureKind, FlagStore, ImportCoordinator, ImportError, ImportEvent, ImportObserver,
    ImportOutcome, MemoryFlagStore, Record, TextSource, TransactionalSink,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One storage call as seen by the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    Open,
    Begin,
    Insert(Record),
    Commit,
    Rollback,
    Close,
}

/// Storage double that records calls instead of writing anything
///
/// `committed()` returns what a real store would hold after the session.
#[derive(Default)]
pub struct RecordingSink {
    ops: Arc<Mutex<Vec<SinkOp>>>,
    committed: Arc<Mutex<Vec<Record>>>,
    staged: Vec<Record>,
    in_transaction: bool,
    opened: bool,
    fail_on_insert: Option<usize>,
    fail_commit: bool,
    cancel_after: Option<(usize, CancellationToken)>,
}

/// Read side of a [`RecordingSink`] kept by the test after the sink moved
#[derive(Clone)]
pub struct SinkLog {
    ops: Arc<Mutex<Vec<SinkOp>>>,
    committed: Arc<Mutex<Vec<Record>>>,
}

impl SinkLog {
    pub fn ops(&self) -> Vec<SinkOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn count(&self, op: fn(&SinkOp) -> bool) -> usize {
        self.ops().iter().filter(|o| op(o)).count()
    }

    pub fn inserts(&self) -> usize {
        self.count(|o| matches!(o, SinkOp::Insert(_)))
    }

    pub fn commits(&self) -> usize {
        self.count(|o| matches!(o, SinkOp::Commit))
    }

    pub fn rollbacks(&self) -> usize {
        self.count(|o| matches!(o, SinkOp::Rollback))
    }

    pub fn committed(&self) -> Vec<Record> {
        self.committed.lock().unwrap().clone()
    }
}

impl RecordingSink {
    pub fn new() -> (Self, SinkLog) {
        let sink = Self::default();
        let log = SinkLog {
            ops: sink.ops.clone(),
            committed: sink.committed.clone(),
        };
        (sink, log)
    }

    /// Fail the insert with this 0-based index
    pub fn fail_on_insert(mut self, index: usize) -> Self {
        self.fail_on_insert = Some(index);
        self
    }

    pub fn fail_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Cancel `token` right after `inserted` records were staged
    pub fn cancel_after(mut self, inserted: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((inserted, token));
        self
    }

    fn log(&self, op: SinkOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl TransactionalSink for RecordingSink {
    fn open(&mut self) -> preload_import::Result<()> {
        self.opened = true;
        self.log(SinkOp::Open);
        Ok(())
    }

    fn begin(&mut self) -> preload_import::Result<()> {
        self.in_transaction = true;
        self.log(SinkOp::Begin);
        Ok(())
    }

    fn insert(&mut self, record: &Record) -> preload_import::Result<()> {
        if self.fail_on_insert == Some(self.staged.len()) {
            return Err(ImportError::storage("injected insert failure"));
        }
        if self.staged.iter().any(|r| r.identifier == record.identifier) {
            return Err(ImportError::storage(format!(
                "UNIQUE constraint failed: records.identifier ({})",
                record.identifier
            )));
        }

        self.staged.push(record.clone());
        self.log(SinkOp::Insert(record.clone()));

        if let Some((after, token)) = &self.cancel_after {
            if self.staged.len() == *after {
                token.cancel();
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> preload_import::Result<()> {
        if self.fail_commit {
            return Err(ImportError::storage("injected commit failure"));
        }
        self.committed.lock().unwrap().append(&mut self.staged);
        self.in_transaction = false;
        self.log(SinkOp::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> preload_import::Result<()> {
        if self.in_transaction {
            self.staged.clear();
            self.in_transaction = false;
            self.log(SinkOp::Rollback);
        }
        Ok(())
    }

    fn close(&mut self) -> preload_import::Result<()> {
        if self.opened {
            self.opened = false;
            self.log(SinkOp::Close);
        }
        Ok(())
    }
}

/// Observer that keeps every notification
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ImportEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ImportEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ImportEvent::Progress { percentage } => Some(percentage),
                _ => None,
            })
            .collect()
    }
}

impl ImportObserver for RecordingObserver {
    fn on_started(&self) {
        self.events.lock().unwrap().push(ImportEvent::Started);
    }

    fn on_progress(&self, percentage: u8) {
        self.events
            .lock()
            .unwrap()
            .push(ImportEvent::Progress { percentage });
    }

    fn on_succeeded(&self) {
        self.events.lock().unwrap().push(ImportEvent::Succeeded);
    }

    fn on_terminal_failure(&self, kind: FailureKind) {
        self.events
            .lock()
            .unwrap()
            .push(ImportEvent::TerminalFailure { kind });
    }
}

/// Build a coordinator over inline text with no idle wait
pub fn coordinator(
    text: &str,
    sink: RecordingSink,
    flags: Arc<MemoryFlagStore>,
    observer: Arc<RecordingObserver>,
) -> ImportCoordinator {
    ImportCoordinator::new(
        Box::new(TextSource::new("inline", text)),
        Box::new(sink),
        flags,
        observer,
    )
    .with_idle_wait(Duration::ZERO)
}

/// Run one session to its outcome on the current thread
pub fn run_import(
    text: &str,
    sink: RecordingSink,
    flags: Arc<MemoryFlagStore>,
    cancel: &CancellationToken,
) -> (ImportOutcome, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let outcome = coordinator(text, sink, flags, observer.clone()).run(cancel);
    (outcome, observer)
}

/// Tab-separated dataset of `n` distinct records
pub fn dataset(n: usize) -> String {
    (1..=n)
        .map(|i| format!("Person {}\t{:03}\n", i, i))
        .collect()
}

pub fn first_run(flags: &MemoryFlagStore) -> bool {
    flags.first_run().unwrap()
}

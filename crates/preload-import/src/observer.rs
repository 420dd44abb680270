//! Progress notifications
//!
//! The coordinator reports four kinds of events. Observers are called on the
//! import worker thread, so they must be `Send + Sync` and return quickly.
//! Failing to deliver an event never affects the import itself.

use crate::types::FailureKind;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// Receiver of session lifecycle notifications
///
/// Per session: one `on_started`, then non-decreasing `on_progress` values,
/// then exactly one of `on_succeeded` / `on_terminal_failure` as the last call.
pub trait ImportObserver: Send + Sync {
    fn on_started(&self);

    /// Coarse progress, 0 to 100
    fn on_progress(&self, percentage: u8);

    fn on_succeeded(&self);

    fn on_terminal_failure(&self, kind: FailureKind);
}

/// A single notification as a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ImportEvent {
    Started,
    Progress { percentage: u8 },
    Succeeded,
    TerminalFailure { kind: FailureKind },
}

impl ImportEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportEvent::Succeeded | ImportEvent::TerminalFailure { .. })
    }
}

/// Forwards notifications over an unbounded tokio channel
///
/// Sending never blocks the worker. If the receiving side is gone the event
/// is dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ImportEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiver the host reads events from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ImportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn deliver(&self, event: ImportEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!(event = ?e.0, "Import event dropped, receiver closed");
        }
    }
}

impl ImportObserver for ChannelObserver {
    fn on_started(&self) {
        self.deliver(ImportEvent::Started);
    }

    fn on_progress(&self, percentage: u8) {
        self.deliver(ImportEvent::Progress { percentage });
    }

    fn on_succeeded(&self) {
        self.deliver(ImportEvent::Succeeded);
    }

    fn on_terminal_failure(&self, kind: FailureKind) {
        self.deliver(ImportEvent::TerminalFailure { kind });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_preserves_order() {
        let (observer, mut rx) = ChannelObserver::channel();

        observer.on_started();
        observer.on_progress(30);
        observer.on_progress(55);
        observer.on_terminal_failure(FailureKind::Cancelled);
        drop(observer);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                ImportEvent::Started,
                ImportEvent::Progress { percentage: 30 },
                ImportEvent::Progress { percentage: 55 },
                ImportEvent::TerminalFailure {
                    kind: FailureKind::Cancelled
                },
            ]
        );
        assert!(events.last().unwrap().is_terminal());
    }

    #[test]
    fn test_closed_receiver_is_swallowed() {
        let (observer, rx) = ChannelObserver::channel();
        drop(rx);

        observer.on_started();
        observer.on_succeeded();
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&ImportEvent::Progress { percentage: 55 }).unwrap();
        assert_eq!(json, r#"{"event":"progress","percentage":55}"#);

        let json = serde_json::to_string(&ImportEvent::TerminalFailure {
            kind: FailureKind::Failed,
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"terminal_failure","kind":"failed"}"#);
    }
}

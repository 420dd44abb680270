//! Core types shared by the coordinator, the session and observers

use serde::{Deserialize, Serialize};

/// Lifecycle of one import session
///
/// `Idle -> Preparing -> Loading -> Inserting -> Finalizing -> terminal`.
/// The already-imported path goes straight from `Preparing` to `Succeeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    Idle,
    Preparing,
    Loading,
    Inserting,
    Finalizing,
    Succeeded,
    Failed,
    Cancelled,
}

impl ImportState {
    pub fn as_str(&self) -> &str {
        match self {
            ImportState::Idle => "idle",
            ImportState::Preparing => "preparing",
            ImportState::Loading => "loading",
            ImportState::Inserting => "inserting",
            ImportState::Finalizing => "finalizing",
            ImportState::Succeeded => "succeeded",
            ImportState::Failed => "failed",
            ImportState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportState::Succeeded | ImportState::Failed | ImportState::Cancelled
        )
    }

    /// Outcome of a terminal state
    pub fn outcome(&self) -> Option<ImportOutcome> {
        match self {
            ImportState::Succeeded => Some(ImportOutcome::Succeeded),
            ImportState::Failed => Some(ImportOutcome::Failed),
            ImportState::Cancelled => Some(ImportOutcome::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

impl ImportOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            ImportOutcome::Succeeded => "succeeded",
            ImportOutcome::Failed => "failed",
            ImportOutcome::Cancelled => "cancelled",
        }
    }

    /// The terminal state matching this outcome
    pub fn state(&self) -> ImportState {
        match self {
            ImportOutcome::Succeeded => ImportState::Succeeded,
            ImportOutcome::Failed => ImportState::Failed,
            ImportOutcome::Cancelled => ImportState::Cancelled,
        }
    }
}

impl std::fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason carried by a terminal failure notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Failed,
    Cancelled,
}

impl From<FailureKind> for ImportOutcome {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Failed => ImportOutcome::Failed,
            FailureKind::Cancelled => ImportOutcome::Cancelled,
        }
    }
}

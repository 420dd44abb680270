//! Terminal rendering of import events

use crate::observer::ImportEvent;
use crate::types::FailureKind;
use indicatif::{ProgressBar, ProgressStyle};

/// Percentage bar for an import session
pub fn create_import_progress() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("Waiting for import worker");
    pb
}

/// Apply one event to the bar
pub fn render_event(pb: &ProgressBar, event: &ImportEvent) {
    match event {
        ImportEvent::Started => pb.set_message("Importing records"),
        ImportEvent::Progress { percentage } => pb.set_position(u64::from(*percentage)),
        ImportEvent::Succeeded => pb.finish_with_message("Import complete"),
        ImportEvent::TerminalFailure {
            kind: FailureKind::Cancelled,
        } => pb.abandon_with_message("Import cancelled, nothing was written"),
        ImportEvent::TerminalFailure {
            kind: FailureKind::Failed,
        } => pb.abandon_with_message("Import failed, nothing was written"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_tracks_events() {
        let pb = create_import_progress();
        assert_eq!(pb.length(), Some(100));

        render_event(&pb, &ImportEvent::Started);
        render_event(&pb, &ImportEvent::Progress { percentage: 63 });
        assert_eq!(pb.position(), 63);

        render_event(&pb, &ImportEvent::Succeeded);
        assert!(pb.is_finished());
    }

    #[test]
    fn test_failure_abandons_bar() {
        let pb = create_import_progress();
        render_event(
            &pb,
            &ImportEvent::TerminalFailure {
                kind: FailureKind::Cancelled,
            },
        );
        assert!(pb.is_finished());
    }
}

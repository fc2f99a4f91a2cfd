//! Serializable status views for diagnostics.

use serde::{Deserialize, Serialize};

/// Outcome of one fan-out dispatch batch.
///
/// `unfinished > 0` means the per-batch deadline elapsed before every handler
/// reported back; those handlers kept running, they just stopped being
/// awaited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Variant name of the dispatched message.
    pub message_type: String,

    /// Handlers in the batch (snapshot size at dispatch time).
    pub handlers: usize,

    /// Handlers that completed successfully within the deadline.
    pub completed: usize,

    /// Handlers that finished with an error (or panicked).
    pub failed: usize,

    /// Handlers still in flight when the deadline elapsed.
    pub unfinished: usize,
}

impl BatchReport {
    pub fn timed_out(&self) -> bool {
        self.unfinished > 0
    }
}

/// Point-in-time view of an inbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboxStatus {
    /// Messages waiting in the queue.
    pub pending: usize,

    /// Variant names with at least one registered handler.
    pub registered_types: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::all_completed(3, 0, 0, false)]
    #[case::failures_still_finished(1, 2, 0, false)]
    #[case::one_left_running(2, 0, 1, true)]
    #[case::nobody_reported_back(0, 0, 3, true)]
    fn timed_out_tracks_unfinished_handlers(
        #[case] completed: usize,
        #[case] failed: usize,
        #[case] unfinished: usize,
        #[case] expected: bool,
    ) {
        let report = BatchReport {
            message_type: "demo".to_string(),
            handlers: completed + failed + unfinished,
            completed,
            failed,
            unfinished,
        };
        assert_eq!(report.timed_out(), expected);
    }
}

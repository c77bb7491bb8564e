//! Lifecycle events emitted while a run progresses.

use super::flush::FlushReason;

/// One observable step of a batch commit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Pulled,
    PullFailed {
        error: String,
    },
    UntrackedListed {
        count: usize,
    },
    FileSkipped {
        path: String,
        reason: String,
    },
    BatchesPlanned {
        batches: usize,
        files: usize,
        total_bytes: u64,
    },
    /// `index` is 1-based.
    BatchStarted {
        index: usize,
        total: usize,
        message: String,
        files: usize,
    },
    StageProgress {
        staged: usize,
        total: usize,
    },
    BatchCommitted {
        index: usize,
        commit_id: String,
        files: usize,
        bytes: u64,
        backlog_bytes: u64,
        max_push_bytes: u64,
    },
    BatchFailed {
        index: usize,
        error: String,
    },
    /// `attempt` numbers flushes across the whole run, failures included.
    PushStarted {
        attempt: u32,
        commits: u32,
        bytes: u64,
        reason: FlushReason,
    },
    PushSucceeded {
        attempt: u32,
    },
    PushFailed {
        attempt: u32,
        error: String,
    },
    Cooldown {
        millis: u64,
    },
}

/// Receives run events. Implementations must not block for long; the run
/// awaits nothing while emitting.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RunEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &RunEvent) {}
}

//! Push accounting: decides when committed work is flushed to the remote.

/// Why a flush was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// The unpushed backlog reached the configured push size.
    SizeLimit,
    /// The last batch of the run was processed.
    FinalBatch,
}

impl std::fmt::Display for FlushReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushReason::SizeLimit => write!(f, "size limit reached"),
            FlushReason::FinalBatch => write!(f, "final batch"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Accumulating,
    FlushPending(FlushReason),
}

/// Result of one flush attempt (retries included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    Failed,
}

/// Counters carried across batches of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushAccount {
    pub bytes_since_last_push: u64,
    pub commits_since_last_push: u32,
    pub push_count: u32,
    pub push_attempts: u32,
}

/// State machine over [`PushAccount`].
///
/// `Accumulating -> FlushPending -> Accumulating`. A failed push leaves the
/// backlog untouched so the next flush covers it.
#[derive(Debug)]
pub struct FlushController {
    max_push_bytes: u64,
    account: PushAccount,
    state: FlushState,
}

impl FlushController {
    pub fn new(max_push_bytes: u64) -> Self {
        Self {
            max_push_bytes,
            account: PushAccount::default(),
            state: FlushState::Accumulating,
        }
    }

    pub fn max_push_bytes(&self) -> u64 {
        self.max_push_bytes
    }

    pub fn account(&self) -> PushAccount {
        self.account
    }

    pub fn state(&self) -> FlushState {
        self.state
    }

    /// Account for one successful commit of `bytes`.
    pub fn record_commit(&mut self, bytes: u64) {
        self.account.bytes_since_last_push += bytes;
        self.account.commits_since_last_push += 1;
    }

    /// Check whether a flush is due after processing a batch.
    ///
    /// Nothing is pushed while the backlog holds no commits.
    pub fn poll(&mut self, is_last_batch: bool) -> Option<FlushReason> {
        if self.account.commits_since_last_push == 0 {
            return None;
        }

        let reason = if self.account.bytes_since_last_push >= self.max_push_bytes {
            FlushReason::SizeLimit
        } else if is_last_batch {
            FlushReason::FinalBatch
        } else {
            return None;
        };

        self.state = FlushState::FlushPending(reason);
        Some(reason)
    }

    /// Record the outcome of the pending flush and return to `Accumulating`.
    pub fn complete(&mut self, outcome: PushOutcome) {
        self.account.push_attempts += 1;
        if outcome == PushOutcome::Pushed {
            self.account.bytes_since_last_push = 0;
            self.account.commits_since_last_push = 0;
            self.account.push_count += 1;
        }
        self.state = FlushState::Accumulating;
    }
}

//! Batches of files destined for one commit each.

pub mod message;
pub mod partition;

pub use message::commit_message;
pub use partition::{effective_batch_size, partition};

use crate::analysis::FileRecord;

/// An ordered group of files committed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub category: String,
    pub files: Vec<FileRecord>,
    pub message: String,
}

impl Batch {
    /// Sum of the file sizes in this batch.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    /// Paths of the files, in batch order.
    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

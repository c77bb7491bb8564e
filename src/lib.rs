//! dac - commit untracked files in per-category batches.
//!
//! # Overview
//!
//! dac lists the untracked files of a git repository, sorts them into
//! configurable categories (source, media, docs, ...), commits each category
//! in fixed-size batches with a generated message, and pushes whenever the
//! unpushed backlog reaches a size budget or the run ends.

pub mod analysis;
pub mod batch;
pub mod classify;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod progress;
pub mod run;
pub mod vcs;

// Re-export commonly used types
pub use analysis::FileRecord;
pub use batch::Batch;
pub use config::{CategoryConfig, DacConfig};
pub use error::{AnalysisError, ConfigError, SetupError, VcsError};
pub use run::{BatchCommitRunner, ProcessingResult, RunOptions, RunReport};
pub use vcs::{GitClient, RemoteTarget, VcsClient};

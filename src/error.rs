//! Error types for dac modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading, validating, or editing `.dacrc.json`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("DAC not initialized: {} not found. Run 'dac init' first.", .0.display())]
    NotInitialized(PathBuf),

    #[error("Failed to read configuration: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(#[source] serde_json::Error),

    #[error("Failed to write configuration: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to serialize configuration: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    #[error("Invalid pattern '{pattern}' in category '{category}': {reason}")]
    InvalidPattern {
        category: String,
        pattern: String,
        reason: String,
    },

    #[error("Category '{0}' is declared more than once")]
    DuplicateCategory(String),

    #[error("Configuration key '{0}' not found")]
    KeyNotFound(String),

    #[error("Invalid assignment '{0}'. Use: --set key=value")]
    InvalidAssignment(String),
}

/// Errors from the version-control client.
///
/// Stage, commit, and push failures are per-batch or per-flush and never abort
/// a run; only listing failures surface as setup errors.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("git not found in PATH")]
    GitNotInstalled,

    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to read repository status: {0}")]
    Status(#[source] git2::Error),

    #[error("Failed to stage files: {0}")]
    Stage(String),

    #[error("Failed to create commit: {0}")]
    Commit(String),

    #[error("Failed to push to remote: {0}")]
    Push(String),

    #[error("Failed to pull from remote: {0}")]
    Pull(String),

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<VcsError>),
}

/// Errors from analyzing an untracked file before it is batched.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Could not analyze file {path}: {source}")]
    Stat {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal errors raised before any batch is processed.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Not a git repository: {}. Initialize with 'git init' first.", .0.display())]
    NotRepository(PathBuf),

    #[error("DAC not initialized: {} not found. Run 'dac init' first.", .0.display())]
    ConfigMissing(PathBuf),

    #[error(transparent)]
    Config(ConfigError),

    #[error("Failed to list untracked files: {0}")]
    ListUntracked(#[source] VcsError),

    #[error("Unknown file type '{0}'. Run 'dac config --list' to see configured types.")]
    UnknownCategory(String),
}

impl From<ConfigError> for SetupError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotInitialized(path) => SetupError::ConfigMissing(path),
            other => SetupError::Config(other),
        }
    }
}

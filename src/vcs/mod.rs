//! Version-control client abstraction.
//!
//! The batch engine only sequences these calls; [`GitClient`] talks to a real
//! repository and tests substitute a fake or a mock.

pub mod git;
pub mod retry;

use async_trait::async_trait;

use crate::error::VcsError;

pub use git::{GitClient, RepositoryInfo};
pub use retry::push_with_retry;

/// Remote and branch for push/pull. `None` means "origin" and the current
/// branch respectively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteTarget {
    pub remote: Option<String>,
    pub branch: Option<String>,
}

impl RemoteTarget {
    /// Target the given remote, on the current branch.
    pub fn remote(name: impl Into<String>) -> Self {
        Self {
            remote: Some(name.into()),
            branch: None,
        }
    }
}

/// Operations the batch engine needs from a version-control system.
///
/// Implementations are driven strictly sequentially; no two calls overlap.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Whether the working directory is inside a repository.
    async fn is_repository(&self) -> bool;

    /// Untracked, non-ignored paths relative to the repository root.
    async fn list_untracked_paths(&self) -> Result<Vec<String>, VcsError>;

    /// Add `paths` to the index. Fails if any path is missing or unreadable.
    async fn stage(&self, paths: &[String]) -> Result<(), VcsError>;

    /// Commit the index and return the new commit id.
    async fn commit(&self, message: &str) -> Result<String, VcsError>;

    /// Push local commits to the remote.
    async fn push(&self, target: &RemoteTarget) -> Result<(), VcsError>;

    /// Fast-forward from the remote.
    async fn pull(&self, target: &RemoteTarget) -> Result<(), VcsError>;
}

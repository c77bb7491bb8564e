//! [`VcsClient`] backed by a real Git repository.
//!
//! Read-only queries go through git2. Mutating operations shell out to the
//! system `git` binary so they inherit the user's git config, hooks, SSH agent,
//! and credential store.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use git2::{Repository, Status, StatusOptions};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::VcsError;

use super::{RemoteTarget, VcsClient};

/// Default timeout for one git subprocess (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "DAC_GIT_TIMEOUT";

const DEFAULT_REMOTE: &str = "origin";

/// Get the configured git subprocess timeout.
///
/// Reads DAC_GIT_TIMEOUT (seconds) if set, otherwise 300 seconds. Invalid
/// values log a warning and fall back to the default.
fn git_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// What `dac run` shows about the repository before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Working directory name.
    pub name: String,
    /// `None` when HEAD is detached.
    pub branch: Option<String>,
    /// Tracked files with staged or unstaged modifications.
    pub has_uncommitted_changes: bool,
}

/// Git client rooted at a repository working directory.
#[derive(Debug, Clone)]
pub struct GitClient {
    workdir: PathBuf,
}

impl GitClient {
    /// Client for the repository whose working directory is `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Find the repository containing `start` and root the client at its
    /// working directory. Falls back to `start` when there is none, in which
    /// case [`VcsClient::is_repository`] reports `false`.
    pub fn discover(start: &Path) -> Self {
        let workdir = Repository::discover(start)
            .ok()
            .and_then(|repo| repo.workdir().map(Path::to_path_buf))
            .unwrap_or_else(|| start.to_path_buf());
        Self::new(workdir)
    }

    /// Repository working directory.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Check that the `git` binary is available.
    pub fn check_installed() -> Result<(), VcsError> {
        which::which("git")
            .map(|_| ())
            .map_err(|_| VcsError::GitNotInstalled)
    }

    /// Name, branch and dirty state of the repository.
    pub fn repository_info(&self) -> Result<RepositoryInfo, VcsError> {
        let repo = self.open()?;

        let name = self
            .workdir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.workdir.display().to_string());

        // An unborn branch has no HEAD commit yet but still names a branch.
        let branch = match repo.head() {
            Ok(head) if head.is_branch() => head.shorthand().map(String::from),
            Ok(_) => None,
            Err(_) => repo
                .find_reference("HEAD")
                .ok()
                .and_then(|r| r.symbolic_target().map(String::from))
                .map(|t| t.trim_start_matches("refs/heads/").to_string()),
        };

        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);
        let statuses = repo.statuses(Some(&mut opts)).map_err(VcsError::Status)?;
        let has_uncommitted_changes = !statuses.is_empty();

        Ok(RepositoryInfo {
            name,
            branch,
            has_uncommitted_changes,
        })
    }

    fn open(&self) -> Result<Repository, VcsError> {
        Repository::open(&self.workdir).map_err(VcsError::OpenRepository)
    }

    /// Name of the checked-out branch.
    fn current_branch(&self, fail: fn(String) -> VcsError) -> Result<String, VcsError> {
        let repo = self.open()?;
        let head = repo
            .head()
            .map_err(|e| fail(format!("could not determine HEAD: {}", e)))?;

        if !head.is_branch() {
            return Err(fail("HEAD is detached; check out a branch first".to_string()));
        }

        head.shorthand()
            .map(String::from)
            .ok_or_else(|| fail("could not determine current branch".to_string()))
    }

    fn resolve_target(
        &self,
        target: &RemoteTarget,
        fail: fn(String) -> VcsError,
    ) -> Result<(String, String), VcsError> {
        let remote = target
            .remote
            .clone()
            .unwrap_or_else(|| DEFAULT_REMOTE.to_string());
        let branch = match &target.branch {
            Some(branch) => branch.clone(),
            None => self.current_branch(fail)?,
        };
        Ok((remote, branch))
    }

    /// Run git in the working directory and return trimmed stdout.
    ///
    /// Spawn failures, timeouts, and non-zero exits are all reported through
    /// `fail`, so each operation keeps its own error kind.
    async fn run_git(&self, args: &[&str], fail: fn(String) -> VcsError) -> Result<String, VcsError> {
        let operation = args.first().copied().unwrap_or("git");
        let timeout_duration = git_timeout();

        let child = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout(timeout_duration, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(fail(format!("failed to run git {}: {}", operation, e))),
            Err(_) => {
                return Err(fail(format!(
                    "git {} timed out after {}s",
                    operation,
                    timeout_duration.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!("git {} failed: {}", operation, stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl VcsClient for GitClient {
    async fn is_repository(&self) -> bool {
        Repository::open(&self.workdir)
            .map(|repo| repo.workdir().is_some())
            .unwrap_or(false)
    }

    async fn list_untracked_paths(&self) -> Result<Vec<String>, VcsError> {
        let repo = self.open()?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = repo.statuses(Some(&mut opts)).map_err(VcsError::Status)?;
        let paths: Vec<String> = statuses
            .iter()
            .filter(|entry| entry.status().contains(Status::WT_NEW))
            .filter_map(|entry| entry.path().map(String::from))
            .collect();

        debug!(count = paths.len(), "Listed untracked files");
        Ok(paths)
    }

    async fn stage(&self, paths: &[String]) -> Result<(), VcsError> {
        if paths.is_empty() {
            return Err(VcsError::Stage("no files to stage".to_string()));
        }

        for path in paths {
            if let Err(e) = self.workdir.join(path).symlink_metadata() {
                return Err(VcsError::Stage(format!("{}: {}", path, e)));
            }
        }

        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run_git(&args, VcsError::Stage).await?;
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<String, VcsError> {
        self.run_git(&["commit", "--quiet", "-m", message], VcsError::Commit)
            .await?;
        let id = self.run_git(&["rev-parse", "HEAD"], VcsError::Commit).await?;
        debug!(commit = %id, "Created commit");
        Ok(id)
    }

    async fn push(&self, target: &RemoteTarget) -> Result<(), VcsError> {
        let (remote, branch) = self.resolve_target(target, VcsError::Push)?;
        debug!(remote = %remote, branch = %branch, "Pushing");
        self.run_git(&["push", remote.as_str(), branch.as_str()], VcsError::Push).await?;
        Ok(())
    }

    async fn pull(&self, target: &RemoteTarget) -> Result<(), VcsError> {
        let (remote, branch) = self.resolve_target(target, VcsError::Pull)?;
        debug!(remote = %remote, branch = %branch, "Pulling");
        self.run_git(
            &["pull", "--ff-only", remote.as_str(), branch.as_str()],
            VcsError::Pull,
        )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_timeout_default() {
        temp_env::with_var_unset(TIMEOUT_ENV_VAR, || {
            assert_eq!(git_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        });
    }

    #[test]
    fn test_timeout_from_env() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("42"), || {
            assert_eq!(git_timeout(), Duration::from_secs(42));
        });
    }

    #[test]
    fn test_timeout_invalid_env_falls_back() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("soon"), || {
            assert_eq!(git_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        });
    }

    #[tokio::test]
    async fn test_plain_directory_is_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let client = GitClient::discover(dir.path());
        assert!(!client.is_repository().await);
    }

    #[tokio::test]
    async fn test_list_untracked_recurses_and_skips_ignored() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/nested/lib.rs"), "fn x() {}").unwrap();
        fs::write(dir.path().join("README.md"), "hi").unwrap();
        fs::write(dir.path().join("debug.log"), "noise").unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();

        let client = GitClient::new(dir.path());
        assert!(client.is_repository().await);

        let paths = client.list_untracked_paths().await.unwrap();
        assert!(paths.contains(&"src/nested/lib.rs".to_string()));
        assert!(paths.contains(&"README.md".to_string()));
        assert!(paths.contains(&".gitignore".to_string()));
        assert!(!paths.iter().any(|p| p.ends_with(".log")));
    }

    #[tokio::test]
    async fn test_discover_from_subdirectory_finds_root() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();

        let client = GitClient::discover(&dir.path().join("a/b"));
        assert!(client.is_repository().await);
        assert_eq!(
            client.workdir().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_stage_rejects_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let client = GitClient::new(dir.path());

        let result = client.stage(&["missing.txt".to_string()]).await;
        assert!(matches!(result, Err(VcsError::Stage(msg)) if msg.contains("missing.txt")));
    }

    #[test]
    fn test_repository_info_on_unborn_branch() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.set_head("refs/heads/trunk").unwrap();
        fs::write(dir.path().join("new.txt"), "x").unwrap();

        let info = GitClient::new(dir.path()).repository_info().unwrap();
        assert_eq!(info.branch.as_deref(), Some("trunk"));
        assert_eq!(
            info.name,
            dir.path().file_name().unwrap().to_string_lossy()
        );
        // Untracked files are what dac commits, not uncommitted changes.
        assert!(!info.has_uncommitted_changes);
    }

    #[test]
    fn test_repository_info_reports_staged_changes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("staged.txt"), "x").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("staged.txt")).unwrap();
        index.write().unwrap();

        let info = GitClient::new(dir.path()).repository_info().unwrap();
        assert!(info.has_uncommitted_changes);
    }

    #[tokio::test]
    async fn test_stage_rejects_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let client = GitClient::new(dir.path());
        assert!(matches!(client.stage(&[]).await, Err(VcsError::Stage(_))));
    }
}

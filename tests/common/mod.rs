//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use git2::Repository;

use dac::clock::Sleeper;
use dac::config::{CategoryConfig, DacConfig};
use dac::run::{EventSink, RunEvent};
use dac::vcs::{RemoteTarget, VcsClient};
use dac::VcsError;

/// Write `size` bytes at `root/path`, creating parent directories.
pub fn write_file(root: &Path, path: &str, size: usize) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(full, vec![b'x'; size]).expect("Failed to write test file");
}

/// Temp directory holding the given files.
pub fn workdir_with(files: &[(&str, usize)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    for (path, size) in files {
        write_file(dir.path(), path, *size);
    }
    dir
}

/// Default configuration with the batch size of `ids` replaced.
pub fn config_with_batch_sizes(sizes: &[(&str, usize)]) -> DacConfig {
    let mut config = DacConfig::default();
    for (id, size) in sizes {
        let category: &mut CategoryConfig = config
            .file_types
            .iter_mut()
            .find(|c| c.id == *id)
            .unwrap_or_else(|| panic!("no category {}", id));
        category.batch_size = *size;
    }
    config
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with a committer identity.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
            config.set_bool("commit.gpgsign", false).unwrap();
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, path: &str, size: usize) {
        write_file(self.path(), path, size);
    }

    /// Run git in the repository and return stdout.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Commit one tracked file so HEAD points at a branch with history.
    pub fn initial_commit(&self) {
        self.write("INITIAL", 1);
        self.git(&["add", "INITIAL"]);
        self.git(&["commit", "--quiet", "-m", "initial"]);
    }

    /// Commit subjects, newest first.
    pub fn log_subjects(&self) -> Vec<String> {
        self.git(&["log", "--format=%s"])
            .lines()
            .map(String::from)
            .collect()
    }

    /// Attach a bare repository as `origin` and return its directory.
    pub fn with_bare_origin(&self) -> tempfile::TempDir {
        let remote = tempfile::tempdir().expect("Failed to create temp directory");
        Repository::init_bare(remote.path()).expect("Failed to init bare repo");
        let url = remote.path().to_string_lossy().to_string();
        self.repo
            .remote("origin", &url)
            .expect("Failed to add origin remote");
        remote
    }

    pub fn current_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }
}

/// Number of commits reachable from `branch` in the repository at `path`.
pub fn commit_count(path: &Path, branch: &str) -> usize {
    let repo = Repository::open(path).expect("Failed to open repository");
    let Ok(reference) = repo.find_reference(&format!("refs/heads/{}", branch)) else {
        return 0;
    };
    let Some(oid) = reference.target() else {
        return 0;
    };
    let mut walk = repo.revwalk().unwrap();
    walk.push(oid).unwrap();
    walk.count()
}

/// One call observed by [`FakeVcs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Pull,
    List,
    Stage(Vec<String>),
    Commit(String),
    Push,
}

/// Scriptable in-memory [`VcsClient`].
pub struct FakeVcs {
    repository: bool,
    untracked: Vec<String>,
    /// 1-based indices of commit calls that fail.
    failing_commits: Vec<usize>,
    /// Outcome of successive push calls; pushes succeed once it runs out.
    push_script: Mutex<VecDeque<bool>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeVcs {
    pub fn new(untracked: &[&str]) -> Self {
        Self {
            repository: true,
            untracked: untracked.iter().map(|p| p.to_string()).collect(),
            failing_commits: Vec::new(),
            push_script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn not_a_repository(mut self) -> Self {
        self.repository = false;
        self
    }

    pub fn fail_commit(mut self, nth: usize) -> Self {
        self.failing_commits.push(nth);
        self
    }

    pub fn push_results(self, results: &[bool]) -> Self {
        *self.push_script.lock().unwrap() = results.iter().copied().collect();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Commit(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn push_calls(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Push).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VcsClient for FakeVcs {
    async fn is_repository(&self) -> bool {
        self.repository
    }

    async fn list_untracked_paths(&self) -> Result<Vec<String>, VcsError> {
        self.record(Call::List);
        Ok(self.untracked.clone())
    }

    async fn stage(&self, paths: &[String]) -> Result<(), VcsError> {
        self.record(Call::Stage(paths.to_vec()));
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<String, VcsError> {
        self.record(Call::Commit(message.to_string()));
        let nth = self.commit_messages().len();
        if self.failing_commits.contains(&nth) {
            return Err(VcsError::Commit(format!("hook rejected commit {}", nth)));
        }
        Ok(format!("{:040x}", nth))
    }

    async fn push(&self, _target: &RemoteTarget) -> Result<(), VcsError> {
        self.record(Call::Push);
        let ok = self.push_script.lock().unwrap().pop_front().unwrap_or(true);
        if ok {
            Ok(())
        } else {
            Err(VcsError::Push("remote unreachable".to_string()))
        }
    }

    async fn pull(&self, _target: &RemoteTarget) -> Result<(), VcsError> {
        self.record(Call::Pull);
        Ok(())
    }
}

/// Sleeper that records durations instead of waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    naps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn naps(&self) -> Vec<Duration> {
        self.naps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.naps.lock().unwrap().push(duration);
    }
}

/// Event sink that keeps every event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &RunEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

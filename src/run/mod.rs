//! Batch commit engine.
//!
//! Lists untracked files, classifies and partitions them, then commits each
//! batch in order while the [`FlushController`] decides when to push. Only
//! setup failures abort a run; per-batch and per-push failures are collected
//! in [`ProcessingResult::errors`].

pub mod events;
pub mod flush;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::analysis::{SkipReason, analyze_files};
use crate::batch::{Batch, partition};
use crate::classify::Classifier;
use crate::clock::Sleeper;
use crate::config::DacConfig;
use crate::error::{SetupError, VcsError};
use crate::vcs::{RemoteTarget, VcsClient, push_with_retry};

pub use events::{EventSink, NullSink, RunEvent};
pub use flush::{FlushController, FlushReason, FlushState, PushAccount, PushOutcome};

/// Paths handed to one `stage` call.
pub const STAGE_CHUNK_SIZE: usize = 50;

/// Pause after a successful push when more batches remain.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);

/// Per-run options, usually taken from CLI flags.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    /// Applies to every category when set.
    pub batch_size_override: Option<usize>,
    /// Category ids to keep. Empty keeps everything.
    pub category_filter: Vec<String>,
    /// Pull before a live run.
    pub pull: bool,
    pub remote: RemoteTarget,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            batch_size_override: None,
            category_filter: Vec::new(),
            pull: true,
            remote: RemoteTarget::default(),
        }
    }
}

/// Summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingResult {
    pub commit_count: usize,
    /// Files in every batch the run attempted.
    pub files_processed: usize,
    /// Files in batches that were committed.
    pub files_committed: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
    pub push_count: u32,
    /// Commits left on the local branch at the end of the run.
    pub unpushed_commits: u32,
    pub unpushed_bytes: u64,
    pub dry_run: bool,
}

impl ProcessingResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Planned batches plus the outcome of processing them.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub batches: Vec<Batch>,
    pub result: ProcessingResult,
}

/// Drives one batch commit run against a [`VcsClient`].
pub struct BatchCommitRunner<'a, V: ?Sized, S: ?Sized, E: ?Sized> {
    vcs: &'a V,
    sleeper: &'a S,
    events: &'a E,
    workdir: PathBuf,
    cooldown: Duration,
}

impl<'a, V, S, E> BatchCommitRunner<'a, V, S, E>
where
    V: VcsClient + ?Sized,
    S: Sleeper + ?Sized,
    E: EventSink + ?Sized,
{
    /// `workdir` is the repository root the untracked paths are relative to.
    pub fn new(vcs: &'a V, sleeper: &'a S, events: &'a E, workdir: impl Into<PathBuf>) -> Self {
        Self {
            vcs,
            sleeper,
            events,
            workdir: workdir.into(),
            cooldown: DEFAULT_COOLDOWN,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Run the whole pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] when the run cannot start: no repository, an
    /// invalid configuration, an unknown category in the filter, or a failure
    /// to list untracked files. Nothing has been staged at that point.
    pub async fn run(
        &self,
        config: &DacConfig,
        options: &RunOptions,
    ) -> Result<RunReport, SetupError> {
        let started = Instant::now();

        if !self.vcs.is_repository().await {
            return Err(SetupError::NotRepository(self.workdir.clone()));
        }

        config.validate()?;
        let filter = category_filter(config, &options.category_filter)?;
        let classifier = Classifier::new(&config.file_types)?;

        if options.pull && !options.dry_run {
            self.pull(&options.remote).await;
        }

        let paths = self
            .vcs
            .list_untracked_paths()
            .await
            .map_err(SetupError::ListUntracked)?;
        self.events.emit(&RunEvent::UntrackedListed { count: paths.len() });

        let analysis = analyze_files(
            &self.workdir,
            &paths,
            &classifier,
            &config.processing,
            filter.as_ref(),
        );

        let mut result = ProcessingResult {
            dry_run: options.dry_run,
            ..ProcessingResult::default()
        };

        for skipped in &analysis.skipped {
            self.events.emit(&RunEvent::FileSkipped {
                path: skipped.path.clone(),
                reason: skipped.reason.to_string(),
            });
            if let SkipReason::Unreadable(e) = &skipped.reason {
                result.errors.push(e.to_string());
            }
        }

        let batches = partition(
            &analysis.records,
            &config.file_types,
            options.batch_size_override,
        );
        self.events.emit(&RunEvent::BatchesPlanned {
            batches: batches.len(),
            files: analysis.records.len(),
            total_bytes: analysis.total_bytes(),
        });

        if options.dry_run {
            result.files_processed = analysis.records.len();
            info!(batches = batches.len(), "Dry run, nothing committed");
        } else {
            self.process_batches(&batches, config, &options.remote, &mut result)
                .await;
        }

        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(RunReport { batches, result })
    }

    async fn pull(&self, target: &RemoteTarget) {
        match self.vcs.pull(target).await {
            Ok(()) => self.events.emit(&RunEvent::Pulled),
            Err(e) => {
                warn!(error = %e, "Pull failed, continuing with local state");
                self.events.emit(&RunEvent::PullFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    async fn process_batches(
        &self,
        batches: &[Batch],
        config: &DacConfig,
        target: &RemoteTarget,
        result: &mut ProcessingResult,
    ) {
        let mut flush = FlushController::new(config.max_push_size_bytes());
        let total = batches.len();

        for (i, batch) in batches.iter().enumerate() {
            let index = i + 1;
            let is_last = index == total;
            result.files_processed += batch.files.len();

            self.events.emit(&RunEvent::BatchStarted {
                index,
                total,
                message: batch.message.clone(),
                files: batch.files.len(),
            });

            let committed = match self.commit_batch(batch).await {
                Ok(commit_id) => {
                    let bytes = batch.total_bytes();
                    flush.record_commit(bytes);
                    result.commit_count += 1;
                    result.files_committed += batch.files.len();

                    info!(batch = index, commit = %commit_id, bytes, "Committed batch");
                    self.events.emit(&RunEvent::BatchCommitted {
                        index,
                        commit_id,
                        files: batch.files.len(),
                        bytes,
                        backlog_bytes: flush.account().bytes_since_last_push,
                        max_push_bytes: flush.max_push_bytes(),
                    });
                    true
                }
                Err(e) => {
                    warn!(batch = index, error = %e, "Batch failed, skipping");
                    result.errors.push(format!("Batch {}: {}", index, e));
                    self.events.emit(&RunEvent::BatchFailed {
                        index,
                        error: e.to_string(),
                    });
                    false
                }
            };

            // A failed batch adds nothing to push. Only the last one still
            // polls, so an earlier backlog is attempted before the run ends.
            if !committed && !is_last {
                continue;
            }

            if let Some(reason) = flush.poll(is_last) {
                let pushed = self
                    .flush(&mut flush, reason, config, target, result)
                    .await;

                if pushed && !is_last {
                    self.events.emit(&RunEvent::Cooldown {
                        millis: u64::try_from(self.cooldown.as_millis()).unwrap_or(u64::MAX),
                    });
                    self.sleeper.sleep(self.cooldown).await;
                }
            }
        }

        let account = flush.account();
        result.push_count = account.push_count;
        result.unpushed_commits = account.commits_since_last_push;
        result.unpushed_bytes = account.bytes_since_last_push;
    }

    /// Stage the batch in chunks, then commit it.
    async fn commit_batch(&self, batch: &Batch) -> Result<String, VcsError> {
        let paths = batch.paths();
        let mut staged = 0;

        for chunk in paths.chunks(STAGE_CHUNK_SIZE) {
            self.vcs.stage(chunk).await?;
            staged += chunk.len();
            debug!(staged, total = paths.len(), "Staged chunk");
            self.events.emit(&RunEvent::StageProgress {
                staged,
                total: paths.len(),
            });
        }

        self.vcs.commit(&batch.message).await
    }

    /// Push the backlog. Returns whether the push went through.
    async fn flush(
        &self,
        flush: &mut FlushController,
        reason: FlushReason,
        config: &DacConfig,
        target: &RemoteTarget,
        result: &mut ProcessingResult,
    ) -> bool {
        let account = flush.account();
        let attempt = account.push_attempts + 1;

        info!(
            attempt,
            commits = account.commits_since_last_push,
            bytes = account.bytes_since_last_push,
            %reason,
            "Pushing"
        );
        self.events.emit(&RunEvent::PushStarted {
            attempt,
            commits: account.commits_since_last_push,
            bytes: account.bytes_since_last_push,
            reason,
        });

        match push_with_retry(
            self.vcs,
            target,
            self.sleeper,
            config.processing.retry_failed_pushes,
        )
        .await
        {
            Ok(()) => {
                flush.complete(PushOutcome::Pushed);
                self.events.emit(&RunEvent::PushSucceeded { attempt });
                true
            }
            Err(e) => {
                flush.complete(PushOutcome::Failed);
                warn!(
                    attempt,
                    error = %e,
                    "Push failed; commits stay local. Run 'git push' manually once the remote is reachable"
                );
                result.errors.push(format!("Push {}: {}", attempt, e));
                self.events.emit(&RunEvent::PushFailed {
                    attempt,
                    error: e.to_string(),
                });
                false
            }
        }
    }
}

/// Validate the requested category ids. `None` keeps every category.
fn category_filter(
    config: &DacConfig,
    requested: &[String],
) -> Result<Option<BTreeSet<String>>, SetupError> {
    if requested.is_empty() {
        return Ok(None);
    }

    if let Some(unknown) = requested.iter().find(|id| !config.knows_category(id)) {
        return Err(SetupError::UnknownCategory(unknown.clone()));
    }

    Ok(Some(requested.iter().cloned().collect()))
}

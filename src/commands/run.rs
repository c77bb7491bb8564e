//! `dac run`: batch, commit and push untracked files.

use std::path::Path;

use anyhow::{Result, bail};
use clap::Args;

use crate::batch::Batch;
use crate::clock::TokioSleeper;
use crate::config;
use crate::error::SetupError;
use crate::progress::{TerminalReporter, format_size};
use crate::run::{BatchCommitRunner, ProcessingResult, RunOptions, RunReport};
use crate::vcs::{GitClient, RemoteTarget, RepositoryInfo};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Show the planned commits without touching the repository
    #[arg(short, long)]
    pub dry_run: bool,

    /// Files per commit for every category
    #[arg(short, long, value_name = "N", value_parser = parse_batch_size)]
    pub batch_size: Option<usize>,

    /// Only process these file types (repeatable)
    #[arg(short = 't', long = "type", value_name = "ID")]
    pub types: Vec<String>,

    /// Skip the pull before committing
    #[arg(long)]
    pub no_pull: bool,

    /// Remote to pull from and push to (default: origin)
    #[arg(long, value_name = "NAME")]
    pub remote: Option<String>,
}

impl RunArgs {
    pub async fn execute(self, cwd: &Path, quiet: bool) -> Result<()> {
        GitClient::check_installed()?;
        let git = super::open_repository(cwd).await?;
        let root = git.workdir().to_path_buf();
        let config = config::load(&root).map_err(SetupError::from)?;

        let options = RunOptions {
            dry_run: self.dry_run,
            batch_size_override: self.batch_size,
            category_filter: self.types,
            pull: !self.no_pull,
            remote: RemoteTarget {
                remote: self.remote,
                branch: None,
            },
        };

        if !quiet {
            match git.repository_info() {
                Ok(info) => repository_lines(&info).iter().for_each(|l| println!("{}", l)),
                Err(e) => tracing::debug!(error = %e, "Could not read repository info"),
            }
        }

        let reporter = TerminalReporter::new(quiet);
        let runner = BatchCommitRunner::new(&git, &TokioSleeper, &reporter, &root);
        let report = runner.run(&config, &options).await?;

        finish(&report, options.dry_run, quiet)
    }
}

/// Print the outcome of a run and turn collected errors into a failure.
pub fn finish(report: &RunReport, dry_run: bool, quiet: bool) -> Result<()> {
    let result = &report.result;

    if report.batches.is_empty() && result.success() {
        if !quiet {
            println!("No untracked files to commit.");
        }
        return Ok(());
    }

    if dry_run && !report.batches.is_empty() {
        for line in dry_run_preview(&report.batches) {
            println!("{}", line);
        }
        if result.success() {
            return Ok(());
        }
    }

    let summary = summary_lines(result);
    if quiet {
        summary.iter().filter(|l| l.starts_with("  -")).for_each(|l| eprintln!("{}", l));
    } else {
        summary.iter().for_each(|l| println!("{}", l));
    }

    if !result.success() {
        bail!("{} error(s) during run", result.errors.len());
    }
    Ok(())
}

/// Repository header shown before a run.
pub fn repository_lines(info: &RepositoryInfo) -> Vec<String> {
    let branch = info.branch.as_deref().unwrap_or("detached HEAD");
    let mut lines = vec![format!("Repository: {} ({})", info.name, branch)];
    if info.has_uncommitted_changes {
        lines.push(
            "[WARN] Tracked files have uncommitted changes; staged changes will go into the first commit."
                .to_string(),
        );
    }
    lines
}

fn parse_batch_size(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Planned commits with their files, as shown by `--dry-run`.
pub fn dry_run_preview(batches: &[Batch]) -> Vec<String> {
    let mut lines = vec!["\n--- Dry Run ---\n".to_string()];
    for (i, batch) in batches.iter().enumerate() {
        lines.push(format!("Batch {}: {}", i + 1, batch.message));
        for file in &batch.files {
            let marker = if file.is_large { " [large]" } else { "" };
            lines.push(format!(
                "   {} ({}){}",
                file.path,
                format_size(file.size_bytes),
                marker
            ));
        }
        lines.push(String::new());
    }
    lines.push(format!("Total: {} commits would be created", batches.len()));
    lines
}

/// End-of-run summary. Error entries are prefixed with `  - `.
pub fn summary_lines(result: &ProcessingResult) -> Vec<String> {
    let mut lines = vec![
        "\nProcessing complete".to_string(),
        format!("  Commits: {}", result.commit_count),
        format!(
            "  Files: {} processed, {} committed",
            result.files_processed, result.files_committed
        ),
        format!("  Pushes: {}", result.push_count),
        format!("  Duration: {:.1}s", result.duration_ms as f64 / 1000.0),
    ];

    if result.unpushed_commits > 0 {
        lines.push(format!(
            "  [WARN] {} commits ({}) not pushed. Run 'git push' when the remote is reachable.",
            result.unpushed_commits,
            format_size(result.unpushed_bytes)
        ));
    }

    if !result.errors.is_empty() {
        lines.push("Errors:".to_string());
        lines.extend(result.errors.iter().map(|e| format!("  - {}", e)));
    }

    lines
}

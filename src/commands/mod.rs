//! Command-line interface and subcommand dispatch.

pub mod config;
pub mod init;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::error::SetupError;
use crate::vcs::{GitClient, VcsClient};

/// Commit untracked files in per-category batches and push them under a size budget.
#[derive(Parser, Debug)]
#[command(name = "dac")]
#[command(about = "Commit untracked files in per-category batches")]
#[command(version)]
pub struct Cli {
    /// Only print failures
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default .dacrc.json to the repository root
    Init(init::InitArgs),
    /// Commit untracked files in batches
    Run(run::RunArgs),
    /// Show or edit the configuration
    Config(config::ConfigArgs),
}

impl Cli {
    /// Log filter used when RUST_LOG is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose { "dac=debug" } else { "warn" }
    }

    pub async fn execute(self) -> Result<()> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;

        match self.command {
            Commands::Init(args) => args.execute(&cwd).await,
            Commands::Run(args) => args.execute(&cwd, self.quiet).await,
            Commands::Config(args) => args.execute(&cwd),
        }
    }
}

/// Open the repository containing `cwd`, failing when there is none.
pub(crate) async fn open_repository(cwd: &Path) -> Result<GitClient, SetupError> {
    let git = GitClient::discover(cwd);
    if git.is_repository().await {
        Ok(git)
    } else {
        Err(SetupError::NotRepository(cwd.to_path_buf()))
    }
}

/// Directory holding `.dacrc.json`: the repository root, or `cwd` outside a
/// repository.
pub(crate) fn config_root(cwd: &Path) -> PathBuf {
    GitClient::discover(cwd).workdir().to_path_buf()
}

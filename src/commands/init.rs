//! `dac init`: write the default configuration.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::Confirm;

use crate::config::{self, CONFIG_FILE_NAME, DacConfig, default_config};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration without asking
    #[arg(short, long)]
    pub force: bool,
}

impl InitArgs {
    pub async fn execute(self, cwd: &Path) -> Result<()> {
        let git = super::open_repository(cwd).await?;
        let root = git.workdir();

        let written = initialize(root, self.force, || {
            Confirm::new()
                .with_prompt("DAC configuration already exists. Overwrite?")
                .default(false)
                .interact()
                .context("Failed to read confirmation")
        })?;

        match written {
            Some(config) => {
                println!(
                    "  [DONE] Created {} with {} file types",
                    CONFIG_FILE_NAME,
                    config.file_types.len()
                );
                println!("Preview with 'dac run --dry-run', then commit with 'dac run'.");
            }
            None => println!("Initialization cancelled."),
        }
        Ok(())
    }
}

/// Write the default configuration into `root`.
///
/// An existing file is only replaced when `force` is set or
/// `confirm_overwrite` agrees. Returns the written configuration, or `None`
/// when the user declined.
pub fn initialize<F>(root: &Path, force: bool, confirm_overwrite: F) -> Result<Option<DacConfig>>
where
    F: FnOnce() -> Result<bool>,
{
    if config::config_exists(root) && !force && !confirm_overwrite()? {
        return Ok(None);
    }

    let config = default_config();
    config::save(root, &config).context("Failed to write configuration")?;
    Ok(Some(config))
}

//! `dac config`: inspect and edit `.dacrc.json`.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::Confirm;
use serde_json::Value;

use crate::config::edit::{get_value, parse_assignment, set_value};
use crate::config::{self, DacConfig, default_config};
use crate::error::ConfigError;
use crate::progress::format_size;

/// With no flag the configuration is listed.
#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct ConfigArgs {
    /// Show the current configuration
    #[arg(short, long)]
    pub list: bool,

    /// Print the value at a dotted key, e.g. processing.maxFileSize
    #[arg(short, long, value_name = "KEY")]
    pub get: Option<String>,

    /// Set a dotted key; the value is parsed as JSON, else kept as a string
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub set: Option<String>,

    /// Restore the default configuration
    #[arg(short, long)]
    pub reset: bool,
}

impl ConfigArgs {
    pub fn execute(self, cwd: &Path) -> Result<()> {
        let root = super::config_root(cwd);

        if let Some(key) = self.get {
            let value = get(&root, &key)?;
            let rendered =
                serde_json::to_string_pretty(&value).context("Failed to render value")?;
            println!("{}: {}", key, rendered);
        } else if let Some(assignment) = self.set {
            let (key, value) = set(&root, &assignment)?;
            println!("  [DONE] Set {} = {}", key, value);
        } else if self.reset {
            // Fails with NotInitialized before prompting when there is nothing to reset.
            config::load_value(&root)?;
            let confirmed = Confirm::new()
                .with_prompt("Reset configuration to defaults?")
                .default(false)
                .interact()
                .context("Failed to read confirmation")?;
            if confirmed {
                reset(&root)?;
                println!("  [DONE] Configuration reset to defaults");
            } else {
                println!("Reset cancelled.");
            }
        } else {
            let config = config::load(&root)?;
            for line in describe(&config) {
                println!("{}", line);
            }
        }

        Ok(())
    }
}

/// Value stored at a dotted key.
pub fn get(root: &Path, key: &str) -> Result<Value, ConfigError> {
    let document = config::load_value(root)?;
    get_value(&document, key)
        .cloned()
        .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))
}

/// Apply a `key=value` assignment and persist it. Keys the configuration
/// type does not model are kept as they are.
pub fn set(root: &Path, assignment: &str) -> Result<(String, Value), ConfigError> {
    let (key, value) = parse_assignment(assignment)?;
    let mut document = config::load_value(root)?;
    set_value(&mut document, &key, value.clone())?;
    config::save_value(root, &document)?;
    Ok((key, value))
}

/// Overwrite the configuration with the defaults.
pub fn reset(root: &Path) -> Result<(), ConfigError> {
    config::save(root, &default_config())
}

/// Human-readable listing of `config`.
pub fn describe(config: &DacConfig) -> Vec<String> {
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
    let processing = &config.processing;

    let mut lines = vec![
        "Current DAC configuration:".to_string(),
        format!("  Version: {}", config.version),
        format!("  Max push size: {}", format_size(config.max_push_size_bytes())),
        String::new(),
        "Processing:".to_string(),
        format!("  Retry failed pushes: {}", yes_no(processing.retry_failed_pushes)),
        format!("  Skip large files: {}", yes_no(processing.skip_large_files)),
        format!("  Max file size: {}", format_size(processing.max_file_size)),
        String::new(),
        "File types:".to_string(),
    ];

    for category in &config.file_types {
        lines.push(format!(
            "  {} {} ({}): {} files per batch",
            category.icon, category.name, category.id, category.batch_size
        ));
    }

    if !config.exclude_patterns.is_empty() {
        lines.push(String::new());
        lines.push("Exclude patterns:".to_string());
        lines.extend(config.exclude_patterns.iter().map(|p| format!("  - {}", p)));
    }

    lines
}

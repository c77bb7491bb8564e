//! `.dacrc.json` loading, validation, and atomic persistence.
//!
//! Categories are kept as an ordered list. The on-disk format stores them as a
//! JSON object keyed by category id, and key order in that object is the
//! classification order.

pub mod defaults;
pub mod edit;

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ConfigError;

pub use defaults::default_config;

/// File name of the per-repository configuration.
pub const CONFIG_FILE_NAME: &str = ".dacrc.json";

/// Push budget used when the configuration does not set one (1 GiB).
pub const DEFAULT_MAX_PUSH_SIZE_BYTES: u64 = 1024 * 1024 * 1024;

/// Batch size used when neither the CLI nor the category sets one.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Largest file kept when `skipLargeFiles` is on (50 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Category id of the catch-all bucket.
pub const MISC_CATEGORY: &str = "misc";

const CONFIG_VERSION: &str = "1.0.0";

/// Settings for one file category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    /// Stored as the key of the `fileTypes` object, not inside the entry.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_icon")]
    pub icon: String,
}

/// The `processing` section of `.dacrc.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingSettings {
    #[serde(default = "default_true")]
    pub retry_failed_pushes: bool,
    #[serde(default = "default_true")]
    pub skip_large_files: bool,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            retry_failed_pushes: true,
            skip_large_files: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE_BYTES,
        }
    }
}

/// The whole `.dacrc.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DacConfig {
    #[serde(default = "default_version")]
    pub version: String,
    /// Passed through untouched; the batch engine does not consume it.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default = "default_max_push_size")]
    pub max_push_size: u64,
    #[serde(default)]
    pub processing: ProcessingSettings,
    #[serde(default, with = "ordered_categories")]
    pub file_types: Vec<CategoryConfig>,
}

impl Default for DacConfig {
    fn default() -> Self {
        default_config()
    }
}

impl DacConfig {
    /// Push budget in bytes. Zero means "unset".
    pub fn max_push_size_bytes(&self) -> u64 {
        if self.max_push_size == 0 {
            DEFAULT_MAX_PUSH_SIZE_BYTES
        } else {
            self.max_push_size
        }
    }

    /// Look up a category by id.
    pub fn category(&self, id: &str) -> Option<&CategoryConfig> {
        self.file_types.iter().find(|c| c.id == id)
    }

    /// Whether `id` names a configured category or the implicit catch-all.
    pub fn knows_category(&self, id: &str) -> bool {
        id == MISC_CATEGORY || self.category(id).is_some()
    }

    /// Reject configurations that would make classification ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for category in &self.file_types {
            if !seen.insert(category.id.as_str()) {
                return Err(ConfigError::DuplicateCategory(category.id.clone()));
            }
        }
        Ok(())
    }
}

/// Path of the configuration file inside `root`.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Whether `root` already holds a configuration file.
pub fn config_exists(root: &Path) -> bool {
    config_path(root).is_file()
}

/// Load and validate the configuration stored in `root`.
pub fn load(root: &Path) -> Result<DacConfig, ConfigError> {
    let content = read_config_file(root)?;
    let config: DacConfig = serde_json::from_str(&content).map_err(ConfigError::ParseFailed)?;
    config.validate()?;
    debug!(
        categories = config.file_types.len(),
        max_push_size = config.max_push_size_bytes(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Load the raw JSON document, keeping keys this crate does not model.
pub fn load_value(root: &Path) -> Result<Value, ConfigError> {
    let content = read_config_file(root)?;
    serde_json::from_str(&content).map_err(ConfigError::ParseFailed)
}

/// Persist `config` to `root`, replacing any existing file atomically.
pub fn save(root: &Path, config: &DacConfig) -> Result<(), ConfigError> {
    let data = serde_json::to_string_pretty(config).map_err(ConfigError::SerializeFailed)?;
    write_atomic(&config_path(root), &data)
}

/// Persist a raw JSON document after checking it still parses as a config.
pub fn save_value(root: &Path, value: &Value) -> Result<DacConfig, ConfigError> {
    let config: DacConfig =
        serde_json::from_value(value.clone()).map_err(ConfigError::ParseFailed)?;
    config.validate()?;
    let data = serde_json::to_string_pretty(value).map_err(ConfigError::SerializeFailed)?;
    write_atomic(&config_path(root), &data)?;
    Ok(config)
}

fn read_config_file(root: &Path) -> Result<String, ConfigError> {
    let path = config_path(root);
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ConfigError::NotInitialized(path))
        }
        Err(e) => Err(ConfigError::ReadFailed(e)),
    }
}

/// Write through a temp file in the same directory, then rename over `path`.
fn write_atomic(path: &Path, data: &str) -> Result<(), ConfigError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(ConfigError::WriteFailed)?;
    tmp.write_all(data.as_bytes())
        .and_then(|()| tmp.write_all(b"\n"))
        .map_err(ConfigError::WriteFailed)?;
    tmp.persist(path)
        .map_err(|e| ConfigError::WriteFailed(e.error))?;
    Ok(())
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_max_push_size() -> u64 {
    DEFAULT_MAX_PUSH_SIZE_BYTES
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_icon() -> String {
    "📁".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE_BYTES
}

/// (De)serialize `Vec<CategoryConfig>` as a JSON object in declaration order.
mod ordered_categories {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::CategoryConfig;

    pub fn serialize<S: Serializer>(
        categories: &[CategoryConfig],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(categories.len()))?;
        for category in categories {
            map.serialize_entry(&category.id, category)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<CategoryConfig>, D::Error> {
        deserializer.deserialize_map(CategoriesVisitor)
    }

    struct CategoriesVisitor;

    impl<'de> Visitor<'de> for CategoriesVisitor {
        type Value = Vec<CategoryConfig>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of category id to category settings")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut categories = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((id, mut category)) = access.next_entry::<String, CategoryConfig>()? {
                category.id = id;
                categories.push(category);
            }
            Ok(categories)
        }
    }
}

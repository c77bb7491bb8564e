//! Turn untracked paths into classified, sized file records.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::classify::{Classifier, file_extension};
use crate::config::ProcessingSettings;
use crate::error::AnalysisError;

/// Files above this size are flagged as large (10 MiB).
pub const LARGE_FILE_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;

/// One analyzed untracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the repository root, as reported by the VCS.
    pub path: String,
    pub category: String,
    pub size_bytes: u64,
    /// Lowercase with a leading dot, empty when the file has no extension.
    pub extension: String,
    pub is_large: bool,
}

/// Why a file was left out of the run.
#[derive(Debug)]
pub enum SkipReason {
    Unreadable(AnalysisError),
    TooLarge { size_bytes: u64, limit_bytes: u64 },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unreadable(e) => write!(f, "{}", e),
            SkipReason::TooLarge {
                size_bytes,
                limit_bytes,
            } => write!(
                f,
                "file is {} bytes, above the {} byte limit",
                size_bytes, limit_bytes
            ),
        }
    }
}

/// A file that was not turned into a record.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

/// Outcome of analyzing a list of untracked paths.
#[derive(Debug, Default)]
pub struct Analysis {
    pub records: Vec<FileRecord>,
    pub skipped: Vec<SkippedFile>,
    /// Files dropped because their category was not selected.
    pub filtered_out: usize,
}

impl Analysis {
    /// Total size of all records.
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }
}

/// Stat and classify each of `paths` (relative to `root`), in order.
///
/// A file that cannot be read is skipped and reported, never fatal. Records
/// outside `category_filter` are dropped silently.
pub fn analyze_files(
    root: &Path,
    paths: &[String],
    classifier: &Classifier,
    processing: &ProcessingSettings,
    category_filter: Option<&BTreeSet<String>>,
) -> Analysis {
    let mut analysis = Analysis::default();

    for path in paths {
        let metadata = match std::fs::metadata(root.join(path)) {
            Ok(m) => m,
            Err(source) => {
                warn!(path = %path, error = %source, "Could not analyze file");
                analysis.skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: SkipReason::Unreadable(AnalysisError::Stat {
                        path: path.clone(),
                        source,
                    }),
                });
                continue;
            }
        };

        let extension = file_extension(path);
        let category = classifier.classify(path, &extension);

        if let Some(filter) = category_filter
            && !filter.contains(category)
        {
            analysis.filtered_out += 1;
            continue;
        }

        let size_bytes = metadata.len();
        if processing.skip_large_files && size_bytes > processing.max_file_size {
            warn!(path = %path, size_bytes, "Skipping file above max file size");
            analysis.skipped.push(SkippedFile {
                path: path.clone(),
                reason: SkipReason::TooLarge {
                    size_bytes,
                    limit_bytes: processing.max_file_size,
                },
            });
            continue;
        }

        analysis.records.push(FileRecord {
            path: path.clone(),
            category: category.to_string(),
            size_bytes,
            extension,
            is_large: size_bytes > LARGE_FILE_THRESHOLD_BYTES,
        });
    }

    debug!(
        records = analysis.records.len(),
        skipped = analysis.skipped.len(),
        filtered_out = analysis.filtered_out,
        "Analyzed untracked files"
    );

    analysis
}

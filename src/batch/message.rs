//! Commit message wording for a batch.

use crate::analysis::FileRecord;
use crate::classify::file_name;
use crate::config::CategoryConfig;

const FALLBACK_ICON: &str = "📁";

/// Build the commit message for `files` of one category.
///
/// A single file is named explicitly; larger batches are counted with the
/// lowercased display name of the category.
pub fn commit_message(
    category_id: &str,
    category: Option<&CategoryConfig>,
    files: &[FileRecord],
) -> String {
    let icon = category
        .map(|c| c.icon.as_str())
        .filter(|icon| !icon.is_empty())
        .unwrap_or(FALLBACK_ICON);

    match files {
        [single] => format!("{} Add {}", icon, file_name(&single.path)),
        _ => {
            let label = category
                .map(|c| c.name.as_str())
                .filter(|name| !name.is_empty())
                .unwrap_or(category_id);
            format!("{} Add {} {}", icon, files.len(), label.to_lowercase())
        }
    }
}

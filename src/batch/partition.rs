//! Group file records by category and slice them into batches.

use std::collections::HashMap;

use crate::analysis::FileRecord;
use crate::config::{CategoryConfig, DEFAULT_BATCH_SIZE};

use super::Batch;
use super::message::commit_message;

/// Window size for a category: the CLI override, then the category's own
/// size, then [`DEFAULT_BATCH_SIZE`]. Zero counts as unset.
///
/// The override applies to every category alike.
pub fn effective_batch_size(category: Option<&CategoryConfig>, override_size: Option<usize>) -> usize {
    override_size
        .filter(|&n| n > 0)
        .or_else(|| category.map(|c| c.batch_size).filter(|&n| n > 0))
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Partition `records` into commit batches.
///
/// Categories appear in the order they are first seen in `records`, and files
/// keep their input order inside a category. All windows of one category are
/// emitted before the next category starts.
pub fn partition(
    records: &[FileRecord],
    categories: &[CategoryConfig],
    override_size: Option<usize>,
) -> Vec<Batch> {
    let mut groups: Vec<(&str, Vec<&FileRecord>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.category.as_str()).or_insert_with(|| {
            groups.push((record.category.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }

    let mut batches = Vec::new();
    for (category_id, files) in groups {
        let category = categories.iter().find(|c| c.id == category_id);
        let size = effective_batch_size(category, override_size);

        for window in files.chunks(size) {
            let files: Vec<FileRecord> = window.iter().map(|&f| f.clone()).collect();
            let message = commit_message(category_id, category, &files);
            batches.push(Batch {
                category: category_id.to_string(),
                files,
                message,
            });
        }
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::default_categories;

    fn record(path: &str, category: &str, size: u64) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            category: category.to_string(),
            size_bytes: size,
            extension: String::new(),
            is_large: false,
        }
    }

    fn category(id: &str, name: &str, batch_size: usize) -> CategoryConfig {
        CategoryConfig {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            extensions: Vec::new(),
            patterns: Vec::new(),
            batch_size,
            icon: "*".to_string(),
        }
    }

    #[test]
    fn test_effective_batch_size_precedence() {
        let source = category("source", "Source Code", 15);
        assert_eq!(effective_batch_size(Some(&source), Some(3)), 3);
        assert_eq!(effective_batch_size(Some(&source), None), 15);
        assert_eq!(effective_batch_size(None, None), DEFAULT_BATCH_SIZE);
        assert_eq!(effective_batch_size(Some(&category("x", "X", 0)), None), DEFAULT_BATCH_SIZE);
        assert_eq!(effective_batch_size(Some(&source), Some(0)), 15);
    }

    #[test]
    fn test_two_categories_split_into_windows() {
        let categories = vec![category("source", "Source", 2), category("docs", "Docs", 2)];
        let records = vec![
            record("a.ts", "source", 100),
            record("b.ts", "source", 100),
            record("c.ts", "source", 100),
            record("readme.md", "docs", 50),
        ];

        let batches = partition(&records, &categories, None);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].paths(), vec!["a.ts", "b.ts"]);
        assert_eq!(batches[1].paths(), vec!["c.ts"]);
        assert_eq!(batches[2].paths(), vec!["readme.md"]);
        assert_eq!(batches[0].message, "* Add 2 source");
        assert_eq!(batches[1].message, "* Add c.ts");
        assert_eq!(batches[0].total_bytes(), 200);
    }

    #[test]
    fn test_category_order_is_first_seen() {
        let records = vec![
            record("a.md", "docs", 1),
            record("b.ts", "source", 1),
            record("c.md", "docs", 1),
        ];

        let batches = partition(&records, &default_categories(), None);
        let order: Vec<&str> = batches.iter().map(|b| b.category.as_str()).collect();
        assert_eq!(order, vec!["docs", "source"]);
        assert_eq!(batches[0].paths(), vec!["a.md", "c.md"]);
    }

    #[test]
    fn test_override_applies_to_every_category() {
        let records: Vec<FileRecord> = (0..5)
            .map(|i| record(&format!("{i}.ts"), "source", 1))
            .chain((0..3).map(|i| record(&format!("{i}.md"), "docs", 1)))
            .collect();

        let batches = partition(&records, &default_categories(), Some(2));
        let sizes: Vec<usize> = batches.iter().map(|b| b.files.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1, 2, 1]);
    }

    #[test]
    fn test_every_record_appears_exactly_once_within_bounds() {
        let categories = default_categories();
        let kinds = ["source", "docs", "media", "misc"];
        let records: Vec<FileRecord> = (0..97)
            .map(|i| record(&format!("f{i}"), kinds[i % kinds.len()], i as u64))
            .collect();

        for override_size in [None, Some(1), Some(4), Some(1000)] {
            let batches = partition(&records, &categories, override_size);

            let mut seen: Vec<&str> = batches
                .iter()
                .flat_map(|b| b.files.iter().map(|f| f.path.as_str()))
                .collect();
            seen.sort_unstable();
            let mut expected: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
            expected.sort_unstable();
            assert_eq!(seen, expected);

            for batch in &batches {
                let limit = effective_batch_size(
                    categories.iter().find(|c| c.id == batch.category),
                    override_size,
                );
                assert!(!batch.files.is_empty());
                assert!(batch.files.len() <= limit);
                assert!(batch.files.iter().all(|f| f.category == batch.category));
            }
        }
    }

    #[test]
    fn test_partition_is_deterministic() {
        let records = vec![
            record("x.md", "docs", 3),
            record("y.ts", "source", 4),
            record("z.png", "media", 5),
            record("w.ts", "source", 6),
        ];
        let categories = default_categories();
        assert_eq!(
            partition(&records, &categories, None),
            partition(&records, &categories, None)
        );
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        assert!(partition(&[], &default_categories(), None).is_empty());
    }
}

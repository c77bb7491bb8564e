//! File classification by extension and basename glob.

use std::path::Path;

use regex_lite::Regex;

use crate::config::{CategoryConfig, MISC_CATEGORY};
use crate::error::ConfigError;

/// Compiled classification rules for one category.
#[derive(Debug)]
struct Rule {
    id: String,
    extensions: Vec<String>,
    patterns: Vec<Regex>,
}

impl Rule {
    fn compile(category: &CategoryConfig) -> Result<Self, ConfigError> {
        let extensions = category
            .extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty())
            .collect();

        let patterns = category
            .patterns
            .iter()
            .map(|p| {
                compile_glob(p).map_err(|e| ConfigError::InvalidPattern {
                    category: category.id.clone(),
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: category.id.clone(),
            extensions,
            patterns,
        })
    }

    fn matches(&self, file_name: &str, extension: &str) -> bool {
        (!extension.is_empty() && self.extensions.iter().any(|e| e == extension))
            || self.patterns.iter().any(|p| p.is_match(file_name))
    }
}

/// Maps file paths to category ids.
///
/// Categories are tried in declaration order and the first match wins. The
/// catch-all `misc` category is always tried last, and is also the answer when
/// no rule matches, so every path gets exactly one non-empty id.
#[derive(Debug)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    /// Compile the rules of `categories`, keeping their order.
    pub fn new(categories: &[CategoryConfig]) -> Result<Self, ConfigError> {
        let rules = categories
            .iter()
            .filter(|c| c.id != MISC_CATEGORY)
            .map(Rule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Category id for `path`, whose lowercase extension is `extension`.
    pub fn classify(&self, path: &str, extension: &str) -> &str {
        let file_name = file_name(path).to_lowercase();
        let extension = extension.to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.matches(&file_name, &extension))
            .map(|rule| rule.id.as_str())
            .unwrap_or(MISC_CATEGORY)
    }
}

/// Lowercase extension of `path` with a leading dot, or `""` when it has none.
///
/// Dotfiles such as `.env` have no extension.
pub fn file_extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Final path component, falling back to the whole path.
pub fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Compile a glob where `*` matches any run of characters, anchored to the
/// whole (lowercased) basename.
fn compile_glob(pattern: &str) -> Result<Regex, regex_lite::Error> {
    let body: Vec<String> = pattern
        .to_lowercase()
        .split('*')
        .map(regex_lite::escape)
        .collect();
    Regex::new(&format!("^{}$", body.join(".*")))
}

//! Dotted-key access into the raw configuration document.
//!
//! Keys use the JSON field names, e.g. `processing.maxFileSize` or
//! `fileTypes.source.batchSize`. Array elements are addressed by index.

use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Split `key=value` into a key and a JSON value.
///
/// The value is parsed as JSON when possible (`15`, `true`, `[".rs"]`) and
/// kept as a plain string otherwise.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), ConfigError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidAssignment(raw.to_string()))?;

    let key = key.trim();
    if key.is_empty() || value.is_empty() {
        return Err(ConfigError::InvalidAssignment(raw.to_string()));
    }

    let parsed = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), parsed))
}

/// Resolve a dotted key.
pub fn get_value<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Assign `value` at a dotted key, creating intermediate objects as needed.
pub fn set_value(root: &mut Value, key: &str, value: Value) -> Result<(), ConfigError> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::KeyNotFound(key.to_string()));
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

    let mut node = root;
    for segment in parents {
        node = child_mut(node, segment, key)?;
    }

    match node {
        Value::Array(items) => {
            let slot = last
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
            *slot = value;
        }
        other => {
            ensure_object(other).insert((*last).to_string(), value);
        }
    }
    Ok(())
}

fn child_mut<'a>(
    node: &'a mut Value,
    segment: &str,
    key: &str,
) -> Result<&'a mut Value, ConfigError> {
    match node {
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get_mut(i))
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string())),
        other => Ok(ensure_object(other)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
    }
}

/// Replace non-object nodes with an empty object and return the map.
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::models::RawLabel;

/// Decode a label feed.
///
/// The service wraps the label array in an outer array; plain arrays from
/// local files are accepted too. Rows are decoded one at a time so a bad
/// row is reported by position.
fn decode_feed(value: Value) -> Result<Vec<RawLabel>> {
    let Value::Array(items) = value else {
        anyhow::bail!("Label feed must be a JSON array");
    };

    let rows = match items.first() {
        Some(Value::Array(_)) => match items.into_iter().next() {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        _ => items,
    };

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row)
                .with_context(|| format!("Failed to parse label feed row {}", index))
        })
        .collect()
}

/// Parse a label feed JSON file
pub fn parse_label_file(path: &Path) -> Result<Vec<RawLabel>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_label_json(&content)
}

/// Parse a label feed JSON string
pub fn parse_label_json(json: &str) -> Result<Vec<RawLabel>> {
    let value: Value = serde_json::from_str(json).context("Failed to parse label feed JSON")?;
    decode_feed(value)
}

/// Parse an already-decoded label feed, as returned by the HTTP client
pub fn parse_label_value(value: Value) -> Result<Vec<RawLabel>> {
    decode_feed(value)
}

//! JSON helpers: pretty output, fence stripping and export file names

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::error::AppResult;

/// Serialize with two-space indentation (the export file format)
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Strip a markdown code fence wrapped around model output.
///
/// Handles ```` ```json ```` and bare ```` ``` ```` fences; text without a
/// fence is only trimmed.
pub fn clean_json_string(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // drop the info string ("json", "JSON", ...) on the opening line
    let rest = match rest.find('\n') {
        Some(newline) if !rest[..newline].contains('{') && !rest[..newline].contains('[') => {
            &rest[newline + 1..]
        }
        _ => rest,
    };

    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
        .to_string()
}

/// File name for a single-prompt export: non-alphanumerics become `_`,
/// lowercased, `.json` appended.
pub fn export_file_name(prompt_name: &str) -> String {
    let sanitized: String = prompt_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.json", sanitized)
}

/// File name for a whole-collection export on the given day
pub fn collection_export_file_name(at: DateTime<Utc>) -> String {
    format!("prompt-builder-export-{}.json", at.format("%Y-%m-%d"))
}

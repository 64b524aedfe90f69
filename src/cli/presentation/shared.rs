//! Shared presentation helpers.

use crate::error::ApiError;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Render a path relative to `base` when it lies beneath it.
pub fn relative(path: &Path, base: &Path) -> String {
    crate::tree::path::display_relative(path, base)
}

/// Single-line JSON rendering, shortened for table cells.
pub fn compact_value(value: &serde_json::Value, max_len: usize) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= max_len {
        rendered
    } else {
        let truncated: String = rendered.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

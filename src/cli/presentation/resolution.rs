//! Scan, explain and apply presentation.

use super::shared::{compact_value, format_section_heading, relative, to_pretty_json};
use crate::engine::{Explanation, Resolution};
use crate::error::ApiError;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::{json, Value};
use std::path::Path;

const CELL_WIDTH: usize = 60;

pub fn format_resolution_text(resolution: &Resolution, base: &Path, show_values: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Resolved keys")));

    if resolution.entries.is_empty() {
        out.push_str("  No declarations found.\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        let mut header = vec!["Key", "Strategy", "Sources"];
        if show_values {
            header.push("Value");
        }
        table.set_header(header);
        for (key, resolved) in &resolution.entries {
            let sources = resolved
                .sources
                .iter()
                .map(|s| relative(s, base))
                .collect::<Vec<_>>()
                .join("\n");
            let mut row = vec![key.clone(), resolved.strategy.to_string(), sources];
            if show_values {
                row.push(compact_value(&resolved.value.to_value(), CELL_WIDTH));
            }
            table.add_row(row);
        }
        out.push_str(&format!("{}\n", table));
    }

    if !resolution.skipped.is_empty() {
        out.push_str(&format!(
            "\n{}\n",
            format_section_heading(&format!("Skipped files ({})", resolution.skipped.len()))
        ));
        for skipped in &resolution.skipped {
            out.push_str(&format!(
                "  - {}: {}\n",
                relative(&skipped.path, base),
                skipped.reason.dimmed()
            ));
        }
    }
    if resolution.pending_deferred > 0 {
        out.push_str(&format!(
            "\n{} deferred declaration(s) not realized (use --realize)\n",
            resolution.pending_deferred.yellow()
        ));
    }
    if !resolution.complete {
        out.push_str(&format!("\n{}\n", "Scan incomplete: result is partial".red()));
    }
    out.push_str(&format!("\nFingerprint: {}\n", resolution.fingerprint));
    out
}

pub fn format_resolution_json(resolution: &Resolution) -> Result<String, ApiError> {
    to_pretty_json(&json!({
        "values": resolution.values(),
        "provenance": resolution
            .entries
            .iter()
            .map(|(key, resolved)| {
                (
                    key.clone(),
                    json!({"strategy": resolved.strategy, "sources": resolved.sources}),
                )
            })
            .collect::<serde_json::Map<String, Value>>(),
        "skipped": resolution.skipped,
        "complete": resolution.complete,
        "pending_deferred": resolution.pending_deferred,
        "fingerprint": resolution.fingerprint,
    }))
}

pub fn format_explanation_text(explanation: &Explanation, base: &Path) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Key: {}", explanation.key))
    ));
    out.push_str(&format!(
        "  Strategy: {}\n\n",
        explanation.resolved.strategy.green()
    ));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Source", "Declared strategy", "Value"]);
    for (index, record) in explanation.contributions.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            relative(&record.source, base),
            record.strategy.clone().unwrap_or_else(|| "-".to_string()),
            compact_value(&record.value.to_value(), CELL_WIDTH),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));

    out.push_str(&format!("{}\n", format_section_heading("Result")));
    let rendered = serde_json::to_string_pretty(&explanation.resolved.value.to_value())
        .unwrap_or_else(|_| "null".to_string());
    out.push_str(&rendered);
    out.push('\n');
    out
}

pub fn format_explanation_json(explanation: &Explanation) -> Result<String, ApiError> {
    to_pretty_json(explanation)
}

pub fn format_apply_result(value: &Value) -> Result<String, ApiError> {
    to_pretty_json(value)
}

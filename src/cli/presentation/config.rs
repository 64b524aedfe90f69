//! Configuration presentation.

use super::shared::{format_section_heading, to_pretty_json};
use crate::config::{AccreteConfig, ValidationError};
use crate::error::ApiError;
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub fn format_config_show(config: &AccreteConfig, format: &str) -> Result<String, ApiError> {
    match format {
        "json" => to_pretty_json(config),
        _ => toml::to_string_pretty(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render TOML: {}", e))),
    }
}

pub fn format_config_validation(result: &Result<(), Vec<ValidationError>>) -> String {
    match result {
        Ok(()) => format!("{} configuration is valid", "ok:".green()),
        Err(errors) => {
            let mut out = format!(
                "{} {} problem(s)\n",
                "invalid:".red(),
                errors.len()
            );
            for error in errors {
                out.push_str(&format!("  - {}\n", error));
            }
            out
        }
    }
}

/// Configuration sources in increasing priority, with whether each exists.
pub fn format_config_paths(paths: &[(String, Option<PathBuf>)]) -> String {
    let mut out = format!("{}\n", format_section_heading("Configuration sources (lowest first)"));
    for (label, path) in paths {
        match path {
            Some(path) => {
                let marker = if path.is_file() { "found" } else { "absent" };
                out.push_str(&format!("  {:<12} {} ({})\n", label, path.display(), marker));
            }
            None => out.push_str(&format!("  {:<12} (unavailable)\n", label)),
        }
    }
    out
}

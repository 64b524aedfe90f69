//! CLI presentation: text and json formatters per command family.

mod config;
mod resolution;
mod shared;
mod tree;

pub use config::{format_config_paths, format_config_show, format_config_validation};
pub use resolution::{
    format_apply_result, format_explanation_json, format_explanation_text,
    format_resolution_json, format_resolution_text,
};
pub use shared::{format_section_heading, to_pretty_json};
pub use tree::{format_tree_json, format_tree_text};

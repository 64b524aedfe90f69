//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; a single route table dispatches to the engine.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, ScanArgs};
pub use presentation::{
    format_apply_result, format_config_paths, format_config_show, format_config_validation,
    format_explanation_json, format_explanation_text, format_resolution_json,
    format_resolution_text, format_section_heading, format_tree_json, format_tree_text,
    to_pretty_json,
};
pub use route::RunContext;

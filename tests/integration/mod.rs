//! Integration tests for discovery, merging and tree building

mod cli_commands;
mod deferred;
mod scan_merge;
mod tree_determinism;
mod tree_structure;

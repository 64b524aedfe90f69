//! Configuration sources, lowest priority first.

pub mod global_file;
pub mod workspace_file;

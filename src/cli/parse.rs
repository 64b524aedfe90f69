//! CLI parse: clap types for Accrete. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Accrete CLI - compose declarations scattered across a directory tree
#[derive(Parser, Debug)]
#[command(name = "accrete")]
#[command(about = "Discover declarations across a directory tree and merge them deterministically")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".", global = true)]
    pub workspace: PathBuf,

    /// Extra configuration file, layered above workspace configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable logging at debug level
    #[arg(long, default_value = "false", global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

/// Options shared by every command that scans declarations
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Roots to scan (default: the workspace root)
    #[arg(value_name = "ROOT")]
    pub roots: Vec<PathBuf>,

    /// Declaration attribute to extract (default from configuration)
    #[arg(long)]
    pub attribute: Option<String>,

    /// Extract files concurrently
    #[arg(long)]
    pub concurrent: bool,

    /// Realize deferred declarations with these JSON arguments
    #[arg(long, value_name = "JSON")]
    pub realize: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan roots and print every merged key
    Scan {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,

        /// Include the merged values in text output
        #[arg(long)]
        values: bool,
    },
    /// Show every contribution to one key and the merged result
    Explain {
        /// Dotted key to explain
        key: String,

        #[command(flatten)]
        scan: ScanArgs,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Invoke the merged callable for a key on a seed value
    Apply {
        /// Dotted key holding a callable
        key: String,

        #[command(flatten)]
        scan: ScanArgs,

        /// Seed argument as JSON
        #[arg(long, default_value = "{}")]
        seed: String,

        /// Context passed to builders, as JSON
        #[arg(long, default_value = "null")]
        context: String,
    },
    /// Build the attribute tree for a directory
    Tree {
        /// Directory to build (default: the workspace root)
        root: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Validate the effective configuration
    Validate,
    /// Print the configuration file locations in priority order
    Paths,
}

//! Error types for the Accrete declaration engine.
//!
//! Two disjoint classes exist. [`ExtractError`] describes a single file that
//! could not contribute; the scanner swallows it and moves on. Everything else
//! is an aggregate failure and reaches the caller with full source attribution.

use std::path::PathBuf;
use thiserror::Error;

/// Per-file extraction failure. Never escapes the scanner.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unexpected declaration shape in {path:?}: {message}")]
    Shape { path: PathBuf, message: String },

    #[error("Failed to realize deferred declaration {path:?}: {source}")]
    Realize {
        path: PathBuf,
        #[source]
        source: CallError,
    },
}

/// Fatal scanner errors (roots and directory listings, never individual files).
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan root does not exist: {0:?}")]
    MissingRoot(PathBuf),

    #[error("Failed to list directory {path:?}: {message}")]
    ListDirectory { path: PathBuf, message: String },

    #[error("Scan was cancelled after {visited} files; result is incomplete")]
    Incomplete { visited: usize },

    #[error("Concurrent extraction task failed: {0}")]
    Join(String),
}

/// Aggregate merge failures for one dotted key.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Strategy conflict for '{key}':{}", format_conflicts(.declared))]
    StrategyConflict {
        key: String,
        /// (source, declared strategy), sorted by source.
        declared: Vec<(PathBuf, String)>,
    },

    #[error("Type mismatch for '{key}' in {source_path:?}: expected {expected}, found {actual}")]
    TypeMismatch {
        key: String,
        source_path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Unknown strategy '{strategy}' for '{key}' in {source_path:?}")]
    UnknownStrategy {
        key: String,
        source_path: PathBuf,
        strategy: String,
    },

    #[error("No contributions for '{0}'")]
    Empty(String),
}

fn format_conflicts(declared: &[(PathBuf, String)]) -> String {
    declared
        .iter()
        .map(|(source, strategy)| format!("\n  - {} declares '{}'", source.display(), strategy))
        .collect()
}

/// Errors raised while invoking a callable.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Builder '{0}' did not produce a callable")]
    NotCallable(String),

    #[error("Function '{function}' failed: {message}")]
    Failed { function: String, message: String },

    #[error("Merged callable part returned {actual}, expected a mapping")]
    TypeMismatch { actual: String },

    #[error("Value under '{0}' is not callable")]
    NotInvocable(String),
}

/// Tree builder failures.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Attribute '{name}' is defined by more than one source:{}", format_sources(.sources))]
    Collision { name: String, sources: Vec<PathBuf> },

    #[error("Failed to import {0}")]
    Import(#[from] ExtractError),

    #[error("Failed to compose '{name}': {source}")]
    Merge {
        name: String,
        #[source]
        source: MergeError,
    },

    #[error(transparent)]
    Scan(#[from] ScanError),
}

fn format_sources(sources: &[PathBuf]) -> String {
    sources
        .iter()
        .map(|source| format!("\n  - {}", source.display()))
        .collect()
}

/// Top-level API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

//! Configuration System
//!
//! Layered configuration: built-in defaults, the global file, workspace files
//! and `ACCRETE__SECTION__KEY` environment variables, in increasing priority.
//! Every section validates itself; [`AccreteConfig::validate`] reports all
//! problems at once.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::merge::MergeConfig;
use crate::tree::classify::NamingConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccreteConfig {
    /// File and directory naming conventions
    #[serde(default)]
    pub naming: NamingConfig,

    /// Scanner settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// Merge strategy settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[scan]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Attribute extracted from every declaration file
    #[serde(default = "default_attribute")]
    pub attribute: String,

    /// Extract files concurrently
    #[serde(default)]
    pub concurrent: bool,

    /// Upper bound on concurrent extractions
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_attribute() -> String {
    "exports".to_string()
}

fn default_max_in_flight() -> usize {
    16
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            attribute: default_attribute(),
            concurrent: false,
            max_in_flight: default_max_in_flight(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.attribute.is_empty() {
            return Err("Declaration attribute cannot be empty".to_string());
        }
        if self.max_in_flight == 0 {
            return Err("max_in_flight must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Naming(String),
    Scan(String),
    Merge(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Naming(msg) => write!(f, "Naming: {}", msg),
            ValidationError::Scan(msg) => write!(f, "Scan: {}", msg),
            ValidationError::Merge(msg) => write!(f, "Merge: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl AccreteConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.naming.validate() {
            errors.push(ValidationError::Naming(e));
        }
        if let Err(e) = self.scan.validate() {
            errors.push(ValidationError::Scan(e));
        }
        if let Err(messages) = self.merge.validate() {
            errors.extend(messages.into_iter().map(ValidationError::Merge));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one [`ApiError::ConfigError`].
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}

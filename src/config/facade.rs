//! Loading entry point for layered configuration.

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::AccreteConfig;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`AccreteConfig`] from all sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load for `workspace_root`: defaults, global file, workspace files,
    /// then environment variables.
    pub fn load(workspace_root: &Path) -> Result<AccreteConfig, ConfigError> {
        Self::load_with_override(workspace_root, None)
    }

    /// Like [`ConfigLoader::load`], with an explicit file layered above the
    /// workspace files and below the environment.
    pub fn load_with_override(
        workspace_root: &Path,
        explicit: Option<&Path>,
    ) -> Result<AccreteConfig, ConfigError> {
        let mut builder = builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;
        builder = workspace_file::add_to_builder(builder, workspace_root)?;
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix("ACCRETE").separator("__"));

        let config: AccreteConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load a single file on top of the defaults, ignoring other sources.
    pub fn load_from_file(path: &Path) -> Result<AccreteConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    /// Path of the global configuration file.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Built-in defaults only.
    pub fn default() -> AccreteConfig {
        AccreteConfig::default()
    }
}

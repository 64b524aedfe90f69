//! CLI route: single route table and run context. Dispatches to the engine and presentation.

use crate::cli::command_name;
use crate::cli::parse::{Commands, ConfigCommands, ScanArgs};
use crate::cli::presentation::{
    format_apply_result, format_config_paths, format_config_show, format_config_validation,
    format_explanation_json, format_explanation_text, format_resolution_json,
    format_resolution_text, format_tree_json, format_tree_text,
};
use crate::config::{AccreteConfig, ConfigLoader};
use crate::engine::{Discovery, Engine};
use crate::error::ApiError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, info_span};

/// Runtime context for CLI execution: workspace, config and the configured engine.
pub struct RunContext {
    engine: Engine,
    config: AccreteConfig,
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl RunContext {
    /// Create run context from workspace root and optional extra config file.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        if !workspace_root.is_dir() {
            return Err(ApiError::ConfigError(format!(
                "Workspace root is not a directory: {}",
                workspace_root.display()
            )));
        }
        let config = ConfigLoader::load_with_override(&workspace_root, config_path.as_deref())?;
        Self::with_config(workspace_root, config_path, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn with_config(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        config: AccreteConfig,
    ) -> Result<Self, ApiError> {
        let workspace_root = dunce::canonicalize(&workspace_root).unwrap_or(workspace_root);
        let engine = Engine::from_config(&config)?;
        Ok(Self {
            engine,
            config,
            workspace_root,
            config_path,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let name = command_name(command);
        let _span = info_span!("command", name = %name).entered();
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis(),
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Scan {
                scan,
                format,
                values,
            } => {
                let engine = self.engine_for(scan);
                let discovery = self.discover(&engine, scan)?;
                let resolution = engine.resolve(&discovery)?;
                match format.as_str() {
                    "json" => format_resolution_json(&resolution),
                    _ => Ok(format_resolution_text(
                        &resolution,
                        &self.workspace_root,
                        *values,
                    )),
                }
            }
            Commands::Explain { key, scan, format } => {
                let engine = self.engine_for(scan);
                let discovery = self.discover(&engine, scan)?;
                let explanation = engine.explain(&discovery, key)?;
                match format.as_str() {
                    "json" => format_explanation_json(&explanation),
                    _ => Ok(format_explanation_text(&explanation, &self.workspace_root)),
                }
            }
            Commands::Apply {
                key,
                scan,
                seed,
                context,
            } => {
                let engine = self.engine_for(scan);
                let discovery = self.discover(&engine, scan)?;
                let resolution = engine.resolve(&discovery)?;
                let seed = parse_json("--seed", seed)?;
                let context = parse_json("--context", context)?;
                let result = engine.apply(&resolution, key, seed, &context)?;
                format_apply_result(&result)
            }
            Commands::Tree { root, format } => {
                let root = root
                    .as_ref()
                    .map(|r| self.resolve_path(r))
                    .unwrap_or_else(|| self.workspace_root.clone());
                let tree = self.engine.build_tree(&root)?;
                match format.as_str() {
                    "text" => Ok(format_tree_text(&tree)),
                    _ => format_tree_json(&tree),
                }
            }
            Commands::Config { command } => self.execute_config(command),
        }
    }

    fn execute_config(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Show { format } => format_config_show(&self.config, format),
            ConfigCommands::Validate => Ok(format_config_validation(&self.config.validate())),
            ConfigCommands::Paths => {
                let workspace_dir = self.workspace_root.join(".accrete");
                let mut paths = vec![
                    ("global".to_string(), ConfigLoader::global_config_path()),
                    (
                        "workspace".to_string(),
                        Some(workspace_dir.join("config.toml")),
                    ),
                ];
                if let Ok(env_name) = std::env::var("ACCRETE_ENV") {
                    paths.push((
                        format!("env:{}", env_name),
                        Some(workspace_dir.join(format!("{}.toml", env_name))),
                    ));
                }
                if let Some(path) = &self.config_path {
                    paths.push(("--config".to_string(), Some(path.clone())));
                }
                Ok(format_config_paths(&paths))
            }
        }
    }

    fn engine_for(&self, scan: &ScanArgs) -> Engine {
        match &scan.attribute {
            Some(attribute) => self.engine.clone().with_attribute(attribute.clone()),
            None => self.engine.clone(),
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    fn discover(&self, engine: &Engine, scan: &ScanArgs) -> Result<Discovery, ApiError> {
        let roots: Vec<PathBuf> = if scan.roots.is_empty() {
            vec![self.workspace_root.clone()]
        } else {
            scan.roots.iter().map(|r| self.resolve_path(r)).collect()
        };

        let discovery = if scan.concurrent || engine.prefers_concurrent() {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(engine.discover_concurrent(&roots))?
        } else {
            engine.discover(&roots)?
        };

        match &scan.realize {
            Some(args) => Ok(engine.realize(discovery, &parse_json("--realize", args)?)),
            None => Ok(discovery),
        }
    }
}

fn parse_json(flag: &str, text: &str) -> Result<Value, ApiError> {
    serde_json::from_str(text)
        .map_err(|e| ApiError::ConfigError(format!("Invalid JSON for {}: {}", flag, e)))
}

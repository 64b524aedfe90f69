//! Merge Engine
//!
//! Resolves the effective strategy for one dotted key and folds every
//! contribution into a single value. Records are always combined in
//! source-sorted order so concurrency never changes the result.

pub mod deep;
pub mod shell;

use crate::declaration::Declared;
use crate::error::MergeError;
use crate::function::{Callable, MergeMode};
use crate::merge::deep::{describe, merge_value};
use crate::merge::shell::{shell_merge, ShellFields};
use crate::store::ContributionRecord;
use crate::tree::path::compare_sources;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Named merge algorithm applied to every contribution sharing a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Override,
    Merge,
    ListAppend,
    ShellMerge,
    #[serde(alias = "compose")]
    Pipe,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Override,
        Strategy::Merge,
        Strategy::ListAppend,
        Strategy::ShellMerge,
        Strategy::Pipe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Override => "override",
            Strategy::Merge => "merge",
            Strategy::ListAppend => "list-append",
            Strategy::ShellMerge => "shell-merge",
            Strategy::Pipe => "pipe",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "override" => Ok(Strategy::Override),
            "merge" => Ok(Strategy::Merge),
            "list-append" => Ok(Strategy::ListAppend),
            "shell-merge" => Ok(Strategy::ShellMerge),
            "pipe" | "compose" => Ok(Strategy::Pipe),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

/// Strategy used when no contributor names one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultStrategy {
    /// `merge` with several contributors, `override` with one
    #[default]
    Auto,
    Fixed(Strategy),
}

impl FromStr for DefaultStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(DefaultStrategy::Auto),
            other => other.parse().map(DefaultStrategy::Fixed),
        }
    }
}

impl fmt::Display for DefaultStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultStrategy::Auto => f.write_str("auto"),
            DefaultStrategy::Fixed(strategy) => write!(f, "{}", strategy),
        }
    }
}

/// `[merge]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// `auto` or an explicit strategy name
    pub default_strategy: String,
    pub shell: ShellFields,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            default_strategy: "auto".to_string(),
            shell: ShellFields::default(),
        }
    }
}

impl MergeConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Err(e) = self.default_strategy.parse::<DefaultStrategy>() {
            errors.push(format!("merge.default_strategy: {}", e));
        }
        if self.shell.hook_field.is_empty() {
            errors.push("merge.shell.hook_field cannot be empty".to_string());
        }
        if self.shell.list_fields.iter().any(|f| *f == self.shell.hook_field) {
            errors.push(format!(
                "merge.shell.hook_field '{}' is also listed in merge.shell.list_fields",
                self.shell.hook_field
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Merged value for one key with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    pub key: String,
    pub value: Declared,
    pub strategy: Strategy,
    /// Contributing sources in combination order
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    default: DefaultStrategy,
    shell: ShellFields,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, default: DefaultStrategy) -> Self {
        self.default = default;
        self
    }

    pub fn with_shell_fields(mut self, shell: ShellFields) -> Self {
        self.shell = shell;
        self
    }

    /// Build from configuration; the config must already be validated.
    pub fn from_config(config: &MergeConfig) -> Result<Self, String> {
        let default = config.default_strategy.parse::<DefaultStrategy>()?;
        Ok(Self::new()
            .with_default(default)
            .with_shell_fields(config.shell.clone()))
    }

    pub fn default_strategy(&self) -> DefaultStrategy {
        self.default
    }

    pub fn shell_fields(&self) -> &ShellFields {
        &self.shell
    }

    /// Merge every record for `key`, sorted by source path.
    #[instrument(skip(self, records), fields(contributors = records.len()))]
    pub fn resolve(&self, key: &str, records: &[ContributionRecord]) -> Result<Resolved, MergeError> {
        if records.is_empty() {
            return Err(MergeError::Empty(key.to_string()));
        }
        let mut ordered: Vec<&ContributionRecord> = records.iter().collect();
        ordered.sort_by(|a, b| compare_sources(&a.source, &b.source));

        let strategy = self.effective_strategy(key, &ordered)?;
        let value = self.combine(key, strategy, &ordered)?;
        debug!(key, strategy = %strategy, "Resolved key");

        Ok(Resolved {
            key: key.to_string(),
            value,
            strategy,
            sources: ordered.iter().map(|r| r.source.clone()).collect(),
        })
    }

    /// Pick the strategy for already ordered records.
    ///
    /// Every explicit strategy must agree; otherwise the configured default
    /// applies.
    pub fn effective_strategy(
        &self,
        key: &str,
        records: &[&ContributionRecord],
    ) -> Result<Strategy, MergeError> {
        let mut explicit: Vec<(&ContributionRecord, &str, Strategy)> = Vec::new();
        for record in records {
            let Some(name) = record.strategy.as_deref() else {
                continue;
            };
            let strategy = name
                .parse::<Strategy>()
                .map_err(|_| MergeError::UnknownStrategy {
                    key: key.to_string(),
                    source_path: record.source.clone(),
                    strategy: name.to_string(),
                })?;
            explicit.push((record, name, strategy));
        }

        if let Some((_, _, first)) = explicit.first() {
            if explicit.iter().any(|(_, _, s)| s != first) {
                let mut declared: Vec<(PathBuf, String)> = explicit
                    .iter()
                    .map(|(record, name, _)| (record.source.clone(), name.to_string()))
                    .collect();
                declared.sort_by(|a, b| compare_sources(&a.0, &b.0).then_with(|| a.1.cmp(&b.1)));
                return Err(MergeError::StrategyConflict {
                    key: key.to_string(),
                    declared,
                });
            }
            return Ok(*first);
        }

        Ok(match self.default {
            DefaultStrategy::Fixed(strategy) => strategy,
            DefaultStrategy::Auto if records.len() > 1 => Strategy::Merge,
            DefaultStrategy::Auto => Strategy::Override,
        })
    }

    /// Fold records with `strategy` in the order given. Does not sort.
    pub fn combine(
        &self,
        key: &str,
        strategy: Strategy,
        records: &[&ContributionRecord],
    ) -> Result<Declared, MergeError> {
        let Some(last) = records.last() else {
            return Err(MergeError::Empty(key.to_string()));
        };

        match strategy {
            Strategy::Override => Ok(last.value.clone()),
            Strategy::Merge => self.combine_mappings(key, records, MergeMode::Deep, |values| {
                let mut acc = Value::Object(Map::new());
                for value in values {
                    merge_value(&mut acc, value);
                }
                acc
            }),
            Strategy::ShellMerge => {
                let mode = MergeMode::Shell(self.shell.clone());
                self.combine_mappings(key, records, mode, |values| {
                    shell_merge(&self.shell, values)
                })
            }
            Strategy::ListAppend => {
                let mut items = Vec::new();
                for record in records {
                    match &record.value {
                        Declared::Value(Value::Array(values)) => items.extend(values.iter().cloned()),
                        other => return Err(mismatch(key, record, "sequence", other)),
                    }
                }
                Ok(Declared::Value(Value::Array(items)))
            }
            Strategy::Pipe => {
                let mut stages = Vec::with_capacity(records.len());
                for record in records {
                    match &record.value {
                        Declared::Callable(callable) => stages.push(callable.clone()),
                        other => return Err(mismatch(key, record, "callable", other)),
                    }
                }
                Ok(Declared::Callable(Callable::Pipe { stages }))
            }
        }
    }

    /// Shared precondition for `merge` and `shell-merge`: all mappings are
    /// folded with `fold`, all callables become a merged callable.
    fn combine_mappings<F>(
        &self,
        key: &str,
        records: &[&ContributionRecord],
        mode: MergeMode,
        fold: F,
    ) -> Result<Declared, MergeError>
    where
        F: FnOnce(Vec<Value>) -> Value,
    {
        let callables = matches!(records.first().map(|r| &r.value), Some(Declared::Callable(_)));

        if callables {
            let mut parts = Vec::with_capacity(records.len());
            for record in records {
                match &record.value {
                    Declared::Callable(callable) => parts.push(callable.clone()),
                    other => return Err(mismatch(key, record, "callable", other)),
                }
            }
            return Ok(Declared::Callable(Callable::Merged { parts, mode }));
        }

        let mut values = Vec::with_capacity(records.len());
        for record in records {
            match &record.value {
                Declared::Value(value @ Value::Object(map)) => {
                    if let MergeMode::Shell(fields) = &mode {
                        check_list_fields(key, record, fields, map)?;
                    }
                    values.push(value.clone());
                }
                other => return Err(mismatch(key, record, "mapping", other)),
            }
        }
        Ok(Declared::Value(fold(values)))
    }
}

/// Designated list fields of a shell definition must be sequences.
fn check_list_fields(
    key: &str,
    record: &ContributionRecord,
    fields: &ShellFields,
    map: &Map<String, Value>,
) -> Result<(), MergeError> {
    for field in &fields.list_fields {
        match map.get(field) {
            None | Some(Value::Array(_)) => {}
            Some(other) => {
                return Err(MergeError::TypeMismatch {
                    key: format!("{}.{}", key, field),
                    source_path: record.source.clone(),
                    expected: "sequence".to_string(),
                    actual: describe(other).to_string(),
                })
            }
        }
    }
    Ok(())
}

fn mismatch(key: &str, record: &ContributionRecord, expected: &str, actual: &Declared) -> MergeError {
    MergeError::TypeMismatch {
        key: key.to_string(),
        source_path: record.source.clone(),
        expected: expected.to_string(),
        actual: actual.describe().to_string(),
    }
}

//! Path classification shared by the scanner and the tree builder.
//!
//! Every naming rule (hidden entries, declaration extensions, fragment
//! directories, entry points, escaped attribute names) lives here so the two
//! algorithms cannot disagree about what a name means.

use crate::tree::path::normalize_name;
use crate::tree::walker::Entry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Naming conventions, loaded from the `[naming]` config section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Names starting with any of these prefixes are skipped entirely
    #[serde(default = "default_hidden_prefixes")]
    pub hidden_prefixes: Vec<String>,

    /// Directory suffix that marks a fragment directory
    #[serde(default = "default_fragment_suffix")]
    pub fragment_suffix: String,

    /// Trailing marker stripped from attribute names (`let_` becomes `let`)
    #[serde(default = "default_escape_suffix")]
    pub escape_suffix: String,

    /// Extensions of declaration-bearing files, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Entry-point file names in order of preference
    #[serde(default = "default_entry_points")]
    pub entry_points: Vec<String>,
}

fn default_hidden_prefixes() -> Vec<String> {
    vec!["_".to_string(), ".".to_string()]
}

fn default_fragment_suffix() -> String {
    ".d".to_string()
}

fn default_escape_suffix() -> String {
    "_".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["toml".to_string(), "json".to_string()]
}

fn default_entry_points() -> Vec<String> {
    vec!["default.toml".to_string(), "default.json".to_string()]
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            hidden_prefixes: default_hidden_prefixes(),
            fragment_suffix: default_fragment_suffix(),
            escape_suffix: default_escape_suffix(),
            extensions: default_extensions(),
            entry_points: default_entry_points(),
        }
    }
}

impl NamingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.extensions.is_empty() {
            return Err("At least one declaration extension is required".to_string());
        }
        if self.extensions.iter().any(|e| e.is_empty() || e.starts_with('.')) {
            return Err("Extensions must be non-empty and given without a leading dot".to_string());
        }
        if self.fragment_suffix.is_empty() {
            return Err("Fragment suffix cannot be empty".to_string());
        }
        if self.hidden_prefixes.iter().any(String::is_empty) {
            return Err("Hidden prefixes cannot be empty strings".to_string());
        }
        Ok(())
    }
}

/// How a directory entry participates in scanning and tree building
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryClass {
    /// Excluded by a hidden prefix
    Hidden,
    /// A regular file with a declaration extension
    Declaration,
    /// A regular file that carries no declarations
    Ignored,
    /// A directory with an entry-point file; treated as one unit
    LeafModule { entry: PathBuf },
    /// A directory whose children compose into one value
    Fragment,
    /// A plain directory to recurse into
    Directory,
}

/// Centralized naming rules, injected into both the scanner and the tree builder
#[derive(Debug, Clone, Default)]
pub struct PathClassifier {
    config: NamingConfig,
}

impl PathClassifier {
    pub fn new(config: NamingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NamingConfig {
        &self.config
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.config
            .hidden_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Extension of a declaration file name, if it carries a recognized one.
    pub fn declaration_extension<'a>(&self, name: &'a str) -> Option<&'a str> {
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        self.config
            .extensions
            .iter()
            .any(|known| known == ext)
            .then_some(ext)
    }

    pub fn is_declaration_file(&self, name: &str) -> bool {
        self.declaration_extension(name).is_some()
    }

    pub fn is_fragment_dir(&self, name: &str) -> bool {
        name.len() > self.config.fragment_suffix.len()
            && name.ends_with(self.config.fragment_suffix.as_str())
    }

    /// The entry-point file of `dir`, preferring earlier configured names.
    pub fn entry_point(&self, dir: &Path) -> Option<PathBuf> {
        self.config
            .entry_points
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| {
                std::fs::metadata(candidate)
                    .map(|m| m.is_file())
                    .unwrap_or(false)
            })
    }

    /// Classify one listed entry.
    pub fn classify(&self, entry: &Entry) -> EntryClass {
        let name = entry.name();
        if self.is_hidden(name) {
            return EntryClass::Hidden;
        }
        match entry {
            Entry::File { .. } if self.is_declaration_file(name) => EntryClass::Declaration,
            Entry::File { .. } => EntryClass::Ignored,
            Entry::Directory { .. } if self.is_fragment_dir(name) => EntryClass::Fragment,
            Entry::Directory { path, .. } => match self.entry_point(path) {
                Some(entry) => EntryClass::LeafModule { entry },
                None => EntryClass::Directory,
            },
        }
    }

    /// Derive the attribute name for an entry.
    ///
    /// Strips the declaration extension (files) or the fragment suffix
    /// (directories), then one trailing escape marker.
    pub fn attribute_name(&self, entry: &Entry) -> String {
        let name = entry.name();
        let base = match entry {
            Entry::File { .. } => match self.declaration_extension(name) {
                Some(ext) => &name[..name.len() - ext.len() - 1],
                None => name,
            },
            Entry::Directory { .. } => name
                .strip_suffix(self.config.fragment_suffix.as_str())
                .filter(|stripped| !stripped.is_empty())
                .unwrap_or(name),
        };
        let base = if self.config.escape_suffix.is_empty() {
            base
        } else {
            base.strip_suffix(self.config.escape_suffix.as_str())
                .filter(|stripped| !stripped.is_empty())
                .unwrap_or(base)
        };
        normalize_name(base)
    }
}

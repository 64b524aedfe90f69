//! Directory listing for the scanner and tree builder

use crate::error::ScanError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filesystem entry types, with symlinks already resolved to their target type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A regular file (or a symlink to one)
    File { path: PathBuf, name: String },
    /// A directory (or a symlink to one)
    Directory { path: PathBuf, name: String },
}

impl Entry {
    pub fn path(&self) -> &Path {
        match self {
            Entry::File { path, .. } | Entry::Directory { path, .. } => path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entry::File { name, .. } | Entry::Directory { name, .. } => name,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory { .. })
    }
}

/// List the immediate children of `dir`, sorted by name.
///
/// Symlinks are followed so callers classify the target type. Dangling links
/// and entries that are neither files nor directories are dropped.
pub fn list_dir(dir: &Path) -> Result<Vec<Entry>, ScanError> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut entries = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ScanError::ListDirectory {
                    path: dir.to_path_buf(),
                    message: e.to_string(),
                });
            }
            Err(e) => {
                // Dangling symlink or a child that vanished mid-listing
                tracing::debug!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path().to_path_buf();
        let file_type = entry.file_type();
        if file_type.is_file() {
            entries.push(Entry::File { path, name });
        } else if file_type.is_dir() {
            entries.push(Entry::Directory { path, name });
        }
    }

    Ok(entries)
}

/// Resolve a root path into an entry, following symlinks.
pub fn root_entry(root: &Path) -> Result<Entry, ScanError> {
    let metadata =
        std::fs::metadata(root).map_err(|_| ScanError::MissingRoot(root.to_path_buf()))?;
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if metadata.is_dir() {
        Ok(Entry::Directory {
            path: root.to_path_buf(),
            name,
        })
    } else {
        Ok(Entry::File {
            path: root.to_path_buf(),
            name,
        })
    }
}

//! Path canonicalization and attribute-name normalization utilities

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a directory path for cycle detection.
///
/// Falls back to the path as given when canonicalization fails, so an
/// unreadable directory is reported by the listing step rather than here.
pub fn canonical_dir(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Normalize a derived attribute name.
///
/// Unicode is normalized to NFC so that `café` spelled with a combining
/// accent and with a precomposed character produce the same attribute.
pub fn normalize_name(name: &str) -> String {
    name.nfc().collect()
}

/// Order source paths as whole strings rather than component by component,
/// so `mod-a.toml` sorts before `mod/x.toml`.
pub fn compare_sources(a: &Path, b: &Path) -> Ordering {
    a.as_os_str().cmp(b.as_os_str())
}

/// Render a source path relative to `base` when possible.
pub fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

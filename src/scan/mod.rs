//! Scanner
//!
//! Generic recursive walker. It applies the [`PathClassifier`] to one or more
//! roots, calls `extract` on every declaration-bearing file in a stable order
//! and folds the results with `accumulate`. It knows nothing about merging.

pub mod concurrent;

use crate::error::{ExtractError, ScanError};
use crate::tree::classify::{EntryClass, PathClassifier};
use crate::tree::path::canonical_dir;
use crate::tree::walker::{list_dir, root_entry, Entry};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Shared cancellation signal, checked between directories and files
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A file that contributed nothing because extraction failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

impl SkippedFile {
    fn from_error(path: &Path, error: &ExtractError) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: error.to_string(),
        }
    }
}

/// Result of a scan: the accumulated state plus diagnostics
#[derive(Debug, Clone)]
pub struct ScanOutcome<S> {
    pub state: S,
    /// Files whose extraction failed. Informational only.
    pub skipped: Vec<SkippedFile>,
    /// Files handed to `extract`
    pub visited: usize,
    /// False when the scan was cancelled before finishing
    pub complete: bool,
}

impl<S> ScanOutcome<S> {
    /// The state, or [`ScanError::Incomplete`] for a cancelled scan.
    pub fn into_complete(self) -> Result<S, ScanError> {
        if self.complete {
            Ok(self.state)
        } else {
            Err(ScanError::Incomplete {
                visited: self.visited,
            })
        }
    }
}

/// Ordered declaration-bearing files under a set of roots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub files: Vec<PathBuf>,
    pub complete: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Scanner {
    classifier: PathClassifier,
    cancel: Option<CancelFlag>,
}

impl Scanner {
    pub fn new(classifier: PathClassifier) -> Self {
        Self {
            classifier,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn classifier(&self) -> &PathClassifier {
        &self.classifier
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// Collect declaration-bearing files: roots in the order given, each
    /// walked depth-first in name order.
    ///
    /// A root that is a file is its own candidate. A directory with an entry
    /// point contributes only that file and is not descended into.
    #[instrument(skip(self, roots))]
    pub fn candidates<P: AsRef<Path>>(&self, roots: &[P]) -> Result<Candidates, ScanError> {
        let mut files = Vec::new();
        let mut ancestors = HashSet::new();

        for root in roots {
            let root = root.as_ref();
            if self.cancelled() {
                return Ok(Candidates {
                    files,
                    complete: false,
                });
            }
            match root_entry(root)? {
                Entry::File { path, .. } => files.push(path),
                Entry::Directory { path, .. } => match self.classifier.entry_point(&path) {
                    Some(entry) => files.push(entry),
                    None => {
                        if !self.walk_dir(&path, &mut files, &mut ancestors)? {
                            return Ok(Candidates {
                                files,
                                complete: false,
                            });
                        }
                    }
                },
            }
        }

        Ok(Candidates {
            files,
            complete: true,
        })
    }

    /// Returns `false` when cancelled part way.
    ///
    /// `ancestors` holds the canonical directories on the current descent
    /// path only, so a directory reached twice through unrelated paths is
    /// walked both times.
    fn walk_dir(
        &self,
        dir: &Path,
        files: &mut Vec<PathBuf>,
        ancestors: &mut HashSet<PathBuf>,
    ) -> Result<bool, ScanError> {
        if self.cancelled() {
            return Ok(false);
        }
        let canonical = canonical_dir(dir);
        if !ancestors.insert(canonical.clone()) {
            warn!(dir = %dir.display(), "Directory is its own ancestor, skipping symlink cycle");
            return Ok(true);
        }
        let walked = self.walk_children(dir, files, ancestors);
        ancestors.remove(&canonical);
        walked
    }

    fn walk_children(
        &self,
        dir: &Path,
        files: &mut Vec<PathBuf>,
        ancestors: &mut HashSet<PathBuf>,
    ) -> Result<bool, ScanError> {
        for entry in list_dir(dir)? {
            match self.classifier.classify(&entry) {
                EntryClass::Hidden | EntryClass::Ignored => {}
                EntryClass::Declaration => files.push(entry.path().to_path_buf()),
                EntryClass::LeafModule { entry } => files.push(entry),
                EntryClass::Fragment | EntryClass::Directory => {
                    // Fragment directories have no special meaning to the scanner
                    let path = entry.path();
                    let keep_going = match self.classifier.entry_point(path) {
                        Some(entry_point) => {
                            files.push(entry_point);
                            true
                        }
                        None => self.walk_dir(path, files, ancestors)?,
                    };
                    if !keep_going {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    /// Walk `roots`, extracting and accumulating every candidate in order.
    ///
    /// `extract` returning `Ok(None)` means the file carries no declaration;
    /// an `Err` is recorded in [`ScanOutcome::skipped`] and the scan moves on.
    #[instrument(skip(self, roots, extract, accumulate, initial))]
    pub fn scan<P, T, S, E, A>(
        &self,
        roots: &[P],
        mut extract: E,
        mut accumulate: A,
        initial: S,
    ) -> Result<ScanOutcome<S>, ScanError>
    where
        P: AsRef<Path>,
        E: FnMut(&Path) -> Result<Option<T>, ExtractError>,
        A: FnMut(S, &Path, T) -> S,
    {
        let start = Instant::now();
        let candidates = self.candidates(roots)?;
        let mut complete = candidates.complete;

        let mut state = initial;
        let mut skipped = Vec::new();
        let mut visited = 0;

        for path in &candidates.files {
            if self.cancelled() {
                complete = false;
                break;
            }
            visited += 1;
            match extract(path) {
                Ok(Some(value)) => state = accumulate(state, path, value),
                Ok(None) => debug!(path = %path.display(), "No declaration"),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping file");
                    skipped.push(SkippedFile::from_error(path, &e));
                }
            }
        }

        info!(
            visited,
            skipped = skipped.len(),
            complete,
            duration_ms = start.elapsed().as_millis(),
            "Scan finished"
        );

        Ok(ScanOutcome {
            state,
            skipped,
            visited,
            complete,
        })
    }
}

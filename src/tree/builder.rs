//! Tree builder: turns a directory into a nested attribute tree
//!
//! File and directory names become attribute names. A fragment directory
//! composes its children with the `merge` strategy and layers the result on
//! top of a same-named base entry. Two base entries that normalize to the
//! same name are a collision.

use crate::declaration::{read_document, Declared};
use crate::error::TreeError;
use crate::merge::{MergeEngine, Strategy};
use crate::store::ContributionRecord;
use crate::tree::classify::{EntryClass, PathClassifier};
use crate::tree::node::TreeNode;
use crate::tree::path::{canonical_dir, compare_sources};
use crate::tree::walker::{list_dir, root_entry, Entry};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A non-fragment source for one attribute
#[derive(Debug, Clone)]
enum BaseSource {
    /// A declaration file, or the entry point of a leaf module
    Import { source: PathBuf, file: PathBuf },
    /// A plain subdirectory to recurse into
    Subtree(PathBuf),
}

impl BaseSource {
    fn source(&self) -> &Path {
        match self {
            BaseSource::Import { source, .. } => source,
            BaseSource::Subtree(dir) => dir,
        }
    }
}

#[derive(Debug, Default)]
struct AttributeSources {
    bases: Vec<BaseSource>,
    fragments: Vec<PathBuf>,
}

/// Builds attribute trees from directories
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    classifier: PathClassifier,
    merge: MergeEngine,
}

impl TreeBuilder {
    pub fn new(classifier: PathClassifier) -> Self {
        Self {
            classifier,
            merge: MergeEngine::default(),
        }
    }

    pub fn with_merge_engine(mut self, merge: MergeEngine) -> Self {
        self.merge = merge;
        self
    }

    /// Build the tree rooted at `root`.
    ///
    /// A root file or leaf-module root yields a leaf; a plain directory
    /// yields a branch.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn build(&self, root: &Path) -> Result<TreeNode, TreeError> {
        let start = Instant::now();
        let node = match root_entry(root)? {
            Entry::File { path, .. } => TreeNode::Leaf(self.import(&path)?),
            Entry::Directory { path, .. } => match self.classifier.entry_point(&path) {
                Some(entry) => TreeNode::Leaf(self.import(&entry)?),
                None => {
                    let mut ancestors = HashSet::new();
                    TreeNode::Branch(self.build_dir(&path, &mut ancestors)?)
                }
            },
        };

        info!(
            leaves = node.leaf_count(),
            duration_ms = start.elapsed().as_millis(),
            "Tree build completed"
        );
        Ok(node)
    }

    /// Build one directory level. `ancestors` holds the canonical
    /// directories on the current descent path; only those are refused.
    fn build_dir(
        &self,
        dir: &Path,
        ancestors: &mut HashSet<PathBuf>,
    ) -> Result<BTreeMap<String, TreeNode>, TreeError> {
        let canonical = canonical_dir(dir);
        if !ancestors.insert(canonical.clone()) {
            warn!(dir = %dir.display(), "Directory is its own ancestor, skipping symlink cycle");
            return Ok(BTreeMap::new());
        }
        let built = self.build_children(dir, ancestors);
        ancestors.remove(&canonical);
        built
    }

    fn build_children(
        &self,
        dir: &Path,
        ancestors: &mut HashSet<PathBuf>,
    ) -> Result<BTreeMap<String, TreeNode>, TreeError> {
        let mut attributes: BTreeMap<String, AttributeSources> = BTreeMap::new();
        for entry in list_dir(dir)? {
            let class = self.classifier.classify(&entry);
            let slot = match class {
                EntryClass::Hidden | EntryClass::Ignored => continue,
                _ => attributes
                    .entry(self.classifier.attribute_name(&entry))
                    .or_default(),
            };
            match class {
                EntryClass::Declaration => slot.bases.push(BaseSource::Import {
                    source: entry.path().to_path_buf(),
                    file: entry.path().to_path_buf(),
                }),
                EntryClass::LeafModule { entry: file } => slot.bases.push(BaseSource::Import {
                    source: entry.path().to_path_buf(),
                    file,
                }),
                EntryClass::Directory => {
                    slot.bases.push(BaseSource::Subtree(entry.path().to_path_buf()))
                }
                EntryClass::Fragment => slot.fragments.push(entry.path().to_path_buf()),
                EntryClass::Hidden | EntryClass::Ignored => {}
            }
        }

        let mut children = BTreeMap::new();
        for (name, sources) in attributes {
            if sources.bases.len() > 1 {
                return Err(collision(&name, sources.bases.iter().map(|b| b.source())));
            }
            if sources.fragments.len() > 1 {
                return Err(collision(&name, sources.fragments.iter().map(PathBuf::as_path)));
            }

            let base = match sources.bases.first() {
                Some(BaseSource::Import { source, file }) => {
                    Some((source.clone(), TreeNode::Leaf(self.import(file)?)))
                }
                Some(BaseSource::Subtree(path)) => {
                    Some((path.clone(), TreeNode::Branch(self.build_dir(path, ancestors)?)))
                }
                None => None,
            };
            let fragment = match sources.fragments.first() {
                Some(path) => self
                    .fold_fragments(&name, path)?
                    .map(|value| (path.clone(), value)),
                None => None,
            };

            let node = match (base, fragment) {
                (Some((_, node)), None) => node,
                (None, Some((_, value))) => TreeNode::Leaf(value),
                (Some((base_path, node)), Some((fragment_path, value))) => {
                    let base = ContributionRecord::new(base_path, into_declared(node), None);
                    let fragment = ContributionRecord::new(fragment_path, value, None);
                    let merged = self
                        .merge
                        .combine(&name, Strategy::Merge, &[&base, &fragment])
                        .map_err(|source| TreeError::Merge {
                            name: name.clone(),
                            source,
                        })?;
                    TreeNode::Leaf(merged)
                }
                (None, None) => {
                    debug!(name = %name, "Empty fragment directory treated as absent");
                    continue;
                }
            };
            children.insert(name, node);
        }

        Ok(children)
    }

    /// Fold a fragment directory's children in name order.
    ///
    /// Returns `None` when no child produced a value.
    fn fold_fragments(&self, name: &str, dir: &Path) -> Result<Option<Declared>, TreeError> {
        let mut records = Vec::new();
        for entry in list_dir(dir)? {
            let file = match self.classifier.classify(&entry) {
                EntryClass::Declaration => entry.path().to_path_buf(),
                EntryClass::LeafModule { entry } => entry,
                EntryClass::Directory | EntryClass::Fragment => {
                    debug!(path = %entry.path().display(), "Ignoring nested directory in fragment");
                    continue;
                }
                EntryClass::Hidden | EntryClass::Ignored => continue,
            };
            match self.import(&file) {
                Ok(value) => records.push(ContributionRecord::new(entry.path(), value, None)),
                Err(e) => warn!(path = %file.display(), error = %e, "Skipping invalid fragment"),
            }
        }

        if records.is_empty() {
            return Ok(None);
        }
        let ordered: Vec<&ContributionRecord> = records.iter().collect();
        self.merge
            .combine(name, Strategy::Merge, &ordered)
            .map(Some)
            .map_err(|source| TreeError::Merge {
                name: name.to_string(),
                source,
            })
    }

    fn import(&self, file: &Path) -> Result<Declared, TreeError> {
        Ok(Declared::from_value(read_document(file)?))
    }
}

fn into_declared(node: TreeNode) -> Declared {
    match node {
        TreeNode::Leaf(declared) => declared,
        branch => Declared::Value(branch.into_value()),
    }
}

fn collision<'a>(name: &str, sources: impl Iterator<Item = &'a Path>) -> TreeError {
    let mut sources: Vec<PathBuf> = sources.map(Path::to_path_buf).collect();
    sources.sort_by(|a, b| compare_sources(a, b));
    TreeError::Collision {
        name: name.to_string(),
        sources,
    }
}

//! Engine facade
//!
//! Ties the scanner, flattener, contribution store, merge engine and tree
//! builder together behind one configured value. Discovery and realization
//! are separate phases: discovery only records deferred declarations, and
//! [`Engine::realize`] invokes them once real arguments exist.

use crate::config::AccreteConfig;
use crate::declaration::{extract, extract_from_document, DeferredDeclaration, Extracted, FlatEntry};
use crate::error::{ApiError, CallError, ExtractError, TreeError};
use crate::function::FunctionRegistry;
use crate::merge::{MergeEngine, Resolved};
use crate::scan::{CancelFlag, ScanOutcome, Scanner, SkippedFile};
use crate::store::{ContributionRecord, ContributionStore};
use crate::tree::classify::PathClassifier;
use crate::tree::builder::TreeBuilder;
use crate::tree::node::TreeNode;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Result of the discovery phase
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub store: ContributionStore,
    /// Callable declarations awaiting realization, in scan order
    pub deferred: Vec<DeferredDeclaration>,
    pub skipped: Vec<SkippedFile>,
    pub visited: usize,
    pub complete: bool,
}

#[derive(Debug, Default)]
struct Accumulated {
    store: ContributionStore,
    deferred: Vec<DeferredDeclaration>,
}

impl Accumulated {
    fn add(mut self, path: &Path, extracted: Extracted) -> Self {
        match extracted {
            Extracted::Static(entries) => self.store.extend_from(path, entries),
            Extracted::Deferred(deferred) => {
                debug!(path = %path.display(), "Recorded deferred declaration");
                self.deferred.push(deferred);
            }
        }
        self
    }
}

impl From<ScanOutcome<Accumulated>> for Discovery {
    fn from(outcome: ScanOutcome<Accumulated>) -> Self {
        Discovery {
            store: outcome.state.store,
            deferred: outcome.state.deferred,
            skipped: outcome.skipped,
            visited: outcome.visited,
            complete: outcome.complete,
        }
    }
}

/// Every resolved key with diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub entries: BTreeMap<String, Resolved>,
    pub skipped: Vec<SkippedFile>,
    pub complete: bool,
    /// Deferred declarations that were never realized
    pub pending_deferred: usize,
    /// BLAKE3 digest of the canonical JSON rendering of `entries`
    pub fingerprint: String,
}

impl Resolution {
    pub fn get(&self, key: &str) -> Option<&Resolved> {
        self.entries.get(key)
    }

    /// Flat map from dotted key to merged value.
    pub fn values(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .map(|(key, resolved)| (key.clone(), resolved.value.to_value()))
            .collect()
    }
}

/// Provenance for one key: every contribution plus the merged result
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub key: String,
    /// Contributions in combination order
    pub contributions: Vec<ContributionRecord>,
    pub resolved: Resolved,
}

/// Configured declaration engine
#[derive(Debug, Clone)]
pub struct Engine {
    scanner: Scanner,
    merge: MergeEngine,
    tree: TreeBuilder,
    registry: FunctionRegistry,
    attribute: String,
    concurrent: bool,
    max_in_flight: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            scanner: Scanner::default(),
            merge: MergeEngine::default(),
            tree: TreeBuilder::default(),
            registry: FunctionRegistry::with_builtins(),
            attribute: "exports".to_string(),
            concurrent: false,
            max_in_flight: 16,
        }
    }
}

impl Engine {
    /// Build from validated configuration. Functions default to the builtins.
    pub fn from_config(config: &AccreteConfig) -> Result<Self, ApiError> {
        config.ensure_valid()?;
        let classifier = PathClassifier::new(config.naming.clone());
        let merge = MergeEngine::from_config(&config.merge).map_err(ApiError::ConfigError)?;
        Ok(Self {
            scanner: Scanner::new(classifier.clone()),
            tree: TreeBuilder::new(classifier).with_merge_engine(merge.clone()),
            merge,
            registry: FunctionRegistry::with_builtins(),
            attribute: config.scan.attribute.clone(),
            concurrent: config.scan.concurrent,
            max_in_flight: config.scan.max_in_flight,
        })
    }

    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.scanner = self.scanner.with_cancel(cancel);
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn merge_engine(&self) -> &MergeEngine {
        &self.merge
    }

    /// Whether configuration asked for concurrent extraction.
    pub fn prefers_concurrent(&self) -> bool {
        self.concurrent
    }

    /// Scan `roots` and group every contribution.
    #[instrument(skip(self, roots), fields(attribute = %self.attribute))]
    pub fn discover<P: AsRef<Path>>(&self, roots: &[P]) -> Result<Discovery, ApiError> {
        let attribute = self.attribute.as_str();
        let outcome = self.scanner.scan(
            roots,
            |path| extract(path, attribute),
            Accumulated::add,
            Accumulated::default(),
        )?;
        let discovery = Discovery::from(outcome);
        info!(
            keys = discovery.store.len(),
            deferred = discovery.deferred.len(),
            skipped = discovery.skipped.len(),
            "Discovery finished"
        );
        Ok(discovery)
    }

    /// [`Engine::discover`] with concurrent extraction. Produces the same
    /// discovery for the same filesystem state.
    #[instrument(skip(self, roots), fields(attribute = %self.attribute))]
    pub async fn discover_concurrent<P: AsRef<Path>>(
        &self,
        roots: &[P],
    ) -> Result<Discovery, ApiError> {
        let attribute = self.attribute.clone();
        let outcome = self
            .scanner
            .scan_concurrent(
                roots,
                move |path: &Path| extract(path, &attribute),
                Accumulated::add,
                Accumulated::default(),
                self.max_in_flight,
            )
            .await?;
        Ok(Discovery::from(outcome))
    }

    /// Invoke one deferred declaration with realization arguments and
    /// flatten the document it returns.
    pub fn realize_one(
        &self,
        deferred: &DeferredDeclaration,
        args: &Value,
    ) -> Result<Vec<FlatEntry>, ExtractError> {
        let document = deferred
            .callable
            .call(&self.registry, args, args.clone())
            .map_err(|source| ExtractError::Realize {
                path: deferred.source.clone(),
                source,
            })?;
        extract_from_document(&deferred.source, &document, &self.attribute)
    }

    /// Realize every deferred declaration in `discovery`.
    ///
    /// Contributions are appended to the store. A failing realization is a
    /// per-file failure and lands in `skipped`.
    #[instrument(skip(self, discovery, args), fields(deferred = discovery.deferred.len()))]
    pub fn realize(&self, mut discovery: Discovery, args: &Value) -> Discovery {
        for deferred in std::mem::take(&mut discovery.deferred) {
            match self.realize_one(&deferred, args) {
                Ok(entries) => discovery.store.extend_from(&deferred.source, entries),
                Err(e) => {
                    warn!(path = %deferred.source.display(), error = %e, "Realization failed");
                    discovery.skipped.push(SkippedFile {
                        path: deferred.source.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        discovery
    }

    /// Merge every key in the store.
    #[instrument(skip(self, discovery), fields(keys = discovery.store.len()))]
    pub fn resolve(&self, discovery: &Discovery) -> Result<Resolution, ApiError> {
        let mut entries = BTreeMap::new();
        for (key, records) in discovery.store.iter() {
            entries.insert(key.to_string(), self.merge.resolve(key, records)?);
        }

        let canonical = serde_json::to_vec(&entries)?;
        let fingerprint = hex::encode(blake3::hash(&canonical).as_bytes());

        Ok(Resolution {
            entries,
            skipped: discovery.skipped.clone(),
            complete: discovery.complete,
            pending_deferred: discovery.deferred.len(),
            fingerprint,
        })
    }

    /// Contributions and merged result for one key.
    pub fn explain(&self, discovery: &Discovery, key: &str) -> Result<Explanation, ApiError> {
        let records = discovery
            .store
            .get(key)
            .ok_or_else(|| ApiError::KeyNotFound(key.to_string()))?;
        let resolved = self.merge.resolve(key, records)?;
        let contributions = discovery.store.sorted(key).into_iter().cloned().collect();
        Ok(Explanation {
            key: key.to_string(),
            contributions,
            resolved,
        })
    }

    /// Build the attribute tree for `root`.
    pub fn build_tree(&self, root: &Path) -> Result<TreeNode, TreeError> {
        self.tree.build(root)
    }

    /// Invoke the merged callable for `key` on `seed`.
    pub fn apply(
        &self,
        resolution: &Resolution,
        key: &str,
        seed: Value,
        context: &Value,
    ) -> Result<Value, ApiError> {
        let resolved = resolution
            .get(key)
            .ok_or_else(|| ApiError::KeyNotFound(key.to_string()))?;
        let callable = resolved
            .value
            .as_callable()
            .ok_or_else(|| CallError::NotInvocable(key.to_string()))?;
        Ok(callable.call(&self.registry, context, seed)?)
    }

    /// Source paths rendered relative to `base` for display.
    pub fn relative_sources(resolved: &Resolved, base: &Path) -> Vec<PathBuf> {
        resolved
            .sources
            .iter()
            .map(|source| source.strip_prefix(base).unwrap_or(source).to_path_buf())
            .collect()
    }
}

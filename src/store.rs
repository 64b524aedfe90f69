//! Contribution Store
//!
//! Groups flattened declarations from every scanned file by dotted key. Later
//! contributions are appended, never overwritten; merging needs all of them.

use crate::declaration::{Declared, FlatEntry};
use crate::tree::path::compare_sources;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One file's contribution to one key. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionRecord {
    pub source: PathBuf,
    pub value: Declared,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl ContributionRecord {
    pub fn new(source: impl Into<PathBuf>, value: Declared, strategy: Option<String>) -> Self {
        Self {
            source: source.into(),
            value,
            strategy,
        }
    }
}

/// All contribution records, grouped by dotted key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributionStore {
    groups: BTreeMap<String, Vec<ContributionRecord>>,
}

impl ContributionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `(source, entry)` pairs gathered across all files.
    pub fn group<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, FlatEntry)>,
        P: AsRef<Path>,
    {
        let mut store = Self::new();
        for (source, entry) in entries {
            store.push_entry(source.as_ref(), entry);
        }
        store
    }

    /// Append one flattened entry stamped with its source.
    pub fn push_entry(&mut self, source: &Path, entry: FlatEntry) {
        self.groups
            .entry(entry.key)
            .or_default()
            .push(ContributionRecord::new(source, entry.value, entry.strategy));
    }

    /// Append every entry a file contributed.
    pub fn extend_from(&mut self, source: &Path, entries: impl IntoIterator<Item = FlatEntry>) {
        for entry in entries {
            self.push_entry(source, entry);
        }
    }

    /// Fold another store in, keeping every record.
    pub fn absorb(&mut self, other: ContributionStore) {
        for (key, records) in other.groups {
            self.groups.entry(key).or_default().extend(records);
        }
    }

    /// Records for `key` in insertion order.
    pub fn get(&self, key: &str) -> Option<&[ContributionRecord]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Records for `key` sorted by source path.
    pub fn sorted(&self, key: &str) -> Vec<&ContributionRecord> {
        let mut records: Vec<&ContributionRecord> =
            self.groups.get(key).map(|r| r.iter().collect()).unwrap_or_default();
        records.sort_by(|a, b| compare_sources(&a.source, &b.source));
        records
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ContributionRecord])> {
        self.groups
            .iter()
            .map(|(key, records)| (key.as_str(), records.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of records across all keys.
    pub fn record_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

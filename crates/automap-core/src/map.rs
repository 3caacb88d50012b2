//! The autoload map: one name-to-file index per symbol kind
//!
//! Class keys are folded to lower case so lookups are case-insensitive;
//! function, type and constant keys are stored as written.

use crate::names::{canonical_key, normalization_candidates};
use crate::SymbolKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name-to-file index of top-level definitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoloadMap {
    class: BTreeMap<String, PathBuf>,
    function: BTreeMap<String, PathBuf>,
    #[serde(rename = "type")]
    type_: BTreeMap<String, PathBuf>,
    constant: BTreeMap<String, PathBuf>,
}

impl AutoloadMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// The sub-map for one kind, keyed by canonical name
    pub fn entries(&self, kind: SymbolKind) -> &BTreeMap<String, PathBuf> {
        match kind {
            SymbolKind::Class => &self.class,
            SymbolKind::Function => &self.function,
            SymbolKind::Type => &self.type_,
            SymbolKind::Constant => &self.constant,
        }
    }

    fn entries_mut(&mut self, kind: SymbolKind) -> &mut BTreeMap<String, PathBuf> {
        match kind {
            SymbolKind::Class => &mut self.class,
            SymbolKind::Function => &mut self.function,
            SymbolKind::Type => &mut self.type_,
            SymbolKind::Constant => &mut self.constant,
        }
    }

    /// Path currently stored for `name`, if any
    pub fn get(&self, kind: SymbolKind, name: &str) -> Option<&Path> {
        self.entries(kind)
            .get(&canonical_key(kind, name))
            .map(PathBuf::as_path)
    }

    /// Resolve `name` under an optional namespace prefix
    ///
    /// Probes the candidates from [`normalization_candidates`] in order and
    /// returns the first hit.
    pub fn resolve(&self, kind: SymbolKind, prefix: Option<&str>, name: &str) -> Option<&Path> {
        let entries = self.entries(kind);
        normalization_candidates(kind, prefix, name)
            .iter()
            .find_map(|key| entries.get(key))
            .map(PathBuf::as_path)
    }

    pub fn contains(&self, kind: SymbolKind, name: &str) -> bool {
        self.get(kind, name).is_some()
    }

    /// Number of entries for one kind
    pub fn count(&self, kind: SymbolKind) -> usize {
        self.entries(kind).len()
    }

    /// Total number of entries across all kinds
    pub fn len(&self) -> usize {
        SymbolKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert an entry under its canonical key, returning the replaced path
    pub(crate) fn insert(&mut self, kind: SymbolKind, name: &str, path: PathBuf) -> Option<PathBuf> {
        self.entries_mut(kind).insert(canonical_key(kind, name), path)
    }
}

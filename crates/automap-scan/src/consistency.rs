//! Cross-parser consistency checks
//!
//! Scans one root with two parser families and diffs the resulting maps
//! kind by kind. Entries whose path contains the exclude substring are
//! dropped from both sides first, so parser-specific fixtures can live in
//! the same tree.

use crate::error::{Result, ScanError};
use crate::logging;
use crate::options::ScanOptions;
use crate::scanner::Scanner;
use automap_core::{AutoloadMap, SymbolKind};
use automap_parsers::{Capabilities, ParserFamily};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A name both maps contain, pointing at different files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedPath {
    pub name: String,
    pub first: PathBuf,
    pub second: PathBuf,
}

/// Differences for one symbol kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindDiff {
    pub kind: SymbolKind,
    pub only_in_first: Vec<String>,
    pub only_in_second: Vec<String>,
    pub changed: Vec<ChangedPath>,
}

impl KindDiff {
    pub fn is_empty(&self) -> bool {
        self.only_in_first.is_empty() && self.only_in_second.is_empty() && self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.only_in_first.len() + self.only_in_second.len() + self.changed.len()
    }
}

/// Outcome of comparing two families over one root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub root: PathBuf,
    pub first: ParserFamily,
    pub second: ParserFamily,
    pub exclude: String,
    /// One entry per kind, in `SymbolKind::ALL` order
    pub kinds: Vec<KindDiff>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.kinds.iter().all(KindDiff::is_empty)
    }

    pub fn difference_count(&self) -> usize {
        self.kinds.iter().map(KindDiff::len).sum()
    }

    pub fn diff(&self, kind: SymbolKind) -> Option<&KindDiff> {
        self.kinds.iter().find(|diff| diff.kind == kind)
    }

    /// One-line description
    pub fn summary(&self) -> String {
        if self.is_consistent() {
            return "consistent".to_string();
        }

        let per_kind: Vec<String> = self
            .kinds
            .iter()
            .filter(|diff| !diff.is_empty())
            .map(|diff| format!("{}: {}", diff.kind, diff.len()))
            .collect();
        format!(
            "{} difference(s) ({})",
            self.difference_count(),
            per_kind.join(", ")
        )
    }

    /// Turn a non-empty diff into `ConsistencyMismatch`
    pub fn into_result(self) -> Result<ConsistencyReport> {
        if self.is_consistent() {
            Ok(self)
        } else {
            Err(ScanError::ConsistencyMismatch(Box::new(self)))
        }
    }
}

/// Result of `check_available`
#[derive(Debug)]
pub enum CheckOutcome {
    /// Both families ran and were compared
    Compared(ConsistencyReport),
    /// Only the reference family could run
    ReferenceOnly { reason: String, map: AutoloadMap },
}

/// Entries of one kind whose path does not contain `exclude`
fn retained<'m>(map: &'m AutoloadMap, kind: SymbolKind, exclude: &str) -> BTreeMap<&'m str, &'m Path> {
    map.entries(kind)
        .iter()
        .filter(|(_, path)| exclude.is_empty() || !path.to_string_lossy().contains(exclude))
        .map(|(name, path)| (name.as_str(), path.as_path()))
        .collect()
}

/// Per-kind differences between two maps
///
/// An empty `exclude` keeps every entry.
pub fn compare_maps(first: &AutoloadMap, second: &AutoloadMap, exclude: &str) -> Vec<KindDiff> {
    SymbolKind::ALL
        .into_iter()
        .map(|kind| {
            let left = retained(first, kind, exclude);
            let right = retained(second, kind, exclude);

            let mut diff = KindDiff {
                kind,
                only_in_first: Vec::new(),
                only_in_second: Vec::new(),
                changed: Vec::new(),
            };

            for (name, path) in &left {
                match right.get(name) {
                    None => diff.only_in_first.push(name.to_string()),
                    Some(other) if other != path => diff.changed.push(ChangedPath {
                        name: name.to_string(),
                        first: path.to_path_buf(),
                        second: other.to_path_buf(),
                    }),
                    Some(_) => {}
                }
            }
            diff.only_in_second = right
                .keys()
                .filter(|name| !left.contains_key(*name))
                .map(|name| name.to_string())
                .collect();

            diff
        })
        .collect()
}

/// Scan `root` with both families using default options and compare
pub fn check_consistency(
    root: &Path,
    first: ParserFamily,
    second: ParserFamily,
    exclude: &str,
) -> Result<ConsistencyReport> {
    check_consistency_with(root, first, second, exclude, &ScanOptions::default())
}

/// Scan `root` with both families using the same options and compare
pub fn check_consistency_with(
    root: &Path,
    first: ParserFamily,
    second: ParserFamily,
    exclude: &str,
    options: &ScanOptions,
) -> Result<ConsistencyReport> {
    let first_map = Scanner::from_tree_with(root, first, options)?.into_autoload_map();
    let second_map = Scanner::from_tree_with(root, second, options)?.into_autoload_map();

    let report = ConsistencyReport {
        root: root.to_path_buf(),
        first,
        second,
        exclude: exclude.to_string(),
        kinds: compare_maps(&first_map, &second_map, exclude),
    };
    logging::log_consistency(&report);
    Ok(report)
}

/// Compare the reference family against the fast one when it is available
///
/// Falls back to a reference-only scan otherwise, so callers still learn
/// whether the tree parses.
pub fn check_available(
    root: &Path,
    exclude: &str,
    capabilities: Capabilities,
    options: &ScanOptions,
) -> Result<CheckOutcome> {
    if capabilities.supports(ParserFamily::FactScan) {
        let report = check_consistency_with(
            root,
            ParserFamily::DefinitionFinder,
            ParserFamily::FactScan,
            exclude,
            options,
        )?;
        return Ok(CheckOutcome::Compared(report));
    }

    let reason = format!("parser family '{}' is not available", ParserFamily::FactScan);
    logging::log(&format!("Consistency check skipped: {}", reason));
    let map = Scanner::from_tree_with(root, ParserFamily::DefinitionFinder, options)?
        .into_autoload_map();
    Ok(CheckOutcome::ReferenceOnly { reason, map })
}

#[cfg(test)]
mod tests {
    use super::*;
    use automap_core::{Builder, Definition, ParseError, Parser};
    use std::fs;
    use tempfile::TempDir;

    /// Parser reading one `kind name` pair per line
    struct LineParser;

    impl Parser for LineParser {
        fn name(&self) -> &'static str {
            "line"
        }

        fn parse(&self, content: &[u8], path: &Path) -> std::result::Result<Vec<Definition>, ParseError> {
            Ok(String::from_utf8_lossy(content)
                .lines()
                .filter_map(|line| line.split_once(' '))
                .filter_map(|(kind, name)| Some(Definition::new(kind.parse().ok()?, name, path)))
                .collect())
        }
    }

    fn map_of(dir: &TempDir, files: &[(&str, &str)]) -> AutoloadMap {
        let mut builder = Builder::new(LineParser);
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            builder.add_file(&path).unwrap();
        }
        builder.into_autoload_map()
    }

    #[test]
    fn test_identical_maps_have_no_diff() {
        let dir = TempDir::new().unwrap();
        let map = map_of(&dir, &[("a.php", "class A\nfunction f\n")]);
        let diffs = compare_maps(&map, &map.clone(), "");
        assert_eq!(diffs.len(), SymbolKind::ALL.len());
        assert!(diffs.iter().all(KindDiff::is_empty));
    }

    #[test]
    fn test_reports_each_side_and_changed_paths() {
        let dir = TempDir::new().unwrap();
        let first = map_of(&dir, &[("a.php", "class A\nclass Shared\nconstant ONLY_FIRST\n")]);
        let second = map_of(&dir, &[("b.php", "class Shared\ntype OnlySecond\n"), ("a.php", "class A\n")]);

        let diffs = compare_maps(&first, &second, "");
        let class = &diffs[0];
        assert_eq!(class.kind, SymbolKind::Class);
        assert!(class.only_in_first.is_empty());
        assert_eq!(class.changed, vec![ChangedPath {
            name: "shared".to_string(),
            first: dir.path().join("a.php"),
            second: dir.path().join("b.php"),
        }]);

        let type_diff = diffs.iter().find(|d| d.kind == SymbolKind::Type).unwrap();
        assert_eq!(type_diff.only_in_second, vec!["OnlySecond".to_string()]);
        let constant = diffs.iter().find(|d| d.kind == SymbolKind::Constant).unwrap();
        assert_eq!(constant.only_in_first, vec!["ONLY_FIRST".to_string()]);
    }

    #[test]
    fn test_exclude_drops_entries_on_both_sides() {
        let dir = TempDir::new().unwrap();
        let first = map_of(&dir, &[("hh-only/x.php", "class OnlyHere\n"), ("a.php", "class A\n")]);
        let second = map_of(&dir, &[("a.php", "class A\n")]);

        assert!(!compare_maps(&first, &second, "").iter().all(KindDiff::is_empty));
        assert!(compare_maps(&first, &second, "hh-only").iter().all(KindDiff::is_empty));
    }

    #[test]
    fn test_into_result() {
        let dir = TempDir::new().unwrap();
        let first = map_of(&dir, &[("a.php", "function f\n")]);
        let report = ConsistencyReport {
            root: dir.path().to_path_buf(),
            first: ParserFamily::DefinitionFinder,
            second: ParserFamily::FactScan,
            exclude: String::new(),
            kinds: compare_maps(&first, &AutoloadMap::new(), ""),
        };
        assert_eq!(report.difference_count(), 1);
        assert_eq!(report.summary(), "1 difference(s) (function: 1)");

        let err = report.into_result().unwrap_err();
        match err {
            ScanError::ConsistencyMismatch(report) => {
                let diff = report.diff(SymbolKind::Function).unwrap();
                assert_eq!(diff.only_in_first, vec!["f".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_available_degrades_to_reference_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.php"), "<?php\nclass A {}\n").unwrap();

        let outcome = check_available(
            dir.path(),
            "",
            Capabilities::reference_only(),
            &ScanOptions::default(),
        )
        .unwrap();
        match outcome {
            CheckOutcome::ReferenceOnly { reason, map } => {
                assert!(reason.contains("fact-scan"));
                assert!(map.contains(SymbolKind::Class, "a"));
            }
            CheckOutcome::Compared(_) => panic!("expected a reference-only outcome"),
        }
    }
}

//! Symbol kinds and the definitions parsers report

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The kind of a top-level definition
///
/// Interfaces, traits and enums are autoloaded like classes and are
/// reported as `Class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Function,
    Type,
    Constant,
}

impl SymbolKind {
    /// All kinds, in the order sub-maps are printed
    pub const ALL: [SymbolKind; 4] = [
        SymbolKind::Class,
        SymbolKind::Function,
        SymbolKind::Type,
        SymbolKind::Constant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Function => "function",
            SymbolKind::Type => "type",
            SymbolKind::Constant => "constant",
        }
    }

    /// Whether names of this kind are looked up case-insensitively
    pub fn is_case_insensitive(&self) -> bool {
        matches!(self, SymbolKind::Class)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "class" => Ok(SymbolKind::Class),
            "function" => Ok(SymbolKind::Function),
            "type" => Ok(SymbolKind::Type),
            "constant" => Ok(SymbolKind::Constant),
            other => Err(format!("unknown symbol kind '{}'", other)),
        }
    }
}

/// A single top-level definition found in a source file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Definition {
    pub kind: SymbolKind,
    /// Namespace-qualified name, without a leading backslash
    pub name: String,
    pub source_path: PathBuf,
}

impl Definition {
    pub fn new(kind: SymbolKind, name: impl Into<String>, source_path: &Path) -> Self {
        Self {
            kind,
            name: name.into(),
            source_path: source_path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in SymbolKind::ALL {
            assert_eq!(kind.as_str().parse::<SymbolKind>().unwrap(), kind);
        }
        assert!("interface".parse::<SymbolKind>().is_err());
    }

    #[test]
    fn test_only_classes_fold_case() {
        assert!(SymbolKind::Class.is_case_insensitive());
        assert!(!SymbolKind::Function.is_case_insensitive());
        assert!(!SymbolKind::Type.is_case_insensitive());
        assert!(!SymbolKind::Constant.is_case_insensitive());
    }
}

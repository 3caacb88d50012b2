//! Errors raised while parsing files and filling a map

use crate::SymbolKind;
use std::path::PathBuf;

/// A source file could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to parse {}: {message}", path.display())]
pub struct ParseError {
    pub path: PathBuf,
    pub message: String,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while a builder adds a file
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(
        "{kind} '{name}' is defined in both {} and {}",
        existing.display(),
        incoming.display()
    )]
    DuplicateDefinition {
        kind: SymbolKind,
        name: String,
        existing: PathBuf,
        incoming: PathBuf,
    },
}

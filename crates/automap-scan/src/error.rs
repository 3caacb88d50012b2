//! Errors surfaced by scans and consistency checks

use crate::consistency::ConsistencyReport;
use automap_core::{BuildError, ParseError, SymbolKind};
use automap_parsers::UnsupportedParserError;
use std::path::PathBuf;

/// Errors that can occur during a scan
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("File system error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    UnsupportedParser(#[from] UnsupportedParserError),

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

    #[error("Parsers disagree: {}", .0.summary())]
    ConsistencyMismatch(Box<ConsistencyReport>),
}

impl From<BuildError> for ScanError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::FileSystem { path, source } => ScanError::FileSystem { path, source },
            BuildError::Parse(err) => ScanError::Parse(err),
            BuildError::DuplicateDefinition {
                kind,
                name,
                existing,
                incoming,
            } => ScanError::DuplicateDefinition {
                kind,
                name,
                existing,
                incoming,
            },
        }
    }
}

impl ScanError {
    pub(crate) fn walk(root: &std::path::Path, err: walkdir::Error) -> Self {
        let path = err.path().map_or_else(|| root.to_path_buf(), PathBuf::from);
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("file system loop detected"));
        ScanError::FileSystem { path, source }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

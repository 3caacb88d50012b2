//! automap-scan: Build autoload maps from source trees
//!
//! Provides:
//! - `Scanner`: enumerates source files and feeds the builder for a family
//! - `ScanBuilder`: the finished builder, one variant per parser family
//! - `check_consistency`: runs two families over one root and diffs them
//! - `logging`: optional scan log
//!
//! # Example
//!
//! ```no_run
//! use automap_scan::{ParserFamily, Scanner, SymbolKind};
//! use std::path::Path;
//!
//! let builder = Scanner::from_tree(Path::new("src"), ParserFamily::DefinitionFinder)?;
//! let map = builder.into_autoload_map();
//! println!("{:?}", map.get(SymbolKind::Class, "App\\Kernel"));
//! # Ok::<(), automap_scan::ScanError>(())
//! ```

mod consistency;
mod error;
pub mod logging;
mod options;
mod scanner;

pub use consistency::{
    check_available, check_consistency, check_consistency_with, compare_maps, ChangedPath,
    CheckOutcome, ConsistencyReport, KindDiff,
};
pub use error::{Result, ScanError};
pub use options::{ParseErrorPolicy, ScanOptions};
pub use scanner::{ScanBuilder, Scanner, SOURCE_EXTENSIONS};

pub use automap_core::{AutoloadMap, CollisionPolicy, Definition, SymbolKind};
pub use automap_parsers::{Capabilities, ParserFamily, UnsupportedParserError};

//! Scanner: walks a tree or takes one file and feeds a builder
//!
//! The parser family picks one `ScanBuilder` variant before any file is
//! touched. Files are always inserted in lexical path order, so the last
//! file to win a collision is deterministic.

use crate::error::{Result, ScanError};
use crate::logging;
use crate::options::{ParseErrorPolicy, ScanOptions};
use automap_core::{
    AddedFile, AutoloadMap, BuildError, Builder, CollisionPolicy, Definition, Parser,
};
use automap_parsers::{DefinitionFinder, ParserFamily};
#[cfg(feature = "fact-scan")]
use automap_parsers::FactScanner;
#[cfg(not(feature = "fact-scan"))]
use automap_parsers::UnsupportedParserError;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions treated as source files when walking a tree
pub const SOURCE_EXTENSIONS: &[&str] = &["php", "hh", "hck", "hack"];

/// A finished builder, one variant per parser family
pub enum ScanBuilder {
    DefinitionFinder(Builder<DefinitionFinder>),
    #[cfg(feature = "fact-scan")]
    FactScan(Builder<FactScanner>),
}

impl ScanBuilder {
    /// Empty builder for a family
    pub fn for_family(family: ParserFamily, collision: CollisionPolicy) -> Result<Self> {
        match family {
            ParserFamily::DefinitionFinder => Ok(ScanBuilder::DefinitionFinder(
                Builder::new(DefinitionFinder::new()).with_collision(collision),
            )),
            #[cfg(feature = "fact-scan")]
            ParserFamily::FactScan => Ok(ScanBuilder::FactScan(
                Builder::new(FactScanner::new()).with_collision(collision),
            )),
            #[cfg(not(feature = "fact-scan"))]
            ParserFamily::FactScan => Err(UnsupportedParserError::Unavailable(family).into()),
        }
    }

    pub fn family(&self) -> ParserFamily {
        match self {
            ScanBuilder::DefinitionFinder(_) => ParserFamily::DefinitionFinder,
            #[cfg(feature = "fact-scan")]
            ScanBuilder::FactScan(_) => ParserFamily::FactScan,
        }
    }

    pub fn autoload_map(&self) -> &AutoloadMap {
        match self {
            ScanBuilder::DefinitionFinder(builder) => builder.autoload_map(),
            #[cfg(feature = "fact-scan")]
            ScanBuilder::FactScan(builder) => builder.autoload_map(),
        }
    }

    pub fn into_autoload_map(self) -> AutoloadMap {
        match self {
            ScanBuilder::DefinitionFinder(builder) => builder.into_autoload_map(),
            #[cfg(feature = "fact-scan")]
            ScanBuilder::FactScan(builder) => builder.into_autoload_map(),
        }
    }

    /// Number of files that made it into the map
    pub fn file_count(&self) -> usize {
        match self {
            ScanBuilder::DefinitionFinder(builder) => builder.file_count(),
            #[cfg(feature = "fact-scan")]
            ScanBuilder::FactScan(builder) => builder.file_count(),
        }
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        match self {
            ScanBuilder::DefinitionFinder(builder) => builder.collision_policy(),
            #[cfg(feature = "fact-scan")]
            ScanBuilder::FactScan(builder) => builder.collision_policy(),
        }
    }

    /// Add files in order, returning how many were skipped
    fn populate(&mut self, files: &[PathBuf], options: &ScanOptions) -> Result<usize> {
        match self {
            ScanBuilder::DefinitionFinder(builder) => populate(builder, files, options),
            #[cfg(feature = "fact-scan")]
            ScanBuilder::FactScan(builder) => populate(builder, files, options),
        }
    }
}

impl std::fmt::Debug for ScanBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanBuilder")
            .field("family", &self.family())
            .field("files", &self.file_count())
            .field("entries", &self.autoload_map().len())
            .finish()
    }
}

fn populate<P: Parser>(
    builder: &mut Builder<P>,
    files: &[PathBuf],
    options: &ScanOptions,
) -> Result<usize> {
    let policy = builder.collision_policy();
    let mut skipped = 0;

    if options.parallel {
        let parsed: Vec<std::result::Result<Vec<Definition>, BuildError>> = files
            .par_iter()
            .map(|file| builder.parse_file(file))
            .collect();

        for (file, result) in files.iter().zip(parsed) {
            match result.and_then(|definitions| builder.add_definitions(file, definitions)) {
                Ok(added) => log_collisions(&added, policy),
                Err(err) => skipped += skip_or_fail(err, options)?,
            }
        }
    } else {
        for file in files {
            match builder.add_file(file) {
                Ok(added) => log_collisions(&added, policy),
                Err(err) => skipped += skip_or_fail(err, options)?,
            }
        }
    }

    Ok(skipped)
}

fn log_collisions(added: &AddedFile, policy: CollisionPolicy) {
    for collision in &added.collisions {
        logging::log_collision(collision, policy);
    }
}

/// 1 when the error is a parse error the options allow skipping
fn skip_or_fail(err: BuildError, options: &ScanOptions) -> Result<usize> {
    match (err, options.on_parse_error) {
        (BuildError::Parse(err), ParseErrorPolicy::Skip) => {
            logging::log_parse_skipped(&err);
            Ok(1)
        }
        (err, _) => Err(err.into()),
    }
}

/// Entry points for building an autoload map
pub struct Scanner;

impl Scanner {
    /// Scan every source file under `root` with default options
    pub fn from_tree(root: &Path, family: ParserFamily) -> Result<ScanBuilder> {
        Self::from_tree_with(root, family, &ScanOptions::default())
    }

    pub fn from_tree_with(
        root: &Path,
        family: ParserFamily,
        options: &ScanOptions,
    ) -> Result<ScanBuilder> {
        let mut builder = ScanBuilder::for_family(family, options.collision)?;
        let files = Self::source_files(root)?;
        Self::run(&mut builder, root, &files, options)?;
        Ok(builder)
    }

    /// Scan exactly one file with default options
    pub fn from_file(path: &Path, family: ParserFamily) -> Result<ScanBuilder> {
        Self::from_file_with(path, family, &ScanOptions::default())
    }

    /// Scan exactly one file; the extension filter does not apply
    pub fn from_file_with(
        path: &Path,
        family: ParserFamily,
        options: &ScanOptions,
    ) -> Result<ScanBuilder> {
        let mut builder = ScanBuilder::for_family(family, options.collision)?;

        let metadata = fs::metadata(path).map_err(|source| ScanError::FileSystem {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(ScanError::FileSystem {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "expected a file, found a directory",
                ),
            });
        }

        Self::run(&mut builder, path, &[path.to_path_buf()], options)?;
        Ok(builder)
    }

    /// Source files under `root`, sorted by path
    ///
    /// Symlinks are followed. Any error reading the tree is fatal.
    pub fn source_files(root: &Path) -> Result<Vec<PathBuf>> {
        fs::metadata(root).map_err(|source| ScanError::FileSystem {
            path: root.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|err| ScanError::walk(root, err))?;
            if entry.file_type().is_file() && Self::is_source_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Whether a path has one of the source extensions
    pub fn is_source_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
    }

    fn run(
        builder: &mut ScanBuilder,
        root: &Path,
        files: &[PathBuf],
        options: &ScanOptions,
    ) -> Result<()> {
        logging::log_scan_start(root, builder.family(), files.len());
        let skipped = builder.populate(files, options)?;
        logging::log_scan_complete(builder.autoload_map(), builder.file_count(), skipped);
        Ok(())
    }
}

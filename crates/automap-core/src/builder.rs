//! Per-scan accumulator bound to one parser
//!
//! A `Builder` reads files, hands them to its parser and inserts the
//! returned definitions into an `AutoloadMap`. What happens when two files
//! define the same key is decided by its `CollisionPolicy`.

use crate::{AutoloadMap, BuildError, Definition, Parser, SymbolKind};
use std::fs;
use std::path::{Path, PathBuf};

/// What to do when a key is already present for its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// The file scanned last wins
    #[default]
    LastWins,
    /// The file scanned first wins
    FirstWins,
    /// Two different files defining the same key is an error
    Error,
}

impl CollisionPolicy {
    pub fn from_str(s: &str) -> Option<CollisionPolicy> {
        match s.to_lowercase().as_str() {
            "last-wins" | "last" => Some(CollisionPolicy::LastWins),
            "first-wins" | "first" => Some(CollisionPolicy::FirstWins),
            "error" => Some(CollisionPolicy::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionPolicy::LastWins => "last-wins",
            CollisionPolicy::FirstWins => "first-wins",
            CollisionPolicy::Error => "error",
        }
    }
}

/// A key defined by two different files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub kind: SymbolKind,
    pub name: String,
    pub previous: PathBuf,
    pub incoming: PathBuf,
    /// The path left in the map
    pub kept: PathBuf,
}

/// Result of adding one file
#[derive(Debug, Clone, Default)]
pub struct AddedFile {
    pub definitions: usize,
    pub collisions: Vec<Collision>,
}

/// Accumulates an autoload map using one parser
pub struct Builder<P> {
    parser: P,
    map: AutoloadMap,
    collision: CollisionPolicy,
    files: usize,
}

impl<P: Parser> Builder<P> {
    /// Create a builder with an empty map and the default collision policy
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            map: AutoloadMap::new(),
            collision: CollisionPolicy::default(),
            files: 0,
        }
    }

    /// Set the collision policy
    pub fn with_collision(mut self, policy: CollisionPolicy) -> Self {
        self.collision = policy;
        self
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision
    }

    /// Number of files added so far
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Read and parse a file without touching the map
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Definition>, BuildError> {
        let content = fs::read(path).map_err(|source| BuildError::FileSystem {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.parser.parse(&content, path)?)
    }

    /// Read, parse and insert every definition of a file
    pub fn add_file(&mut self, path: &Path) -> Result<AddedFile, BuildError> {
        let definitions = self.parse_file(path)?;
        self.add_definitions(path, definitions)
    }

    /// Insert definitions already parsed from `path`
    pub fn add_definitions(
        &mut self,
        path: &Path,
        definitions: Vec<Definition>,
    ) -> Result<AddedFile, BuildError> {
        let mut added = AddedFile::default();

        for definition in definitions {
            if let Some(collision) = self.insert(definition.kind, &definition.name, path)? {
                added.collisions.push(collision);
            }
            added.definitions += 1;
        }

        self.files += 1;
        Ok(added)
    }

    fn insert(
        &mut self,
        kind: SymbolKind,
        name: &str,
        path: &Path,
    ) -> Result<Option<Collision>, BuildError> {
        let previous = self
            .map
            .get(kind, name)
            .filter(|existing| *existing != path)
            .map(Path::to_path_buf);
        let Some(previous) = previous else {
            self.map.insert(kind, name, path.to_path_buf());
            return Ok(None);
        };

        let kept = match self.collision {
            CollisionPolicy::LastWins => {
                self.map.insert(kind, name, path.to_path_buf());
                path.to_path_buf()
            }
            CollisionPolicy::FirstWins => previous.clone(),
            CollisionPolicy::Error => {
                return Err(BuildError::DuplicateDefinition {
                    kind,
                    name: name.to_string(),
                    existing: previous,
                    incoming: path.to_path_buf(),
                });
            }
        };

        Ok(Some(Collision {
            kind,
            name: name.to_string(),
            previous,
            incoming: path.to_path_buf(),
            kept,
        }))
    }

    /// The accumulated map
    ///
    /// Only meaningful once every file has been added; the borrow checker
    /// keeps this snapshot from coexisting with a running `add_file`.
    pub fn autoload_map(&self) -> &AutoloadMap {
        &self.map
    }

    /// Consume the builder and return its map
    pub fn into_autoload_map(self) -> AutoloadMap {
        self.map
    }
}

//! automap-core: Core abstractions for building autoload maps
//!
//! This crate provides:
//! - `SymbolKind` / `Definition`: what a parser reports for one file
//! - `AutoloadMap`: the finished name-to-file index, one sub-map per kind
//! - `Parser`: the capability every parser family implements
//! - `Builder`: the per-scan accumulator bound to one parser
//! - `Visitor`: trait for walking top-level PHP declarations

mod builder;
mod definition;
mod error;
mod map;
pub mod names;
mod parser;
pub mod visitor;

pub use builder::{AddedFile, Builder, Collision, CollisionPolicy};
pub use definition::{Definition, SymbolKind};
pub use error::{BuildError, ParseError};
pub use map::AutoloadMap;
pub use parser::Parser;
pub use visitor::Visitor;

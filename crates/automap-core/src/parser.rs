//! The parser capability

use crate::{Definition, ParseError};
use std::path::Path;

/// Extracts top-level definitions from one source file
///
/// Implementations must be interchangeable: for the same content they
/// report the same set of definitions, in any order.
pub trait Parser: Send + Sync {
    /// Short identifier of the parser family (e.g., "fact-scan")
    fn name(&self) -> &'static str;

    /// Parse one file's content and return its definitions
    fn parse(&self, content: &[u8], path: &Path) -> Result<Vec<Definition>, ParseError>;
}

impl<P: Parser + ?Sized> Parser for &P {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn parse(&self, content: &[u8], path: &Path) -> Result<Vec<Definition>, ParseError> {
        (**self).parse(content, path)
    }
}

impl<P: Parser + ?Sized> Parser for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn parse(&self, content: &[u8], path: &Path) -> Result<Vec<Definition>, ParseError> {
        (**self).parse(content, path)
    }
}

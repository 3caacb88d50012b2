//! automap-parsers: Interchangeable definition parsers
//!
//! Two parser families implement [`automap_core::Parser`] and must agree on
//! every file:
//!
//! - [`DefinitionFinder`]: reference family, full PHP syntax tree via
//!   mago-syntax with a lowering pass for Hack-only syntax
//! - [`FactScanner`]: fast family, a single pass over a byte lexer
//!   (behind the `fact-scan` feature)
//!
//! The byte lexer is always built: the Hack lowering in [`dialect`] uses it
//! to tell code from comments and strings.

mod definition_finder;
pub mod dialect;
#[cfg(feature = "fact-scan")]
mod fact_scan;
#[cfg_attr(not(feature = "fact-scan"), allow(dead_code))]
mod lexer;

pub use definition_finder::DefinitionFinder;
#[cfg(feature = "fact-scan")]
pub use fact_scan::FactScanner;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The closed set of parser families
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParserFamily {
    DefinitionFinder,
    FactScan,
}

impl ParserFamily {
    pub const ALL: [ParserFamily; 2] = [ParserFamily::DefinitionFinder, ParserFamily::FactScan];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParserFamily::DefinitionFinder => "definition-finder",
            ParserFamily::FactScan => "fact-scan",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ParserFamily::DefinitionFinder => "Full PHP syntax tree (reference)",
            ParserFamily::FactScan => "Single-pass declaration scanner (fast)",
        }
    }

    /// Whether this family was compiled into the build
    pub fn is_available(&self) -> bool {
        match self {
            ParserFamily::DefinitionFinder => true,
            ParserFamily::FactScan => cfg!(feature = "fact-scan"),
        }
    }
}

impl fmt::Display for ParserFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserFamily {
    type Err = UnsupportedParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "definition-finder" | "reference" | "ast" => Ok(ParserFamily::DefinitionFinder),
            "fact-scan" | "fast" | "facts" => Ok(ParserFamily::FactScan),
            _ => Err(UnsupportedParserError::Unknown(s.to_string())),
        }
    }
}

/// A parser family that cannot be used
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedParserError {
    #[error("Unknown parser family '{0}'. Valid options: definition-finder, fact-scan")]
    Unknown(String),

    #[error("Parser family '{0}' is not available in this build")]
    Unavailable(ParserFamily),
}

/// Parser families available at runtime
///
/// Detected once and passed down instead of being queried ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub fact_scan: bool,
}

impl Capabilities {
    pub fn detect() -> Self {
        Self {
            fact_scan: ParserFamily::FactScan.is_available(),
        }
    }

    /// Only the reference family
    pub fn reference_only() -> Self {
        Self { fact_scan: false }
    }

    pub fn supports(&self, family: ParserFamily) -> bool {
        match family {
            ParserFamily::DefinitionFinder => true,
            ParserFamily::FactScan => self.fact_scan,
        }
    }

    pub fn families(&self) -> Vec<ParserFamily> {
        ParserFamily::ALL
            .into_iter()
            .filter(|family| self.supports(*family))
            .collect()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

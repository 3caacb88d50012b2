//! Scan options

use automap_core::CollisionPolicy;

/// What to do with a file its parser rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorPolicy {
    /// Abort the scan
    #[default]
    Fail,
    /// Log the file and continue without it
    Skip,
}

/// Options shared by `Scanner::from_tree_with` and `Scanner::from_file_with`
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub collision: CollisionPolicy,
    pub on_parse_error: ParseErrorPolicy,
    /// Parse files on the rayon pool; insertion order is unchanged
    pub parallel: bool,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collision(mut self, policy: CollisionPolicy) -> Self {
        self.collision = policy;
        self
    }

    pub fn skip_unparseable(mut self, skip: bool) -> Self {
        self.on_parse_error = if skip {
            ParseErrorPolicy::Skip
        } else {
            ParseErrorPolicy::Fail
        };
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

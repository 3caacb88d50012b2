//! Scan log
//!
//! A process-wide file log of what a scan did: which files were walked,
//! which were skipped as unparseable, which keys collided and what the
//! consistency checker found. Disabled until `init_logger` is called.

use crate::consistency::ConsistencyReport;
use automap_core::{AutoloadMap, Collision, CollisionPolicy, ParseError, SymbolKind};
use automap_parsers::ParserFamily;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Global logger instance
static LOGGER: Mutex<Option<ScanLogger>> = Mutex::new(None);

/// Timestamped log file
pub struct ScanLogger {
    file: File,
}

impl ScanLogger {
    /// Create a new logger writing to the specified path
    pub fn new(log_path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_path)?;

        Ok(Self { file })
    }

    /// Write a log message
    pub fn log(&mut self, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(self.file, "[{}] {}", timestamp, message);
        let _ = self.file.flush();
    }

    pub fn section(&mut self, title: &str) {
        let separator = "=".repeat(60);
        self.log(&separator);
        self.log(title);
        self.log(&separator);
    }

    pub fn subsection(&mut self, title: &str) {
        let separator = "-".repeat(40);
        self.log(&separator);
        self.log(title);
        self.log(&separator);
    }
}

/// Initialize the global logger
///
/// Without a path, logs go to a timestamped file in the temp directory.
pub fn init_logger(log_path: Option<&Path>) -> std::io::Result<PathBuf> {
    let path = log_path.map(Path::to_path_buf).unwrap_or_else(|| {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        std::env::temp_dir().join(format!("automap-{}.log", timestamp))
    });

    let logger = ScanLogger::new(&path)?;

    if let Ok(mut guard) = LOGGER.lock() {
        *guard = Some(logger);
    }

    Ok(path)
}

fn with_logger(f: impl FnOnce(&mut ScanLogger)) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            f(logger);
        }
    }
}

/// Log a message to the global logger
pub fn log(message: &str) {
    with_logger(|logger| logger.log(message));
}

pub fn section(title: &str) {
    with_logger(|logger| logger.section(title));
}

pub fn subsection(title: &str) {
    with_logger(|logger| logger.subsection(title));
}

pub fn log_scan_start(root: &Path, family: ParserFamily, file_count: usize) {
    section("SCAN START");
    log(&format!("Root: {}", root.display()));
    log(&format!("Parser: {}", family));
    log(&format!("Source files: {}", file_count));
}

pub fn log_parse_skipped(err: &ParseError) {
    log(&format!("SKIPPED: {}", err.path.display()));
    log(&format!("  Reason: {}", err.message));
}

pub fn log_collision(collision: &Collision, policy: CollisionPolicy) {
    log(&format!(
        "COLLISION ({}): {} '{}'",
        policy.as_str(),
        collision.kind,
        collision.name
    ));
    log(&format!("  Previous: {}", collision.previous.display()));
    log(&format!("  Incoming: {}", collision.incoming.display()));
    log(&format!("  Kept: {}", collision.kept.display()));
}

pub fn log_scan_complete(map: &AutoloadMap, files: usize, skipped: usize) {
    section("SCAN COMPLETE");
    log(&format!("Files added: {}", files));
    log(&format!("Files skipped: {}", skipped));
    for kind in SymbolKind::ALL {
        log(&format!("{} entries: {}", kind, map.count(kind)));
    }
}

pub fn log_consistency(report: &ConsistencyReport) {
    section("CONSISTENCY CHECK");
    log(&format!("{} vs {}", report.first, report.second));
    if !report.exclude.is_empty() {
        log(&format!("Excluding paths containing: {}", report.exclude));
    }

    for diff in &report.kinds {
        if diff.is_empty() {
            continue;
        }
        subsection(&format!("{} differences", diff.kind));
        for name in &diff.only_in_first {
            log(&format!("  only in {}: {}", report.first, name));
        }
        for name in &diff.only_in_second {
            log(&format!("  only in {}: {}", report.second, name));
        }
        for changed in &diff.changed {
            log(&format!(
                "  {}: {} vs {}",
                changed.name,
                changed.first.display(),
                changed.second.display()
            ));
        }
    }

    log(&format!("Result: {}", report.summary()));
}

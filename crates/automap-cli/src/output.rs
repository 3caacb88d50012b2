//! Output formatting for automap
//!
//! Supports text (colored terminal) and JSON output formats.

use anyhow::Result;
use automap_scan::{
    AutoloadMap, Capabilities, ConsistencyReport, ParserFamily, ScanBuilder, SymbolKind,
};
use colored::*;
use serde::Serialize;
use std::path::Path;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// JSON shape of a reference-only check
#[derive(Debug, Serialize)]
pub struct ReferenceOnlyOutput<'a> {
    pub status: &'static str,
    pub reason: &'a str,
    pub entries: usize,
}

/// JSON shape of one `automap parsers` line
#[derive(Debug, Serialize)]
pub struct ParserInfo {
    pub name: ParserFamily,
    pub description: &'static str,
    pub available: bool,
}

pub fn parser_infos(capabilities: Capabilities) -> Vec<ParserInfo> {
    ParserFamily::ALL
        .into_iter()
        .map(|family| ParserInfo {
            name: family,
            description: family.description(),
            available: capabilities.supports(family),
        })
        .collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a finished scan
pub fn print_scan(format: OutputFormat, root: &Path, builder: &ScanBuilder, verbose: bool) -> Result<()> {
    let map = builder.autoload_map();
    match format {
        OutputFormat::Json => print_json(map),
        OutputFormat::Text => {
            print_map(map);
            if verbose {
                println!(
                    "{} {} files under {} with {} ({} policy)",
                    "Scanned".bold(),
                    builder.file_count(),
                    root.display(),
                    builder.family().to_string().cyan(),
                    builder.collision_policy().as_str()
                );
            }
            println!("{}", map_summary(map).bold());
            Ok(())
        }
    }
}

fn print_map(map: &AutoloadMap) {
    for kind in SymbolKind::ALL {
        let entries = map.entries(kind);
        if entries.is_empty() {
            continue;
        }
        println!("{}", format!("[{}]", kind).bold());
        for (name, path) in entries {
            println!("  {} {} {}", name.green(), "=>".dimmed(), path.display());
        }
        println!();
    }
}

pub fn map_summary(map: &AutoloadMap) -> String {
    let counts: Vec<String> = SymbolKind::ALL
        .iter()
        .map(|kind| format!("{}: {}", kind, map.count(*kind)))
        .collect();
    format!("{} definitions ({})", map.len(), counts.join(", "))
}

/// Print a comparison of two parser families
pub fn print_report(format: OutputFormat, report: &ConsistencyReport) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }

    println!(
        "{} {} vs {}",
        "Comparing".bold(),
        report.first.to_string().cyan(),
        report.second.to_string().cyan()
    );

    for diff in report.kinds.iter().filter(|diff| !diff.is_empty()) {
        println!("{}", format!("[{}]", diff.kind).bold());
        for name in &diff.only_in_first {
            println!("  {} {} (only {})", "-".red(), name, report.first);
        }
        for name in &diff.only_in_second {
            println!("  {} {} (only {})", "+".green(), name, report.second);
        }
        for changed in &diff.changed {
            println!(
                "  {} {}: {} vs {}",
                "~".yellow(),
                changed.name,
                changed.first.display(),
                changed.second.display()
            );
        }
    }

    if report.is_consistent() {
        println!("{}", "Parsers agree".green().bold());
    } else {
        println!("{}", report.summary().red().bold());
    }
    Ok(())
}

/// Print a check that could only run the reference family
pub fn print_reference_only(format: OutputFormat, reason: &str, map: &AutoloadMap) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&ReferenceOnlyOutput {
            status: "reference-only",
            reason,
            entries: map.len(),
        }),
        OutputFormat::Text => {
            eprintln!("{}: {}; nothing to compare against", "Warning".yellow(), reason);
            println!("{}", map_summary(map));
            Ok(())
        }
    }
}

pub fn print_parsers(format: OutputFormat, capabilities: Capabilities) -> Result<()> {
    let infos = parser_infos(capabilities);
    if format == OutputFormat::Json {
        return print_json(&infos);
    }

    println!("{}", "Parser families:".bold());
    for info in infos {
        let status = if info.available {
            "available".green()
        } else {
            "not built".red()
        };
        println!("  {} - {} ({})", info.name.as_str().green(), info.description, status);
    }
    Ok(())
}

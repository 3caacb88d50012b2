//! automap CLI - build autoload maps for PHP and Hack source trees
//!
//! Commands:
//! - scan: print the autoload map of a directory or a single file
//! - check: compare the parser families over a directory
//! - parsers: list parser families and whether this build has them

mod config;
mod output;

use anyhow::{anyhow, Result};
use automap_scan::{
    check_available, logging, Capabilities, CheckOutcome, ParserFamily, Scanner,
};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;

use config::Config;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "automap")]
#[command(version)]
#[command(about = "Build autoload maps of top-level PHP and Hack definitions")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (default: auto-detect .automap.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long, global = true)]
    no_config: bool,

    /// Write a scan log to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Show verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build the autoload map of a directory or a single file
    Scan {
        /// Directory or file to scan
        path: PathBuf,

        /// Parser family: definition-finder, fact-scan
        #[arg(long, short = 'p', value_name = "PARSER")]
        parser: Option<String>,

        /// Collision policy: last-wins, first-wins, error
        #[arg(long, value_name = "POLICY")]
        collision: Option<String>,

        /// Skip files that fail to parse instead of aborting
        #[arg(long)]
        skip_unparseable: bool,

        /// Parse files in parallel
        #[arg(long)]
        parallel: bool,

        /// Output format: text, json
        #[arg(long, value_name = "FORMAT")]
        format: Option<String>,
    },

    /// Check that both parser families produce the same map
    Check {
        /// Root directory to compare over
        root: PathBuf,

        /// Ignore entries whose path contains this substring
        #[arg(long, value_name = "SUBSTRING")]
        exclude: Option<String>,

        /// Output format: text, json
        #[arg(long, value_name = "FORMAT")]
        format: Option<String>,
    },

    /// List parser families
    Parsers {
        /// Output format: text, json
        #[arg(long, value_name = "FORMAT")]
        format: Option<String>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log_file {
        let path = logging::init_logger(Some(log_path))?;
        if cli.verbose {
            eprintln!("{}: {}", "Logging to".bold(), path.display());
        }
    }

    let config = load_config(&cli)?;

    let capabilities = Capabilities::detect();

    match &cli.command {
        Command::Scan {
            path,
            parser,
            collision,
            skip_unparseable,
            parallel,
            format,
        } => {
            let format = output_format(format.as_deref(), &config)?;
            let family = config
                .parser_family(parser.as_deref())?
                .unwrap_or_else(|| default_family(capabilities));
            let options = config.scan_options(collision.as_deref(), *skip_unparseable, *parallel)?;

            let builder = if path.is_file() {
                Scanner::from_file_with(path, family, &options)?
            } else {
                Scanner::from_tree_with(path, family, &options)?
            };

            output::print_scan(format, path, &builder, cli.verbose)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check {
            root,
            exclude,
            format,
        } => {
            let format = output_format(format.as_deref(), &config)?;
            let exclude = config.exclude(exclude.as_deref());
            let options = config.scan_options(None, false, false)?;

            match check_available(root, &exclude, capabilities, &options)? {
                CheckOutcome::Compared(report) => {
                    output::print_report(format, &report)?;
                    if report.is_consistent() {
                        Ok(ExitCode::SUCCESS)
                    } else {
                        Ok(ExitCode::from(1))
                    }
                }
                CheckOutcome::ReferenceOnly { reason, map } => {
                    output::print_reference_only(format, &reason, &map)?;
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Command::Parsers { format } => {
            let format = output_format(format.as_deref(), &config)?;
            output::print_parsers(format, capabilities)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    if cli.no_config {
        return Ok(Config::default());
    }

    if let Some(config_path) = &cli.config {
        let config = Config::load_path(config_path)?;
        logging::log(&format!("Loaded config from: {}", config_path.display()));
        if cli.verbose {
            eprintln!("{}: {}", "Using config".bold(), config_path.display());
        }
        return Ok(config);
    }

    match Config::load()? {
        Some((config, path)) => {
            logging::log(&format!("Loaded config from: {}", path.display()));
            if cli.verbose {
                eprintln!("{}: {}", "Using config".bold(), path.display());
            }
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

/// CLI flag first, then the config file
fn output_format(cli_format: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match cli_format.or(config.output.format.as_deref()) {
        Some(name) => OutputFormat::from_str(name)
            .ok_or_else(|| anyhow!("Invalid output format '{}'. Valid options: text, json", name)),
        None => Ok(OutputFormat::default()),
    }
}

/// The fast family when this build has it
fn default_family(capabilities: Capabilities) -> ParserFamily {
    if capabilities.supports(ParserFamily::FactScan) {
        ParserFamily::FactScan
    } else {
        ParserFamily::DefinitionFinder
    }
}

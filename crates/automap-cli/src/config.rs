//! Configuration file support for automap
//!
//! Loads `.automap.toml` from the current directory or parent directories.

use anyhow::{anyhow, Context, Result};
use automap_scan::{CollisionPolicy, ParserFamily, ScanOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".automap.toml";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub check: CheckConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Parser family: "definition-finder" or "fact-scan"
    pub parser: Option<String>,
    /// "last-wins", "first-wins" or "error"
    pub collision: Option<String>,
    pub skip_unparseable: bool,
    pub parallel: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Drop map entries whose path contains this substring before comparing
    pub exclude: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text" or "json"
    pub format: Option<String>,
}

impl Config {
    /// Load config from `.automap.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Parser family named by the CLI or the config, if any
    pub fn parser_family(&self, cli_parser: Option<&str>) -> Result<Option<ParserFamily>> {
        cli_parser
            .or(self.scan.parser.as_deref())
            .map(|name| name.parse::<ParserFamily>().map_err(anyhow::Error::from))
            .transpose()
    }

    /// Scan options with CLI flags layered over the config
    pub fn scan_options(
        &self,
        cli_collision: Option<&str>,
        skip_unparseable: bool,
        parallel: bool,
    ) -> Result<ScanOptions> {
        let collision = match cli_collision.or(self.scan.collision.as_deref()) {
            Some(name) => CollisionPolicy::from_str(name).ok_or_else(|| {
                anyhow!(
                    "Invalid collision policy '{}'. Valid options: last-wins, first-wins, error",
                    name
                )
            })?,
            None => CollisionPolicy::default(),
        };

        Ok(ScanOptions::new()
            .collision(collision)
            .skip_unparseable(skip_unparseable || self.scan.skip_unparseable)
            .parallel(parallel || self.scan.parallel))
    }

    pub fn exclude(&self, cli_exclude: Option<&str>) -> String {
        cli_exclude
            .or(self.check.exclude.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

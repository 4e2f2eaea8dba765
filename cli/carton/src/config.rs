//! `carton.toml` configuration parsing.
//!
//! A carton.toml in the working directory (or any ancestor) supplies
//! defaults for the registry location, output directory, cache, and lock
//! file. Every field is optional; flags and the `CARTON_CACHE` environment
//! variable win over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Optional configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartonConfig {
    /// Root directory of the local registry store.
    #[serde(default)]
    pub registry_root: Option<PathBuf>,
    /// Default output directory for pulled files.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Blob cache directory (overridden by `CARTON_CACHE`).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Lock file path for `carton resolve`.
    #[serde(default)]
    pub lock_file: Option<PathBuf>,
}

impl CartonConfig {
    /// Parse a configuration from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        toml::from_str(input).context("parsing carton.toml")
    }

    /// Search for a `carton.toml` starting at `start_dir` and walking up.
    ///
    /// Returns the config and the directory it was found in, or `None` when
    /// no configuration file exists.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join("carton.toml");
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config = Self::parse(&content)?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }
}

/// The cache root: `CARTON_CACHE` wins, then the config file.
pub fn cache_root(config: &CartonConfig) -> Option<PathBuf> {
    std::env::var_os("CARTON_CACHE")
        .map(PathBuf::from)
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| config.cache_dir.clone())
}

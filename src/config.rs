//! Configuration loading.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::port_table::FunctionPortTable;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Extra function-port entries: `part → port → linked port`. Part and port
    /// names match case-insensitively.
    #[serde(default)]
    pub port_table: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory exported block XML files are written to
    #[serde(default = "default_export_dir")]
    pub dir: Utf8PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Parameter library blocks publish their version under
    #[serde(default = "default_version_parameter")]
    pub version_parameter: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            version_parameter: default_version_parameter(),
        }
    }
}

/// Central block library: block name → expected version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub blocks: BTreeMap<String, String>,
}

fn default_export_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("exports")
}

fn default_version_parameter() -> String {
    "libVersion".to_string()
}

impl Config {
    /// Built-in function-port table with the configured entries merged on top.
    pub fn function_port_table(&self) -> FunctionPortTable {
        let mut table = FunctionPortTable::builtin();
        table.extend(&self.port_table);
        table
    }
}

/// Load configuration from a TOML file; a missing file yields defaults.
pub fn load_config(path: &Utf8Path) -> Result<Config> {
    if !path.exists() {
        info!(%path, "config file not found, using defaults");
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("Failed to read config {}", path))?;
    parse_config(&text).with_context(|| format!("Failed to parse config {}", path))
}

pub fn parse_config(text: &str) -> Result<Config> {
    Ok(toml::from_str(text)?)
}

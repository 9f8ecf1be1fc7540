//! Settings loaded from `arcx.toml`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Result;

/// Name of the configuration file looked up next to the working directory
pub const CONFIG_FILE: &str = "arcx.toml";

/// Top level configuration, every missing key falls back to its default
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[builder(default)]
    pub limits: Limits,

    #[builder(default)]
    pub tool: ToolSettings,

    #[builder(default)]
    pub export: ExportSettings,
}

/// Ceilings applied by the field validator and the property reader
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Longest accepted resource name, in bytes
    #[builder(default = 256)]
    pub max_filename_length: u64,

    /// Most directory entries a single archive may declare
    #[builder(default = 1_000_000)]
    pub max_entry_count: u64,

    /// Largest accepted texture width or height
    #[builder(default = 16384)]
    pub max_dimension: u64,

    /// Deepest nesting of struct and array properties
    #[builder(default = 32)]
    pub max_property_depth: usize,
}

/// External bulk decompression tool
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Executable name or path
    #[builder(default = PathBuf::from("quickbms"), into)]
    pub program: PathBuf,

    /// Arguments placed before the standard ones, e.g. an interpreter's script
    #[builder(default)]
    pub leading_args: Vec<String>,
}

#[derive(Builder, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Replace files that already exist in the output directory
    #[builder(default)]
    pub overwrite: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::builder().build()
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits::builder().build()
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        ToolSettings::builder().build()
    }
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load settings from `path`, or the defaults when the file does not exist
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no configuration file, using defaults");
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Write settings to `path`, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

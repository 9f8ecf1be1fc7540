pub mod extract;
pub mod formats;
pub mod list;

use std::{path::PathBuf, sync::Arc};

use arcx_core::{matcher::Opened, Container, Filter, Settings};
use clap::Args;
use miette::{Context, Result};
use tracing::debug;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// List the resources of an archive
    List(list::ListArgs),
    /// Extract the resources of an archive into a directory
    Extract(extract::ExtractArgs),
    /// Show the formats that can be opened
    Formats(formats::FormatsArgs),
}

impl Commands {
    pub fn handle(&self) -> Result<()> {
        match self {
            Commands::List(list) => list.handle(),
            Commands::Extract(extract) => extract.handle(),
            Commands::Formats(formats) => formats.handle(),
        }
    }
}

/// Options shared by every command that opens an archive
#[derive(Args)]
pub struct InputArgs {
    /// An input archive
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Read the input as this format instead of detecting it
    #[arg(long, value_name = "ID")]
    pub format: Option<String>,

    /// Only keep resources matching `column=pattern` (or a name pattern); repeatable
    #[arg(long, value_name = "FILTER")]
    pub filter: Vec<Filter>,

    /// Settings file, defaults apply when it does not exist
    #[arg(long, value_name = "FILE", default_value = "arcx.toml")]
    pub config: PathBuf,
}

impl InputArgs {
    pub fn settings(&self) -> Result<Settings> {
        Settings::load(&self.config).context(format!("config: {}", self.config.display()))
    }

    /// Open the input and apply every filter
    pub fn open(&self, settings: &Settings) -> Result<Opened> {
        let container = Arc::new(
            Container::from_path(&self.input)
                .context(format!("path: {}", self.input.display()))?,
        );

        let registry = arcx_formats::builtin_registry();
        let mut opened = match &self.format {
            Some(id) => registry.open_with(id, container, settings)?,
            None => registry.open(container, settings)?,
        };
        debug!(plugin = opened.plugin, attempts = ?opened.report.attempts, "opened input");

        for filter in &self.filter {
            opened.table.retain(filter);
        }
        Ok(opened)
    }
}

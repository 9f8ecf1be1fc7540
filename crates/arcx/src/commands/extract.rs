use std::path::PathBuf;

use arcx_core::{
    export::{export_all, ExportOptions},
    CancellationToken, ExtractStatus,
};
use clap::Args;
use miette::{miette, Result};
use owo_colors::{OwoColorize, Stream};
use tracing::info;

use super::InputArgs;

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    input: InputArgs,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// Allow overwriting files in the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let settings = self.input.settings()?;
        let mut opened = self.input.open(&settings)?;

        let options = ExportOptions::builder()
            .out_dir(&self.output)
            .overwrite(self.overwrite || settings.export.overwrite)
            .build();
        info!(count = opened.table.len(), out_dir = %self.output.display(), "extracting");

        let report = export_all(&mut opened.table, &options, &CancellationToken::new())?;

        for failure in &report.failures {
            eprintln!(
                "{} {}: {}",
                "failed".if_supports_color(Stream::Stderr, |t| t.red()),
                failure.name,
                failure.reason
            );
        }
        println!(
            "extracted {} of {} resources into {}",
            report.exported,
            opened.table.len(),
            self.output.display()
        );

        match report.status {
            ExtractStatus::None if !opened.table.is_empty() => {
                Err(miette!("no resource could be extracted"))
            }
            _ => Ok(()),
        }
    }
}

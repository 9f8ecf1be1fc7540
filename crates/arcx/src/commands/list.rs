use arcx_core::Column;
use clap::Args;
use itertools::Itertools;
use miette::Result;
use owo_colors::{OwoColorize, Stream};

use super::InputArgs;

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Columns to print, comma separated
    #[arg(
        long,
        value_name = "COLUMNS",
        value_delimiter = ',',
        default_value = "name,compressed_length,decompressed_length,compression"
    )]
    fields: Vec<Column>,

    /// Sort on this column instead of keeping the archive order
    #[arg(long, value_name = "COLUMN")]
    sort: Option<Column>,

    /// Sort from the largest value down
    #[arg(long, default_value_t = false, requires = "sort")]
    descending: bool,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let settings = self.input.settings()?;
        let mut opened = self.input.open(&settings)?;

        if let Some(column) = self.sort {
            opened.table.sort_by(column, !self.descending);
        }

        let header = self.fields.iter().join("\t");
        println!("{}", header.if_supports_color(Stream::Stdout, |t| t.bold()));
        for resource in &opened.table {
            println!(
                "{}",
                self.fields
                    .iter()
                    .map(|column| column.display_value(resource))
                    .join("\t")
            );
        }

        println!(
            "{} resources, {} format",
            opened.table.len(),
            opened.plugin.if_supports_color(Stream::Stdout, |t| t.green())
        );
        Ok(())
    }
}

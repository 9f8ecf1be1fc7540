use clap::Args;
use itertools::Itertools;
use miette::Result;
use owo_colors::{OwoColorize, Stream};

#[derive(Args)]
pub struct FormatsArgs {}

impl FormatsArgs {
    pub fn handle(&self) -> Result<()> {
        for plugin in arcx_formats::builtin_registry().iter() {
            println!(
                "{:<8} {} ({})",
                plugin.id().if_supports_color(Stream::Stdout, |t| t.bold()),
                plugin.name(),
                plugin.extensions().iter().map(|e| format!(".{e}")).join(", ")
            );
        }
        Ok(())
    }
}

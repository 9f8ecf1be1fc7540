use std::io::{self, Read, Write};

use tracing::instrument;

use super::{initial_capacity, Exporter, ResourceReader, RAW_TAG};
use crate::{error::Result, io::ArchiveSource, resource::Resource};

/// Copies the stored bytes unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct RawExporter;

impl Exporter for RawExporter {
    fn tag(&self) -> &str {
        RAW_TAG
    }

    #[instrument(skip_all, fields(name = resource.name()))]
    fn produce(&self, source: &mut ArchiveSource, resource: &Resource) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(initial_capacity(resource.compressed_length()));
        ResourceReader::raw(source, resource)?.read_to_end(&mut out)?;
        Ok(out)
    }

    fn produce_to(
        &self,
        source: &mut ArchiveSource,
        resource: &Resource,
        out: &mut dyn Write,
    ) -> Result<u64> {
        let mut reader = ResourceReader::raw(source, resource)?;
        Ok(io::copy(&mut reader, out)?)
    }
}

use std::io::Read;

use tracing::instrument;

use super::{initial_capacity, Exporter, ResourceReader};
use crate::{
    error::{Error, Result},
    io::ArchiveSource,
    resource::Resource,
};

/// Inflates zlib streams
#[derive(Debug, Default, Clone, Copy)]
pub struct ZlibExporter;

impl Exporter for ZlibExporter {
    fn tag(&self) -> &str {
        "zlib"
    }

    #[instrument(skip_all, fields(name = resource.name()))]
    fn produce(&self, source: &mut ArchiveSource, resource: &Resource) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(initial_capacity(resource.decompressed_length()));
        ResourceReader::zlib(source, resource)?
            .read_to_end(&mut out)
            .map_err(|e| Error::DecompressionFailed(format!("{}: {e}", resource.name())))?;

        if out.len() as u64 != resource.decompressed_length() {
            return Err(Error::DecompressionFailed(format!(
                "{}: expected {} bytes, inflated {}",
                resource.name(),
                resource.decompressed_length(),
                out.len()
            )));
        }
        Ok(out)
    }
}

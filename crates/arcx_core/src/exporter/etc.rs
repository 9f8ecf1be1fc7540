use arcx_etc::{decode_image, BlockFormat};
use derive_more::derive::Constructor;
use tracing::instrument;

use super::Exporter;
use crate::{error::Result, io::ArchiveSource, resource::Resource};

/// Decodes an ETC compressed texture into RGBA8 rows
#[derive(Debug, Clone, Copy, Constructor)]
pub struct EtcExporter {
    format: BlockFormat,
    width: usize,
    height: usize,
}

impl EtcExporter {
    /// Size of the decoded image in bytes
    pub fn decoded_length(&self) -> u64 {
        (self.width * self.height * 4) as u64
    }
}

impl Exporter for EtcExporter {
    fn tag(&self) -> &str {
        self.format.name()
    }

    #[instrument(skip_all, fields(name = resource.name(), format = %self.format))]
    fn produce(&self, source: &mut ArchiveSource, resource: &Resource) -> Result<Vec<u8>> {
        source.seek(resource.offset())?;
        let blocks = source.read_bytes(resource.compressed_length())?;
        Ok(decode_image(self.format, &blocks, self.width, self.height)?)
    }
}

//! **PKM** textures, a single ETC compressed image behind a 16 byte header.
//!
//! | Offset | Field         | Notes                                    |
//! |--------|---------------|------------------------------------------|
//! | 0      | magic         | `PKM `                                   |
//! | 4      | version       | `10` (ETC1 only) or `20`                 |
//! | 6      | format        | `u16`, see [`PkmHeader::block_format`]   |
//! | 8      | padded width  | `u16`, rounded up to whole blocks        |
//! | 10     | padded height | `u16`                                    |
//! | 12     | width         | `u16`                                    |
//! | 14     | height        | `u16`                                    |
//! | 16     | blocks        | row by row                               |
//!
//! All header fields are big endian. The texture is exposed as one resource that exports to
//! tightly packed RGBA8 rows.

use std::{io::Cursor, sync::Arc};

use arcx_core::{
    exporter::EtcExporter, validate, ArchiveSource, Container, FormatPlugin, ReadContext,
    Resource, ResourceTable,
};
use arcx_etc::{image::compressed_size, BlockFormat};
use binrw::{BinRead, BinWrite};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

pub const MAGIC: &[u8; 4] = b"PKM ";

pub const HEADER_SIZE: u64 = 16;

const FORMAT: &str = "PKM";

#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(big, magic = b"PKM ")]
pub struct PkmHeader {
    pub version: [u8; 2],
    pub format: u16,
    pub padded_width: u16,
    pub padded_height: u16,
    pub width: u16,
    pub height: u16,
}

impl PkmHeader {
    /// Block layout named by the format field
    pub fn block_format(&self) -> Result<BlockFormat> {
        match (&self.version, self.format) {
            (b"10", 0) | (b"20", 0) => Ok(BlockFormat::Etc1),
            (b"20", 1) => Ok(BlockFormat::Etc2Rgb),
            (b"20", 2 | 3) => Ok(BlockFormat::Etc2Eac),
            (b"20", 4) => Ok(BlockFormat::Etc2Punchthrough),
            _ => Err(Error::UnsupportedTexture {
                version: String::from_utf8_lossy(&self.version).into_owned(),
                format: self.format,
            }),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PkmPlugin;

impl FormatPlugin for PkmPlugin {
    fn id(&self) -> &'static str {
        "pkm"
    }

    fn name(&self) -> &'static str {
        "PKM texture"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["pkm"]
    }

    fn rate(&self, container: &Container, source: &mut ArchiveSource) -> arcx_core::Result<u8> {
        if source.len() < HEADER_SIZE {
            return Ok(0);
        }
        let bytes = source.read_bytes(6)?;
        if !bytes.starts_with(MAGIC) {
            return Ok(0);
        }

        let mut confidence = 50;
        if matches!(&bytes[4..], b"10" | b"20") {
            confidence += 20;
        }
        if container.extension().as_deref() == Some("pkm") {
            confidence += 30;
        }
        Ok(confidence)
    }

    #[instrument(skip_all, fields(path = %context.container.path().display()))]
    fn read(
        &self,
        source: &mut ArchiveSource,
        context: &ReadContext<'_>,
    ) -> arcx_core::Result<ResourceTable> {
        read_texture(source, context).map_err(|e| e.into_core(FORMAT))
    }
}

fn read_texture(source: &mut ArchiveSource, context: &ReadContext<'_>) -> Result<ResourceTable> {
    source.seek(0)?;
    let header = PkmHeader::read(&mut Cursor::new(source.read_bytes(HEADER_SIZE)?))?;
    debug!(?header, "read header");

    let format = header.block_format()?;
    let (width, height) = (u64::from(header.width), u64::from(header.height));
    validate::dimensions_in_range(width, height, &context.settings.limits)?;

    if header.padded_width.div_ceil(4) != header.width.div_ceil(4)
        || header.padded_height.div_ceil(4) != header.height.div_ceil(4)
    {
        return Err(Error::PaddedSize {
            padded_width: header.padded_width,
            padded_height: header.padded_height,
            width: header.width,
            height: header.height,
        });
    }

    let (width, height) = (usize::from(header.width), usize::from(header.height));
    let stored = compressed_size(format, width, height) as u64;
    validate::length_fits(stored, HEADER_SIZE, source.len())?;

    let exporter = EtcExporter::new(format, width, height);
    let stem = context
        .container
        .path()
        .file_stem()
        .map_or_else(|| "texture".into(), |s| s.to_string_lossy());

    let resource = Resource::builder()
        .name(format!("{stem}.rgba"))
        .offset(HEADER_SIZE)
        .compressed_length(stored)
        .decompressed_length(exporter.decoded_length())
        .exporter(Arc::new(exporter))
        .container(context.container.clone())
        .build();

    Ok([resource].into_iter().collect())
}

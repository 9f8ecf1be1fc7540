//! The **TRE** archive format used by *Star Wars Galaxies*.
//!
//! | Offset         | Content                                                       |
//! |----------------|---------------------------------------------------------------|
//! | 0              | [`TreHeader`], 36 bytes, magic `EERT5000`                     |
//! | 36             | entry data, each entry stored raw or as a zlib stream         |
//! | `record_start` | record block, one 24 byte [`TreRecord`] per entry (may be zlib) |
//! | after records  | name block, null terminated names (may be zlib)               |
//!
//! Every record carries the CRC-32/BZIP2 of its name. A mismatch is logged but does not reject
//! the archive.

mod types;

use std::{
    io::{Cursor, Read},
    sync::Arc,
};

use arcx_core::{
    exporter::{RawExporter, ZlibExporter},
    validate, ArchiveSource, Container, Exporter, FormatPlugin, ReadContext, Resource,
    ResourceTable,
};
use binrw::BinRead;
use crc::{Crc, CRC_32_BZIP2};
use flate2::read::ZlibDecoder;
use tracing::{debug, instrument, warn};

pub use types::{CompressionMethod, TreHeader, TreRecord, HEADER_SIZE, RECORD_SIZE};

use crate::error::{Error, Result};

/// First eight bytes of every TRE file
pub const MAGIC: &[u8; 8] = b"EERT5000";

/// Checksum stored with every record
pub const NAME_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_BZIP2);

const FORMAT: &str = "TRE";

/// Largest buffer reserved up front for an inflated block
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct TrePlugin;

impl FormatPlugin for TrePlugin {
    fn id(&self) -> &'static str {
        "tre"
    }

    fn name(&self) -> &'static str {
        "TRE archive"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tre"]
    }

    fn rate(&self, container: &Container, source: &mut ArchiveSource) -> arcx_core::Result<u8> {
        if source.len() < HEADER_SIZE {
            return Ok(0);
        }
        let bytes = source.read_bytes(HEADER_SIZE)?;
        if !bytes.starts_with(MAGIC) {
            return Ok(0);
        }

        let mut confidence = 60;
        if container.extension().as_deref() == Some("tre") {
            confidence += 30;
        }
        if TreHeader::read(&mut Cursor::new(&bytes)).is_ok_and(|h| h.is_plausible(source.len())) {
            confidence += 10;
        }
        Ok(confidence)
    }

    #[instrument(skip_all, fields(path = %context.container.path().display()))]
    fn read(
        &self,
        source: &mut ArchiveSource,
        context: &ReadContext<'_>,
    ) -> arcx_core::Result<ResourceTable> {
        read_archive(source, context).map_err(|e| e.into_core(FORMAT))
    }
}

/// Read a directory block, inflating it if needed, and make sure it holds `expected` bytes
fn read_block(
    source: &mut ArchiveSource,
    block: &'static str,
    start: u64,
    stored: u64,
    compression: CompressionMethod,
    expected: u64,
) -> Result<Vec<u8>> {
    if expected == 0 {
        return Ok(Vec::new());
    }

    validate::length_fits(stored, start, source.len())?;
    source.seek(start)?;
    let bytes = source.read_bytes(stored)?;

    let data = match compression {
        CompressionMethod::None => bytes,
        CompressionMethod::Zlib => {
            let mut inflated = Vec::with_capacity(expected.min(MAX_PREALLOCATION) as usize);
            ZlibDecoder::new(bytes.as_slice())
                .take(expected)
                .read_to_end(&mut inflated)
                .map_err(|source| Error::Inflate { block, source })?;
            inflated
        }
    };

    if (data.len() as u64) < expected {
        return Err(Error::ShortBlock {
            block,
            expected,
            actual: data.len() as u64,
        });
    }
    Ok(data)
}

/// The null terminated name starting at `offset`
fn name_at(names: &[u8], offset: u32) -> Result<&[u8]> {
    let rest = names
        .get(offset as usize..)
        .filter(|rest| !rest.is_empty())
        .ok_or(Error::NameOffset {
            offset,
            len: names.len(),
        })?;
    let end = rest.iter().position(|b| *b == 0).unwrap_or(rest.len());
    Ok(&rest[..end])
}

fn read_archive(source: &mut ArchiveSource, context: &ReadContext<'_>) -> Result<ResourceTable> {
    let size = source.len();
    let limits = &context.settings.limits;

    source.seek(0)?;
    let header = TreHeader::read(&mut Cursor::new(source.read_bytes(HEADER_SIZE)?))?;
    debug!(?header, "read header");

    let count = u64::from(header.records);
    validate::entry_count_in_range(count, limits)?;
    if count == 0 {
        return Ok(ResourceTable::new());
    }
    validate::offset_in_range(u64::from(header.record_start), size)?;

    let records = read_block(
        source,
        "record",
        u64::from(header.record_start),
        u64::from(header.record_compressed),
        header.record_compression,
        count * RECORD_SIZE,
    )?;
    let names = read_block(
        source,
        "name",
        header.name_start(),
        u64::from(header.name_compressed),
        header.name_compression,
        u64::from(header.name_uncompressed),
    )?;

    let raw: Arc<dyn Exporter> = Arc::new(RawExporter);
    let zlib: Arc<dyn Exporter> = Arc::new(ZlibExporter);

    let mut cursor = Cursor::new(records);
    let mut table = ResourceTable::new();
    for _ in 0..count {
        let record = TreRecord::read(&mut cursor)?;

        let name = name_at(&names, record.name_offset)?;
        validate::filename_length_in_range(name.len() as u64, limits)?;
        let checksum = NAME_CRC.checksum(name);
        let name = String::from_utf8_lossy(name).into_owned();
        if checksum != record.checksum {
            warn!(
                %name,
                stored = record.checksum,
                computed = checksum,
                "name checksum mismatch"
            );
        }

        let offset = u64::from(record.data_offset);
        let stored = u64::from(record.data_compressed);
        validate::offset_in_range(offset, size)?;
        validate::length_fits(stored, offset, size)?;

        let (exporter, decompressed) = match record.data_compression {
            CompressionMethod::Zlib => (zlib.clone(), u64::from(record.data_uncompressed)),
            CompressionMethod::None => (raw.clone(), stored),
        };

        table.add(
            Resource::builder()
                .name(name)
                .offset(offset)
                .compressed_length(stored)
                .decompressed_length(decompressed)
                .exporter(exporter)
                .container(context.container.clone())
                .build(),
        );
    }

    debug!(count = table.len(), "read records");
    Ok(table)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn names_are_looked_up_by_offset() -> Result<()> {
        let names = b"hello.txt\0world.txt\0";
        assert_eq!(name_at(names, 0)?, b"hello.txt");
        assert_eq!(name_at(names, 10)?, b"world.txt");
        assert_eq!(name_at(names, 6)?, b"txt");
        assert!(matches!(
            name_at(names, 20),
            Err(Error::NameOffset { offset: 20, len: 20 })
        ));
        Ok(())
    }

    #[test]
    fn name_checksum() {
        assert_eq!(NAME_CRC.checksum(b"123456789"), 0xFC89_1918);
        assert_eq!(NAME_CRC.checksum(b"hello.txt"), 0x527E_30AA);
    }
}

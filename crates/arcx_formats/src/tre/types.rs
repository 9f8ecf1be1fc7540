//! On-disk structures of a TRE archive.

use binrw::{BinRead, BinWrite};

/// Size of [`TreHeader`] including its magic
pub const HEADER_SIZE: u64 = 36;

/// Size of one [`TreRecord`]
pub const RECORD_SIZE: u64 = 24;

/// How a block of a TRE file is stored
#[derive(BinRead, BinWrite, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[brw(repr = u32)]
pub enum CompressionMethod {
    /// Stored as is
    #[default]
    None = 0,

    /// Zlib stream
    Zlib = 2,
}

/// TRE file header
///
/// Starts with the reversed tag "TREE" and the version "0005". Little endian throughout.
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq, Eq)]
#[brw(magic = b"EERT5000", little)]
pub struct TreHeader {
    /// Number of records
    pub records: u32,

    /// Absolute offset of the record block
    pub record_start: u32,

    pub record_compression: CompressionMethod,

    /// Stored size of the record block
    pub record_compressed: u32,

    pub name_compression: CompressionMethod,

    /// Stored size of the name block, which follows the record block
    pub name_compressed: u32,

    /// Size of the name block once inflated
    pub name_uncompressed: u32,
}

impl Default for TreHeader {
    fn default() -> Self {
        Self {
            records: 0,
            record_start: HEADER_SIZE as u32,
            record_compression: CompressionMethod::None,
            record_compressed: 0,
            name_compression: CompressionMethod::None,
            name_compressed: 0,
            name_uncompressed: 0,
        }
    }
}

impl TreHeader {
    /// Absolute offset of the name block
    pub fn name_start(&self) -> u64 {
        u64::from(self.record_start) + u64::from(self.record_compressed)
    }

    /// Whether both directory blocks lie inside a file of `size` bytes
    pub fn is_plausible(&self, size: u64) -> bool {
        u64::from(self.record_start) >= HEADER_SIZE
            && self.name_start() + u64::from(self.name_compressed) <= size
    }
}

/// One directory entry
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct TreRecord {
    /// [`crc::CRC_32_BZIP2`] of the entry name
    pub checksum: u32,

    pub data_uncompressed: u32,

    /// Absolute offset of the entry data
    pub data_offset: u32,

    pub data_compression: CompressionMethod,

    /// Stored size of the entry data
    pub data_compressed: u32,

    /// Offset of the null terminated name inside the name block
    pub name_offset: u32,
}

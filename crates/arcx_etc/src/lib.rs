//! This library decodes **ETC1**, **ETC2** and **ETC2 + EAC** compressed texture blocks.
//!
//! # Block Format Documentation
//!
//! Every ETC color block is 8 bytes and expands into a 4x4 tile of RGBA8 pixels. The first four
//! bytes carry base colors and per-block flags, the last four bytes carry two bits of index for
//! each of the 16 pixels. Pixel indices are stored column by column (pixel `a` is `x=0,y=0`,
//! pixel `b` is `x=0,y=1`, ...), while the decoded output is always row-major.
//!
//! | Byte | Individual (`diff = 0`)    | Differential (`diff = 1`)           |
//! |------|----------------------------|-------------------------------------|
//! | 0    | R1 (4 bits), R2 (4 bits)   | R (5 bits), dR (3 bits, signed)     |
//! | 1    | G1 (4 bits), G2 (4 bits)   | G (5 bits), dG (3 bits, signed)     |
//! | 2    | B1 (4 bits), B2 (4 bits)   | B (5 bits), dB (3 bits, signed)     |
//! | 3    | table 1 (3), table 2 (3), diff (1), flip (1)                     |
//! | 4-5  | most significant index bit of each pixel                         |
//! | 6-7  | least significant index bit of each pixel                        |
//!
//! ## ETC2 Modes
//!
//! ETC2 reuses the differential layout. When adding the signed delta to a 5 bit base channel
//! overflows the 0..=31 range, the block is not differential but one of three extra modes. The
//! overflow is detected with the `0xFF07` sentinel mask and tested on red, then green, then blue:
//!
//! - red overflows: **T mode**, two 4-bit base colors and a distance from a table of eight
//! - green overflows: **H mode**, like T but the distance is shared symmetrically by both colors
//! - blue overflows: **planar mode**, three 6-7-6 colors interpolated across the tile
//!
//! The punch-through variant (`ETC2 RGB8A1`) repurposes the `diff` bit as an *opaque* flag. In
//! non-opaque blocks pixel index 2 is fully transparent.
//!
//! ## EAC Alpha
//!
//! `ETC2 RGBA8` blocks are 16 bytes: an 8 byte EAC alpha block followed by an ETC2 color block.
//! The alpha block holds a base value, a multiplier, a modifier table index and 16 3-bit indices.
//!
//! ## Output
//!
//! Decoded pixels are packed into `u32` words as `R | G << 8 | B << 16 | A << 24`, so
//! `u32::to_le_bytes` yields RGBA bytes.
//!

pub mod clamp;
pub mod eac;
pub mod error;
pub mod etc1;
pub mod etc2;
pub mod image;
pub mod mode;

pub use clamp::clamp_0_to_255;
pub use error::{Error, Result};
pub use image::decode_image;
pub use mode::{DecodeFlags, Mode, ModeMask};

/// Number of pixels produced by a single block
pub const BLOCK_PIXELS: usize = 16;

/// A decoded 4x4 tile in row-major order
pub type Pixels = [u32; BLOCK_PIXELS];

/// Identifies the compressed layout of a block
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlockFormat {
    /// ETC1 RGB, individual and differential modes only
    Etc1,

    /// ETC2 RGB8, adds T, H and planar modes
    Etc2Rgb,

    /// ETC2 RGB8 with one bit punch-through alpha
    Etc2Punchthrough,

    /// ETC2 RGB8 with an EAC alpha block in front (16 byte blocks)
    Etc2Eac,
}

impl BlockFormat {
    /// Size of one compressed block in bytes
    pub const fn block_size(self) -> usize {
        match self {
            BlockFormat::Etc2Eac => 16,
            _ => 8,
        }
    }

    /// Every mode this format is able to encode
    pub const fn all_modes(self) -> ModeMask {
        match self {
            BlockFormat::Etc1 => ModeMask::ETC1,
            _ => ModeMask::ETC2,
        }
    }

    /// Short lowercase name, used as the exporter tag
    pub const fn name(self) -> &'static str {
        match self {
            BlockFormat::Etc1 => "etc1",
            BlockFormat::Etc2Rgb => "etc2",
            BlockFormat::Etc2Punchthrough => "etc2_a1",
            BlockFormat::Etc2Eac => "etc2_eac",
        }
    }
}

impl std::fmt::Display for BlockFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode a single block into 16 row-major packed RGBA8 pixels.
///
/// A block whose mode is not part of `mode_mask` (or that `flags` exclude) is
/// [declined](Error::Declined) rather than decoded to some placeholder color.
pub fn decode_block(
    format: BlockFormat,
    block: &[u8],
    mode_mask: ModeMask,
    flags: DecodeFlags,
) -> Result<Pixels> {
    if block.len() != format.block_size() {
        return Err(Error::InvalidBlockLength {
            expected: format.block_size(),
            actual: block.len(),
        });
    }

    let mut pixels = [0u32; BLOCK_PIXELS];
    let decoded = match format {
        BlockFormat::Etc1 => etc1::decode(color_bytes(block, 0), mode_mask, &mut pixels),
        BlockFormat::Etc2Rgb => etc2::decode(color_bytes(block, 0), mode_mask, &mut pixels),
        BlockFormat::Etc2Punchthrough => {
            etc2::decode_punchthrough(color_bytes(block, 0), mode_mask, flags, &mut pixels)
        }
        BlockFormat::Etc2Eac => {
            etc2::decode(color_bytes(block, 8), mode_mask, &mut pixels)
                && eac::apply_alpha(color_bytes(block, 0), &mut pixels)
        }
    };

    if decoded {
        Ok(pixels)
    } else {
        let color = match format {
            BlockFormat::Etc2Eac => color_bytes(block, 8),
            _ => color_bytes(block, 0),
        };
        Err(Error::Declined {
            format,
            mode: Mode::classify(format, color),
        })
    }
}

/// Convert a decoded tile into RGBA bytes
pub fn pixels_to_rgba(pixels: &Pixels) -> [u8; BLOCK_PIXELS * 4] {
    let mut out = [0u8; BLOCK_PIXELS * 4];
    for (chunk, pixel) in out.chunks_exact_mut(4).zip(pixels) {
        chunk.copy_from_slice(&pixel.to_le_bytes());
    }
    out
}

fn color_bytes(block: &[u8], start: usize) -> &[u8; 8] {
    block[start..start + 8]
        .try_into()
        .expect("block length was checked against the format")
}

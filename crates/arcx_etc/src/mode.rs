//! Mode selection masks and classification.

use std::fmt;
use std::ops::{BitAnd, BitOr};

use crate::BlockFormat;

/// Set of block modes a caller is willing to decode
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ModeMask(u32);

impl ModeMask {
    pub const NONE: ModeMask = ModeMask(0);
    pub const INDIVIDUAL: ModeMask = ModeMask(0x01);
    pub const DIFFERENTIAL: ModeMask = ModeMask(0x02);
    pub const T: ModeMask = ModeMask(0x04);
    pub const H: ModeMask = ModeMask(0x08);
    pub const PLANAR: ModeMask = ModeMask(0x10);

    /// Modes available to ETC1
    pub const ETC1: ModeMask = ModeMask(0x03);

    /// Modes available to every ETC2 variant
    pub const ETC2: ModeMask = ModeMask(0x1F);

    /// Raw bit representation
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when every mode of `other` is part of this mask
    pub const fn contains(self, other: ModeMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when the mask shares at least one mode with `other`
    pub const fn intersects(self, other: ModeMask) -> bool {
        self.0 & other.0 != 0
    }

    /// This mask without the modes in `other`
    pub const fn without(self, other: ModeMask) -> ModeMask {
        ModeMask(self.0 & !other.0)
    }
}

impl Default for ModeMask {
    fn default() -> Self {
        ModeMask::ETC2
    }
}

impl BitOr for ModeMask {
    type Output = ModeMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ModeMask(self.0 | rhs.0)
    }
}

impl BitAnd for ModeMask {
    type Output = ModeMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        ModeMask(self.0 & rhs.0)
    }
}

/// Extra constraints applied when decoding punch-through blocks
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct DecodeFlags(u32);

impl DecodeFlags {
    pub const NONE: DecodeFlags = DecodeFlags(0);

    /// Decline blocks that carry transparent pixels
    pub const OPAQUE_ONLY: DecodeFlags = DecodeFlags(0x02);

    /// Decline blocks flagged as fully opaque
    pub const NON_OPAQUE_ONLY: DecodeFlags = DecodeFlags(0x04);

    pub const fn contains(self, other: DecodeFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for DecodeFlags {
    type Output = DecodeFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        DecodeFlags(self.0 | rhs.0)
    }
}

/// The mode a color block is encoded in
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Mode {
    Individual,
    Differential,
    T,
    H,
    Planar,
    /// Differential layout whose deltas overflow, which ETC1 cannot represent
    Invalid,
}

impl Mode {
    /// Determine the mode of an 8 byte color block
    pub fn classify(format: BlockFormat, block: &[u8; 8]) -> Mode {
        let differential = block[3] & 2 != 0;
        match format {
            BlockFormat::Etc1 => {
                if !differential {
                    Mode::Individual
                } else if crate::etc1::differential_bases(block).is_some() {
                    Mode::Differential
                } else {
                    Mode::Invalid
                }
            }
            BlockFormat::Etc2Punchthrough => crate::etc2::overflow_mode(block),
            BlockFormat::Etc2Rgb | BlockFormat::Etc2Eac => {
                if differential {
                    crate::etc2::overflow_mode(block)
                } else {
                    Mode::Individual
                }
            }
        }
    }

    /// The mask bit selecting this mode
    pub const fn mask(self) -> ModeMask {
        match self {
            Mode::Individual => ModeMask::INDIVIDUAL,
            Mode::Differential => ModeMask::DIFFERENTIAL,
            Mode::T => ModeMask::T,
            Mode::H => ModeMask::H,
            Mode::Planar => ModeMask::PLANAR,
            Mode::Invalid => ModeMask::NONE,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Individual => "individual",
            Mode::Differential => "differential",
            Mode::T => "T",
            Mode::H => "H",
            Mode::Planar => "planar",
            Mode::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

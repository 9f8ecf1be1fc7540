//! ETC1 individual and differential modes.
//!
//! These routines are shared with ETC2, whose individual and differential blocks are identical
//! to ETC1 ones.

use crate::clamp::pack_rgb;
use crate::mode::ModeMask;
use crate::Pixels;

/// Intensity modifiers, indexed by table codeword then by pixel index
pub(crate) const MODIFIER_TABLE: [[i32; 4]; 8] = [
    [2, 8, -2, -8],
    [5, 17, -5, -17],
    [9, 29, -9, -29],
    [13, 42, -13, -42],
    [18, 60, -18, -60],
    [24, 80, -24, -80],
    [33, 106, -33, -106],
    [47, 183, -47, -183],
];

/// Every pixel index keeps its color
pub(crate) const OPAQUE_MASKS: [u32; 4] = [u32::MAX; 4];

/// Signed 3 bit deltas, already shifted into the top 5 bits of a channel
const COMPLEMENT3_SHIFTED: [i32; 8] = [0, 8, 16, 24, -32, -24, -16, -8];

/// Base colors of both subblocks
pub(crate) type Bases = ([i32; 3], [i32; 3]);

#[inline]
pub(crate) fn complement3_shifted(bits: u8) -> i32 {
    COMPLEMENT3_SHIFTED[usize::from(bits & 7)]
}

/// Big-endian index word holding the MSBs in the upper and the LSBs in the lower half
#[inline]
pub(crate) fn index_word(block: &[u8; 8]) -> u32 {
    u32::from_be_bytes([block[4], block[5], block[6], block[7]])
}

/// Two bit index of pixel `i`, counted column-major
#[inline]
pub(crate) fn pixel_index(word: u32, i: usize) -> usize {
    (((word >> i) & 1) | (((word >> (16 + i)) & 1) << 1)) as usize
}

/// Row-major output slot of the column-major pixel `i`
#[inline]
pub(crate) const fn output_slot(i: usize) -> usize {
    (i & 3) * 4 + (i >> 2)
}

/// Top 5 bits of a channel plus its signed delta, before replication
#[inline]
pub(crate) fn delta_channel(byte: u8) -> i32 {
    i32::from(byte & 0xF8) + complement3_shifted(byte)
}

#[inline]
fn replicate5(value: i32) -> i32 {
    value | ((value & 0xE0) >> 5)
}

/// Base colors of a differential block, `None` when a delta overflows a channel
pub(crate) fn differential_bases(block: &[u8; 8]) -> Option<Bases> {
    let mut first = [0; 3];
    let mut second = [0; 3];
    for channel in 0..3 {
        let byte = block[channel];
        first[channel] = replicate5(i32::from(byte & 0xF8));

        let shifted = delta_channel(byte);
        if shifted & 0xFF07 != 0 {
            return None;
        }
        second[channel] = replicate5(shifted);
    }
    Some((first, second))
}

/// Base colors of a differential block without the overflow check.
///
/// Only valid once T, H and planar modes have been ruled out.
pub(crate) fn differential_bases_unchecked(block: &[u8; 8]) -> Bases {
    let mut first = [0; 3];
    let mut second = [0; 3];
    for channel in 0..3 {
        let byte = block[channel];
        first[channel] = replicate5(i32::from(byte & 0xF8));
        second[channel] = replicate5(delta_channel(byte));
    }
    (first, second)
}

fn individual_bases(block: &[u8; 8]) -> Bases {
    let mut first = [0; 3];
    let mut second = [0; 3];
    for channel in 0..3 {
        let high = i32::from(block[channel] & 0xF0);
        let low = i32::from(block[channel] & 0x0F);
        first[channel] = high | (high >> 4);
        second[channel] = low | (low << 4);
    }
    (first, second)
}

/// Paint both subblocks, split vertically or (when flipped) horizontally.
pub(crate) fn fill_subblocks(
    block: &[u8; 8],
    bases: &Bases,
    modifiers: &[[i32; 4]; 8],
    masks: &[u32; 4],
    out: &mut Pixels,
) {
    let flip = block[3] & 1 != 0;
    let tables = [
        usize::from((block[3] & 0xE0) >> 5),
        usize::from((block[3] & 0x1C) >> 2),
    ];
    let word = index_word(block);

    for i in 0..16 {
        let first = if flip { i & 3 < 2 } else { i < 8 };
        let (base, table) = if first {
            (&bases.0, tables[0])
        } else {
            (&bases.1, tables[1])
        };

        let index = pixel_index(word, i);
        let modifier = modifiers[table][index];
        out[output_slot(i)] =
            pack_rgb(base[0] + modifier, base[1] + modifier, base[2] + modifier) & masks[index];
    }
}

/// Decode an ETC1 block, returning false when its mode is masked out or invalid
pub(crate) fn decode(block: &[u8; 8], mode_mask: ModeMask, out: &mut Pixels) -> bool {
    let differential = block[3] & 2 != 0;
    let bases = if differential {
        if !mode_mask.contains(ModeMask::DIFFERENTIAL) {
            return false;
        }
        match differential_bases(block) {
            Some(bases) => bases,
            None => return false,
        }
    } else {
        if !mode_mask.contains(ModeMask::INDIVIDUAL) {
            return false;
        }
        individual_bases(block)
    };

    fill_subblocks(block, &bases, &MODIFIER_TABLE, &OPAQUE_MASKS, out);
    true
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pixel_order_is_column_major() {
        assert_eq!(output_slot(0), 0);
        assert_eq!(output_slot(1), 4);
        assert_eq!(output_slot(3), 12);
        assert_eq!(output_slot(4), 1);
        assert_eq!(output_slot(15), 15);
    }

    #[test]
    fn pixel_index_combines_both_halves() {
        // msb of pixel 0 and lsb of pixel 1
        let word = 0x0001_0002;
        assert_eq!(pixel_index(word, 0), 2);
        assert_eq!(pixel_index(word, 1), 1);
        assert_eq!(pixel_index(word, 2), 0);
    }

    #[test]
    fn differential_overflow_is_detected() {
        // red 31 + 3 overflows
        let block = [0xFB, 0x00, 0x00, 0x02, 0, 0, 0, 0];
        assert!(differential_bases(&block).is_none());

        // red 0 - 4 underflows
        let block = [0x04, 0x00, 0x00, 0x02, 0, 0, 0, 0];
        assert!(differential_bases(&block).is_none());
    }
}

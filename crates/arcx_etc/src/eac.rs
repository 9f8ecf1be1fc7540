//! EAC alpha blocks, the first half of every ETC2 RGBA8 block.

use crate::clamp::clamp_0_to_255;
use crate::etc1::output_slot;
use crate::Pixels;

/// Alpha modifiers, indexed by table number then by 3 bit pixel index
const EAC_MODIFIER_TABLE: [[i32; 8]; 16] = [
    [-3, -6, -9, -15, 2, 5, 8, 14],
    [-3, -7, -10, -13, 2, 6, 9, 12],
    [-2, -5, -8, -13, 1, 4, 7, 12],
    [-2, -4, -6, -13, 1, 3, 5, 12],
    [-3, -6, -8, -12, 2, 5, 7, 11],
    [-3, -7, -9, -11, 2, 6, 8, 10],
    [-4, -7, -8, -11, 3, 6, 7, 10],
    [-3, -5, -8, -11, 2, 4, 7, 10],
    [-2, -6, -8, -10, 1, 5, 7, 9],
    [-2, -5, -8, -10, 1, 4, 7, 9],
    [-2, -4, -8, -10, 1, 3, 7, 9],
    [-2, -5, -7, -10, 1, 4, 6, 9],
    [-3, -4, -7, -10, 2, 3, 6, 9],
    [-1, -2, -3, -10, 0, 1, 2, 9],
    [-4, -6, -8, -9, 3, 5, 7, 8],
    [-3, -5, -7, -9, 2, 4, 6, 8],
];

/// Replace the alpha byte of every decoded pixel with the values of an EAC block.
///
/// Pixels are stored column-major like the color indices. Always succeeds, the
/// boolean keeps the signature in line with the color decoders.
pub(crate) fn apply_alpha(block: &[u8; 8], pixels: &mut Pixels) -> bool {
    let base = i32::from(block[0]);
    let multiplier = i32::from(block[1] >> 4);
    let table = &EAC_MODIFIER_TABLE[usize::from(block[1] & 0x0F)];

    let indices = block[2..]
        .iter()
        .fold(0u64, |word, byte| (word << 8) | u64::from(*byte));

    for i in 0..16 {
        let index = ((indices >> (45 - 3 * i)) & 7) as usize;
        let alpha = clamp_0_to_255(base + table[index] * multiplier);
        let slot = output_slot(i);
        pixels[slot] = (pixels[slot] & 0x00FF_FFFF) | (u32::from(alpha) << 24);
    }
    true
}

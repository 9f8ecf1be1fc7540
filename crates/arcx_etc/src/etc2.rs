//! ETC2 T, H and planar modes plus the punch-through alpha variant.

use crate::clamp::{clamp_0_to_255, pack_rgb};
use crate::etc1::{self, delta_channel, index_word, output_slot, pixel_index, OPAQUE_MASKS};
use crate::mode::{DecodeFlags, Mode, ModeMask};
use crate::Pixels;

/// Distances used to derive paint colors in T and H mode
const DISTANCE_TABLE: [i32; 8] = [3, 6, 11, 16, 23, 32, 41, 64];

/// Modifiers of non-opaque punch-through blocks, index 2 is the transparent slot
const PUNCHTHROUGH_MODIFIER_TABLE: [[i32; 4]; 8] = [
    [0, 8, 0, -8],
    [0, 17, 0, -17],
    [0, 29, 0, -29],
    [0, 42, 0, -42],
    [0, 60, 0, -60],
    [0, 80, 0, -80],
    [0, 106, 0, -106],
    [0, 183, 0, -183],
];

/// Pixel word masks of non-opaque punch-through blocks
const PUNCHTHROUGH_MASKS: [u32; 4] = [u32::MAX, u32::MAX, 0, u32::MAX];

#[inline]
fn extend4(value: i32) -> i32 {
    value | (value << 4)
}

/// Which mode a block in differential layout actually uses, by probing R then G then B
pub(crate) fn overflow_mode(block: &[u8; 8]) -> Mode {
    if delta_channel(block[0]) & 0xFF07 != 0 {
        Mode::T
    } else if delta_channel(block[1]) & 0xFF07 != 0 {
        Mode::H
    } else if delta_channel(block[2]) & 0xFF07 != 0 {
        Mode::Planar
    } else {
        Mode::Differential
    }
}

/// The four paint colors of a T or H mode block as `[r, g, b]`
fn paint_colors(block: &[u8; 8], mode: Mode) -> [[i32; 3]; 4] {
    let b = |i: usize| i32::from(block[i]);

    if mode == Mode::T {
        let first = [
            extend4(((b(0) & 0x18) >> 1) | (b(0) & 0x03)),
            extend4((b(1) & 0xF0) >> 4),
            extend4(b(1) & 0x0F),
        ];
        let second = [
            extend4((b(2) & 0xF0) >> 4),
            extend4(b(2) & 0x0F),
            extend4((b(3) & 0xF0) >> 4),
        ];
        let distance = DISTANCE_TABLE[(((b(3) & 0x0C) >> 1) | (b(3) & 0x01)) as usize];

        let shift = |color: [i32; 3], by: i32| color.map(|c| i32::from(clamp_0_to_255(c + by)));
        [first, shift(second, distance), second, shift(second, -distance)]
    } else {
        let first = [
            extend4((b(0) & 0x78) >> 3),
            extend4(((b(0) & 0x07) << 1) | ((b(1) & 0x10) >> 4)),
            extend4((b(1) & 0x08) | ((b(1) & 0x03) << 1) | ((b(2) & 0x80) >> 7)),
        ];
        let second = [
            extend4((b(2) & 0x78) >> 3),
            extend4(((b(2) & 0x07) << 1) | ((b(3) & 0x80) >> 7)),
            extend4((b(3) & 0x78) >> 3),
        ];

        // The lowest distance bit is implied by the ordering of the two base colors.
        let value = |c: [i32; 3]| (c[0] << 16) + (c[1] << 8) + c[2];
        let ordered = i32::from(value(first) >= value(second));
        let distance =
            DISTANCE_TABLE[((b(3) & 0x04) | ((b(3) & 0x01) << 1) | ordered) as usize];

        let shift = |color: [i32; 3], by: i32| color.map(|c| i32::from(clamp_0_to_255(c + by)));
        [
            shift(first, distance),
            shift(first, -distance),
            shift(second, distance),
            shift(second, -distance),
        ]
    }
}

fn decode_t_or_h(block: &[u8; 8], mode: Mode, masks: &[u32; 4], out: &mut Pixels) {
    let colors = paint_colors(block, mode);
    let word = index_word(block);

    for i in 0..16 {
        let index = pixel_index(word, i);
        let [r, g, b] = colors[index];
        out[output_slot(i)] = pack_rgb(r, g, b) & masks[index];
    }
}

fn decode_planar(block: &[u8; 8], out: &mut Pixels) {
    let b = |i: usize| i32::from(block[i]);

    // Colors O, H and V are stored as 6-7-6 bits.
    let ro = (b(0) & 0x7E) >> 1;
    let go = ((b(0) & 0x01) << 6) | ((b(1) & 0x7E) >> 1);
    let bo = ((b(1) & 0x01) << 5) | (b(2) & 0x18) | ((b(2) & 0x03) << 1) | ((b(3) & 0x80) >> 7);
    let rh = ((b(3) & 0x7C) >> 1) | (b(3) & 0x01);
    let gh = (b(4) & 0xFE) >> 1;
    let bh = ((b(4) & 0x01) << 5) | ((b(5) & 0xF8) >> 3);
    let rv = ((b(5) & 0x07) << 3) | ((b(6) & 0xE0) >> 5);
    let gv = ((b(6) & 0x1F) << 2) | ((b(7) & 0xC0) >> 6);
    let bv = b(7) & 0x3F;

    let extend6 = |v: i32| (v << 2) | ((v & 0x30) >> 4);
    let extend7 = |v: i32| (v << 1) | ((v & 0x40) >> 6);

    let origin = [extend6(ro), extend7(go), extend6(bo)];
    let horizontal = [extend6(rh), extend7(gh), extend6(bh)];
    let vertical = [extend6(rv), extend7(gv), extend6(bv)];

    for y in 0..4i32 {
        for x in 0..4i32 {
            let channel = |c: usize| {
                (x * (horizontal[c] - origin[c]) + y * (vertical[c] - origin[c]) + 4 * origin[c] + 2)
                    >> 2
            };
            out[(y * 4 + x) as usize] = pack_rgb(channel(0), channel(1), channel(2));
        }
    }
}

/// Decode an ETC2 RGB block
pub(crate) fn decode(block: &[u8; 8], mode_mask: ModeMask, out: &mut Pixels) -> bool {
    if block[3] & 2 == 0 {
        return etc1::decode(block, mode_mask, out);
    }

    if !mode_mask.intersects(ModeMask::ETC2.without(ModeMask::INDIVIDUAL)) {
        return false;
    }

    match overflow_mode(block) {
        mode @ (Mode::T | Mode::H) => {
            if !mode_mask.contains(mode.mask()) {
                return false;
            }
            decode_t_or_h(block, mode, &OPAQUE_MASKS, out);
            true
        }
        Mode::Planar => {
            if !mode_mask.contains(ModeMask::PLANAR) {
                return false;
            }
            decode_planar(block, out);
            true
        }
        _ => etc1::decode(block, mode_mask, out),
    }
}

/// Decode an ETC2 RGB8A1 block, where the differential bit means "opaque"
pub(crate) fn decode_punchthrough(
    block: &[u8; 8],
    mode_mask: ModeMask,
    flags: DecodeFlags,
    out: &mut Pixels,
) -> bool {
    let opaque = block[3] & 2 != 0;
    if opaque && flags.contains(DecodeFlags::NON_OPAQUE_ONLY) {
        return false;
    }
    if !opaque && flags.contains(DecodeFlags::OPAQUE_ONLY) {
        return false;
    }

    let masks = if opaque {
        &OPAQUE_MASKS
    } else {
        &PUNCHTHROUGH_MASKS
    };

    match overflow_mode(block) {
        mode @ (Mode::T | Mode::H) => {
            if !mode_mask.contains(mode.mask()) {
                return false;
            }
            decode_t_or_h(block, mode, masks, out);
            true
        }
        Mode::Planar => {
            // Planar blocks carry no alpha, whatever the opaque bit says.
            if !mode_mask.contains(ModeMask::PLANAR) {
                return false;
            }
            decode_planar(block, out);
            true
        }
        _ if opaque => etc1::decode(block, mode_mask, out),
        _ => {
            if !mode_mask.contains(ModeMask::DIFFERENTIAL) {
                return false;
            }
            let bases = etc1::differential_bases_unchecked(block);
            etc1::fill_subblocks(block, &bases, &PUNCHTHROUGH_MODIFIER_TABLE, &PUNCHTHROUGH_MASKS, out);
            true
        }
    }
}

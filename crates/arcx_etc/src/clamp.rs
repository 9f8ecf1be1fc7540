//! Saturating channel arithmetic shared by every block mode.

/// Lowest value the saturation table covers directly
const TABLE_BIAS: i32 = 255;

/// Saturation table indexed by `value + 255`, valid for `-255..=768`
static CLAMP_TABLE: [u8; 1024] = build_clamp_table();

const fn build_clamp_table() -> [u8; 1024] {
    let mut table = [0u8; 1024];
    let mut i = 0;
    while i < table.len() {
        let value = i as i32 - TABLE_BIAS;
        table[i] = if value < 0 {
            0
        } else if value > 255 {
            255
        } else {
            value as u8
        };
        i += 1;
    }
    table
}

/// Saturate `value` to `0..=255`.
///
/// Every intermediate produced by the decoders lands inside the table; values outside it still
/// saturate the same way.
#[inline]
pub fn clamp_0_to_255(value: i32) -> u8 {
    if (-TABLE_BIAS..=768).contains(&value) {
        CLAMP_TABLE[(value + TABLE_BIAS) as usize]
    } else if value < 0 {
        0
    } else {
        255
    }
}

/// Pack an opaque pixel
#[inline]
pub(crate) fn pack_rgb(r: i32, g: i32, b: i32) -> u32 {
    u32::from(clamp_0_to_255(r))
        | u32::from(clamp_0_to_255(g)) << 8
        | u32::from(clamp_0_to_255(b)) << 16
        | 0xFF00_0000
}

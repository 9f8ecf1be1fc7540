use arcx_etc::{decode_block, decode_image, BlockFormat, DecodeFlags, ModeMask};
use divan::{black_box, Bencher};

fn main() {
    divan::main();
}

#[rustfmt::skip]
const BLOCKS: [[u8; 8]; 4] = [
    [0x81, 0x43, 0x27, 0x4A, 0xF0, 0x0F, 0xAA, 0x55],
    [0x1C, 0x5A, 0xC3, 0x9F, 0x12, 0x34, 0x56, 0x78],
    [0x02, 0xF9, 0x20, 0x86, 0x87, 0x65, 0x43, 0x21],
    [0x36, 0x12, 0xFB, 0xB6, 0x9A, 0xBC, 0xDE, 0xF1],
];

#[divan::bench(args = ["differential", "t", "h", "planar"])]
fn block(bencher: Bencher, mode: &str) {
    let index = ["differential", "t", "h", "planar"]
        .iter()
        .position(|m| *m == mode)
        .unwrap_or(0);
    let block = BLOCKS[index];

    bencher.bench(|| {
        decode_block(
            BlockFormat::Etc2Rgb,
            black_box(&block),
            ModeMask::ETC2,
            DecodeFlags::NONE,
        )
    });
}

#[divan::bench(args = [64, 512, 2048])]
fn image(bencher: Bencher, size: usize) {
    let data: Vec<u8> = BLOCKS
        .iter()
        .cycle()
        .take((size / 4) * (size / 4))
        .flatten()
        .copied()
        .collect();

    bencher.bench(|| decode_image(BlockFormat::Etc2Rgb, black_box(&data), size, size));
}

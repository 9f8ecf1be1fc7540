//! Whole-texture decoding.

use rayon::prelude::*;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::{decode_block, BlockFormat, DecodeFlags};

/// Number of compressed bytes needed for an image of the given size
pub fn compressed_size(format: BlockFormat, width: usize, height: usize) -> usize {
    width.div_ceil(4) * height.div_ceil(4) * format.block_size()
}

/// Decode a whole texture into tightly packed RGBA8 rows.
///
/// Blocks are laid out row by row; pixels of the rightmost and bottom blocks that
/// fall outside `width` x `height` are cropped. Block rows are decoded in parallel.
/// Trailing bytes past the last block are ignored.
#[instrument(skip(data), fields(len = data.len()))]
pub fn decode_image(
    format: BlockFormat,
    data: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<u8>> {
    let expected = compressed_size(format, width, height);
    if data.len() < expected {
        return Err(Error::TruncatedImage {
            expected,
            actual: data.len(),
        });
    }

    let mut out = vec![0u8; width * height * 4];
    if out.is_empty() {
        return Ok(out);
    }

    let blocks_wide = width.div_ceil(4);
    let block_size = format.block_size();
    let row_bytes = width * 4;

    out.par_chunks_mut(row_bytes * 4)
        .enumerate()
        .try_for_each(|(block_y, rows)| {
            let rows_here = rows.len() / row_bytes;
            for block_x in 0..blocks_wide {
                let index = block_y * blocks_wide + block_x;
                let start = index * block_size;
                let block = &data[start..start + block_size];

                let pixels = decode_block(format, block, format.all_modes(), DecodeFlags::NONE)
                    .map_err(|source| Error::ImageBlock {
                        index,
                        source: Box::new(source),
                    })?;

                let columns = (width - block_x * 4).min(4);
                for y in 0..rows_here {
                    let line = &mut rows[y * row_bytes + block_x * 16..];
                    for x in 0..columns {
                        line[x * 4..x * 4 + 4].copy_from_slice(&pixels[y * 4 + x].to_le_bytes());
                    }
                }
            }
            Ok(())
        })?;

    Ok(out)
}

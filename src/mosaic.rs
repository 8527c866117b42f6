//! Block-averaging mosaic over a binary selection mask.
//!
//! The image is partitioned into square blocks whose side scales with image
//! width, so block density looks the same across resolutions. A block is
//! averaged only if the mask is set at its center pixel.

use image::Rgba;

use crate::canvas;
use crate::codec::PixelBuffer;

/// Smallest block side in pixels.
pub const MIN_BLOCK_SIZE: u32 = 10;
/// Blocks per image width before the minimum kicks in.
const BLOCKS_PER_WIDTH: u32 = 50;
/// Mask red values above this select a block.
const MASK_THRESHOLD: u8 = 128;

/// Block side for an image of the given width: `max(10, floor(width / 50))`.
#[must_use]
pub fn block_size_for(width: u32) -> u32 {
    (width / BLOCKS_PER_WIDTH).max(MIN_BLOCK_SIZE)
}

/// Replace every selected block of `original` with its flat average color.
///
/// `mask` is a binary selection mask (white = selected); it is rescaled to the
/// original's size if the two differ. Selected blocks come out opaque;
/// unselected pixels keep their alpha.
#[must_use]
pub fn apply_mosaic(original: &PixelBuffer, mask: &PixelBuffer) -> PixelBuffer {
    let (w, h) = original.dimensions();
    let mask = canvas::scale_to(mask, w, h);
    let block = block_size_for(w);
    let mut out = original.clone();

    for y in (0..h).step_by(block as usize) {
        for x in (0..w).step_by(block as usize) {
            let cx = (x + block / 2).min(w - 1);
            let cy = (y + block / 2).min(h - 1);
            if mask.get_pixel(cx, cy)[0] <= MASK_THRESHOLD {
                continue;
            }

            let x2 = (x + block).min(w);
            let y2 = (y + block).min(h);
            let [r, g, b] = block_average(original, x, y, x2, y2);
            let fill = Rgba([r, g, b, 255]);

            for by in y..y2 {
                for bx in x..x2 {
                    out.put_pixel(bx, by, fill);
                }
            }
        }
    }

    out
}

/// Rounded mean RGB over `[x1, x2) x [y1, y2)`.
#[allow(clippy::cast_possible_truncation)]
fn block_average(img: &PixelBuffer, x1: u32, y1: u32, x2: u32, y2: u32) -> [u8; 3] {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for y in y1..y2 {
        for x in x1..x2 {
            let p = img.get_pixel(x, y);
            for (acc, &v) in sum.iter_mut().zip(&p.0[..3]) {
                *acc += u64::from(v);
            }
            count += 1;
        }
    }
    if count == 0 {
        return [0; 3];
    }
    sum.map(|s| ((s + count / 2) / count) as u8)
}

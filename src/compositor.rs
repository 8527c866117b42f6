//! Mask composition policies.
//!
//! Every policy first brings the interactively drawn mask to the native size of
//! the image it applies to, then works pixel by pixel on a new output buffer.
//! Source buffers are never mutated.

use image::{Rgba, RgbaImage};

use crate::canvas;
use crate::codec::PixelBuffer;
use crate::color::Color;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Red channel of a mask pixel. Fully transparent pixels read as 0, since a
/// surface readback carries no color there.
fn mask_value(px: &Rgba<u8>) -> u8 {
    if px[3] == 0 {
        0
    } else {
        px[0]
    }
}

/// Punch a transparent hole where the mask is white.
///
/// For every pixel `alpha_out = 255 - mask_value`, where `mask_value` is the
/// mask's red channel (WHITE = erase, BLACK = keep). RGB passes through
/// bit-for-bit. The mask is rescaled to the original's size if needed.
#[must_use]
pub fn erase_to_transparent(original: &PixelBuffer, mask: &PixelBuffer) -> PixelBuffer {
    let (w, h) = original.dimensions();
    let mask = canvas::scale_to(mask, w, h);

    let mut out = RgbaImage::new(w, h);
    for ((dst, src), m) in out.pixels_mut().zip(original.pixels()).zip(mask.pixels()) {
        *dst = Rgba([src[0], src[1], src[2], 255 - mask_value(m)]);
    }
    out
}

/// Convert a drawn overlay into a strict binary selection mask at `width` x `height`.
///
/// Any pixel with non-zero alpha becomes opaque white; everything else opaque black.
#[must_use]
pub fn normalize_binary(overlay: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    let scaled = canvas::scale_to(overlay, width, height);
    let mut out = RgbaImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(scaled.pixels()) {
        *dst = if src[3] > 0 { WHITE } else { BLACK };
    }
    out
}

/// Turn an erase-editor surface into a WHITE-on-BLACK inpainting mask at native size.
///
/// `cover` is the translucent fill the surface started with. Pixels whose
/// cover was fully removed become WHITE, untouched pixels stay BLACK, and
/// partially erased edges get the proportional gray.
#[must_use]
pub fn erased_region_mask(
    surface: &PixelBuffer,
    cover: Color,
    width: u32,
    height: u32,
) -> PixelBuffer {
    let cover_a = u32::from(cover.a);
    let mut positive = RgbaImage::new(surface.width(), surface.height());
    for (dst, src) in positive.pixels_mut().zip(surface.pixels()) {
        let v = if cover_a == 0 {
            0
        } else {
            let removed = cover_a.saturating_sub(u32::from(src[3]));
            (removed * 255 + cover_a / 2) / cover_a
        };
        #[allow(clippy::cast_possible_truncation)]
        let v = v.min(255) as u8;
        *dst = Rgba([v, v, v, 255]);
    }
    canvas::scale_to(&positive, width, height)
}

/// Scale a display-resolution drawing to `base`'s size and composite it on top.
///
/// No color transform is applied; only the scale changes.
#[must_use]
pub fn direct_paste(base: &PixelBuffer, overlay: &PixelBuffer) -> PixelBuffer {
    let (w, h) = base.dimensions();
    let scaled = canvas::scale_to(overlay, w, h);
    let mut out = base.clone();
    canvas::draw_image(&mut out, &scaled, 0, 0);
    out
}

//! Heuristic check for images with no real background to blend against.

use crate::canvas;
use crate::codec::{self, PixelBuffer};
use crate::handle::ImageHandle;

/// Longest side of the sample the check runs on.
const SAMPLE_LIMIT: u32 = 100;
/// Per-channel distance from the first pixel still counted as uniform.
const TOLERANCE: u8 = 5;

/// Whether `img` has any transparency or is a single flat color.
///
/// The image is first squeezed to at most 100x100 (each axis independently),
/// so isolated details on large images can average away.
#[must_use]
pub fn is_background_empty(img: &PixelBuffer) -> bool {
    let (w, h) = img.dimensions();
    let sample = canvas::scale_to(img, w.min(SAMPLE_LIMIT), h.min(SAMPLE_LIMIT));

    if sample.pixels().any(|p| p[3] < 255) {
        return true;
    }
    let Some(first) = sample.pixels().next().copied() else {
        return false;
    };
    sample
        .pixels()
        .all(|p| (0..3).all(|ch| p[ch].abs_diff(first[ch]) <= TOLERANCE))
}

/// Decode `handle` and run [`is_background_empty`]. Any failure yields `false`.
#[must_use]
pub fn detect_empty_background(handle: &ImageHandle) -> bool {
    codec::decode(handle).is_ok_and(|img| is_background_empty(&img))
}

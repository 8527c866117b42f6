//! Scoped drawing surfaces over [`PixelBuffer`]s.
//!
//! Vector work (strokes, rounded paths, translucent fills) is done on a
//! `tiny_skia::Pixmap`, which stores premultiplied RGBA. Pixel buffers stay
//! straight-alpha, so every trip through a pixmap converts explicitly.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tiny_skia::{ColorU8, Paint, Pixmap, Rect, Transform};

use crate::codec::PixelBuffer;
use crate::color::Color;
use crate::error::{Error, Result};

/// Allocate a transparent drawing surface.
///
/// # Errors
///
/// Returns [`Error::CanvasUnavailable`] for zero or oversized dimensions.
pub fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).ok_or(Error::CanvasUnavailable { width, height })
}

/// Copy a straight-alpha buffer into a fresh premultiplied pixmap.
///
/// # Errors
///
/// Returns [`Error::CanvasUnavailable`] if the pixmap cannot be allocated.
pub fn to_pixmap(img: &PixelBuffer) -> Result<Pixmap> {
    let mut pixmap = new_pixmap(img.width(), img.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Ok(pixmap)
}

/// Copy a premultiplied pixmap into a straight-alpha buffer.
#[must_use]
pub fn from_pixmap(pixmap: &Pixmap) -> PixelBuffer {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

/// Run `draw` against a pixmap view of `img`, then write the result back.
///
/// # Errors
///
/// Returns [`Error::CanvasUnavailable`] if the pixmap cannot be allocated.
pub fn with_pixmap(img: &mut PixelBuffer, draw: impl FnOnce(&mut Pixmap)) -> Result<()> {
    let mut pixmap = to_pixmap(img)?;
    draw(&mut pixmap);
    *img = from_pixmap(&pixmap);
    Ok(())
}

/// An anti-aliased solid paint.
#[must_use]
pub fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

/// Fill a possibly fractional rectangle on a pixmap. Empty rectangles are ignored.
pub fn fill_rect(pixmap: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: Color) {
    if let Some(rect) = Rect::from_xywh(x, y, w, h) {
        pixmap.fill_rect(rect, &solid_paint(color), Transform::identity(), None);
    }
}

/// Source-over blend `color` at `coverage` (0-1) onto one pixel. Out-of-bounds is a no-op.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
pub fn blend_pixel(img: &mut PixelBuffer, x: i32, y: i32, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let src_a = f32::from(color.a) / 255.0 * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }

    let dst = img.get_pixel_mut(x as u32, y as u32);
    let dst_a = f32::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }

    for (d, s) in dst.0[..3].iter_mut().zip([color.r, color.g, color.b]) {
        let v = (f32::from(s) * src_a + f32::from(*d) * dst_a * (1.0 - src_a)) / out_a;
        *d = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Resample `img` to `width` x `height` with bilinear filtering.
///
/// Returns an unchanged copy when the size already matches.
#[must_use]
pub fn scale_to(img: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    imageops::resize(img, width, height, FilterType::Triangle)
}

/// Composite `overlay` onto `base` with source-over at `(x, y)`.
pub fn draw_image(base: &mut PixelBuffer, overlay: &PixelBuffer, x: i64, y: i64) {
    imageops::overlay(base, overlay, x, y);
}

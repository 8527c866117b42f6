//! Glyph measurement and rasterization.
//!
//! Overlays only need three things from a font: how wide a line is, where the
//! baseline sits relative to the em box, and per-pixel glyph coverage.
//! [`Typeface`] captures exactly that so layout can be tested without a font
//! file; [`FontFace`] is the `ab_glyph` implementation used in production.

use std::path::Path;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use serde::{Deserialize, Serialize};

use crate::canvas;
use crate::codec::PixelBuffer;
use crate::color::Color;
use crate::error::{Error, Result};

/// Horizontal anchor of a text line relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// x is the left edge.
    Left,
    /// x is the horizontal center.
    #[default]
    Center,
    /// x is the right edge.
    Right,
}

/// Vertical anchor of a text line relative to its y coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    /// y is the top of the em box.
    Top,
    /// y is the middle of the em box.
    #[default]
    Middle,
    /// y is the bottom of the em box.
    Bottom,
}

/// A font at the level of detail overlays need.
///
/// Sizes are CSS pixels: `px` is the em size, as in `48px sans-serif`.
pub trait Typeface: Send + Sync {
    /// Advance width of `text` on a single line.
    fn measure(&self, text: &str, px: f32) -> f32;

    /// Ascent (positive, above baseline) and descent (negative, below baseline).
    fn v_metrics(&self, px: f32) -> (f32, f32);

    /// Rasterize `text` with its left edge at `x` and its alphabetic baseline at `y`,
    /// calling `plot(px, py, coverage)` for every touched pixel.
    fn rasterize(&self, text: &str, px: f32, x: f32, y: f32, plot: &mut dyn FnMut(i32, i32, f32));
}

/// An `ab_glyph` font scaled so that one em equals the requested pixel size.
#[derive(Clone)]
pub struct FontFace {
    font: FontArc,
}

impl FontFace {
    /// Load a TrueType/OpenType font from memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontUnavailable`] if the bytes are not a usable font.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| Error::FontUnavailable(e.to_string()))?;
        Ok(Self { font })
    }

    /// Load a font file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or
    /// [`Error::FontUnavailable`] if it is not a usable font.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    fn scale(&self, px: f32) -> PxScale {
        let upem = self.font.units_per_em().unwrap_or(1000.0);
        PxScale::from(px * self.font.height_unscaled() / upem)
    }
}

impl Typeface for FontFace {
    fn measure(&self, text: &str, px: f32) -> f32 {
        let scaled = self.font.as_scaled(self.scale(px));
        let mut width = 0.0f32;
        let mut last = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = last {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            last = Some(id);
        }
        width
    }

    fn v_metrics(&self, px: f32) -> (f32, f32) {
        let scaled = self.font.as_scaled(self.scale(px));
        (scaled.ascent(), scaled.descent())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn rasterize(&self, text: &str, px: f32, x: f32, y: f32, plot: &mut dyn FnMut(i32, i32, f32)) {
        let scale = self.scale(px);
        let scaled = self.font.as_scaled(scale);
        let mut cursor = x;
        let mut last = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = last {
                cursor += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(cursor, y));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, cov| {
                    plot(
                        bounds.min.x as i32 + gx as i32,
                        bounds.min.y as i32 + gy as i32,
                        cov,
                    );
                });
            }
            cursor += scaled.h_advance(id);
            last = Some(id);
        }
    }
}

/// Alphabetic baseline for a line anchored at `y` with the given baseline mode.
#[must_use]
pub fn baseline_y(face: &dyn Typeface, px: f32, y: f32, baseline: TextBaseline) -> f32 {
    let (ascent, descent) = face.v_metrics(px);
    match baseline {
        TextBaseline::Top => y + ascent,
        TextBaseline::Middle => y + (ascent + descent) / 2.0,
        TextBaseline::Bottom => y + descent,
    }
}

/// Font size, fill and anchoring for [`fill_text`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Em size in pixels.
    pub size: f32,
    /// Glyph fill.
    pub color: Color,
    /// Horizontal anchor.
    pub align: TextAlign,
    /// Vertical anchor.
    pub baseline: TextBaseline,
}

/// Draw one line of text onto `img`, anchored at `(x, y)` per `style`.
pub fn fill_text(
    img: &mut PixelBuffer,
    face: &dyn Typeface,
    line: &str,
    (x, y): (f32, f32),
    style: &TextStyle,
) {
    let width = face.measure(line, style.size);
    let left = match style.align {
        TextAlign::Left => x,
        TextAlign::Center => x - width / 2.0,
        TextAlign::Right => x - width,
    };
    let base = baseline_y(face, style.size, y, style.baseline);
    face.rasterize(line, style.size, left, base, &mut |px, py, cov| {
        canvas::blend_pixel(img, px, py, style.color, cov);
    });
}

/// Borrow the typeface or report that text cannot be drawn.
pub(crate) fn require(face: Option<&dyn Typeface>) -> Result<&dyn Typeface> {
    face.ok_or_else(|| Error::FontUnavailable("no typeface configured".to_string()))
}

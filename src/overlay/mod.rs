//! Parametric overlays drawn onto a native-resolution copy of the source.
//!
//! Each renderer takes a read-only source buffer plus a settings value and
//! returns a new buffer. Layout is computed separately from drawing so that
//! placement rules can be checked without comparing pixels.

pub mod brand;
pub mod frame_text;
pub mod speech_bubble;

pub use brand::{BarPosition, BrandLayout, BrandOverlaySettings};
pub use frame_text::{BackgroundSettings, FrameSettings, OverlaySettings, TextBlockLayout};
pub use speech_bubble::{BubbleLayout, SpeechBubbleSettings, TailDirection};

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct LineAnchor {
    /// Line content.
    pub text: String,
    /// Anchor x, interpreted per the renderer's alignment.
    pub x: f32,
    /// Anchor y, interpreted per the renderer's baseline.
    pub y: f32,
}

/// Line height multiplier shared by all multi-line overlays.
pub(crate) const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Width of the widest line.
pub(crate) fn max_line_width(face: &dyn crate::text::Typeface, lines: &[&str], px: f32) -> f32 {
    lines
        .iter()
        .map(|l| face.measure(l, px))
        .fold(0.0, f32::max)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn canvas_size(img: &crate::PixelBuffer) -> (f32, f32) {
    (img.width() as f32, img.height() as f32)
}

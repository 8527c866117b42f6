//! Border frame plus a multi-line text block with an optional background box.

use serde::{Deserialize, Serialize};

use super::{canvas_size, max_line_width, LineAnchor, LINE_HEIGHT_FACTOR};
use crate::canvas;
use crate::codec::PixelBuffer;
use crate::color::Color;
use crate::error::Result;
use crate::text::{self, TextAlign, TextBaseline, TextStyle, Typeface};

/// Distance kept between the text box and the frame's inner edge.
const EDGE_MARGIN: f32 = 20.0;

/// Translucent box drawn behind the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackgroundSettings {
    /// Draw the box.
    pub enabled: bool,
    /// Box fill.
    pub color: Color,
    /// Box opacity (0-1).
    pub opacity: f32,
    /// Space between text and box edge.
    pub padding: f32,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color::BLACK,
            opacity: 0.5,
            padding: 20.0,
        }
    }
}

/// Solid border around the whole image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameSettings {
    /// Draw the border.
    pub enabled: bool,
    /// Border fill.
    pub color: Color,
    /// Border width in pixels.
    pub thickness: f32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color::WHITE,
            thickness: 20.0,
        }
    }
}

/// Settings for [`render`].
///
/// `text_align` anchors the box horizontally and aligns lines inside it;
/// `text_baseline` anchors the box vertically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlaySettings {
    /// Text, lines separated by `\n`.
    pub text: String,
    /// Em size in pixels.
    pub font_size: f32,
    /// Glyph fill.
    pub text_color: Color,
    /// Horizontal placement.
    pub text_align: TextAlign,
    /// Vertical placement.
    pub text_baseline: TextBaseline,
    /// Box behind the text.
    pub background: BackgroundSettings,
    /// Border around the image.
    pub frame: FrameSettings,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 48.0,
            text_color: Color::WHITE,
            text_align: TextAlign::Center,
            text_baseline: TextBaseline::Middle,
            background: BackgroundSettings::default(),
            frame: FrameSettings::default(),
        }
    }
}

impl OverlaySettings {
    fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    fn draws_frame(&self) -> bool {
        self.frame.enabled && self.frame.thickness > 0.0
    }
}

/// Placement of the text box and each of its lines on a canvas.
///
/// Line anchors are horizontal per `text_align` and vertically the middle of
/// the line's em box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlockLayout {
    /// Left edge of the box.
    pub box_x: f32,
    /// Top edge of the box.
    pub box_y: f32,
    /// Box width (padding included when the background is enabled).
    pub box_width: f32,
    /// Box height (padding included when the background is enabled).
    pub box_height: f32,
    /// Distance between consecutive line anchors.
    pub line_height: f32,
    /// One anchor per line, top to bottom.
    pub lines: Vec<LineAnchor>,
}

impl TextBlockLayout {
    /// Lay out `settings.text` on a `canvas` sized `(width, height)`.
    ///
    /// Returns `None` when the text is empty or whitespace.
    #[must_use]
    pub fn compute(
        settings: &OverlaySettings,
        canvas: (f32, f32),
        face: &dyn Typeface,
    ) -> Option<Self> {
        if !settings.has_text() {
            return None;
        }
        let (w, h) = canvas;
        let fs = settings.font_size;
        let lines: Vec<&str> = settings.text.split('\n').collect();
        let line_height = fs * LINE_HEIGHT_FACTOR;
        #[allow(clippy::cast_precision_loss)]
        let total_text_height = (lines.len() - 1) as f32 * line_height + fs;
        let max_width = max_line_width(face, &lines, fs);

        let bg = &settings.background;
        let pad = if bg.enabled { bg.padding } else { 0.0 };
        let box_width = max_width + pad * 2.0;
        let box_height = total_text_height + pad * 2.0;
        let margin = settings.frame.thickness + EDGE_MARGIN;

        let box_x = match settings.text_align {
            TextAlign::Center => w / 2.0 - box_width / 2.0,
            TextAlign::Left => margin,
            TextAlign::Right => w - box_width - margin,
        };
        let box_y = match settings.text_baseline {
            TextBaseline::Top => margin,
            TextBaseline::Middle => h / 2.0 - box_height / 2.0,
            TextBaseline::Bottom => h - box_height - margin,
        };

        let line_x = match settings.text_align {
            TextAlign::Center => box_x + box_width / 2.0,
            TextAlign::Left => box_x + pad,
            TextAlign::Right => box_x + box_width - pad,
        };
        let start_y = box_y + box_height / 2.0 - total_text_height / 2.0 + fs / 2.0;

        let lines = lines
            .iter()
            .enumerate()
            .map(|(i, l)| {
                #[allow(clippy::cast_precision_loss)]
                let y = start_y + i as f32 * line_height;
                LineAnchor {
                    text: (*l).to_string(),
                    x: line_x,
                    y,
                }
            })
            .collect();

        Some(Self {
            box_x,
            box_y,
            box_width,
            box_height,
            line_height,
            lines,
        })
    }
}

/// Draw the frame, then the optional background box, then the text.
///
/// Only the frame is drawn when the text is blank; no typeface is needed then.
///
/// # Errors
///
/// Returns [`crate::Error::FontUnavailable`] if there is text but no typeface,
/// or [`crate::Error::CanvasUnavailable`] if no drawing surface can be allocated.
pub fn render(
    source: &PixelBuffer,
    settings: &OverlaySettings,
    face: Option<&dyn Typeface>,
) -> Result<PixelBuffer> {
    let (w, h) = canvas_size(source);
    let layout = if settings.has_text() {
        let face = text::require(face)?;
        TextBlockLayout::compute(settings, (w, h), face).map(|l| (face, l))
    } else {
        None
    };

    let bg = &settings.background;
    let backdrop = layout.as_ref().filter(|_| bg.enabled).map(|(_, l)| l);

    let mut out = source.clone();
    if settings.draws_frame() || backdrop.is_some() {
        canvas::with_pixmap(&mut out, |pm| {
            if settings.draws_frame() {
                let t = settings.frame.thickness;
                let c = settings.frame.color;
                canvas::fill_rect(pm, 0.0, 0.0, w, t, c);
                canvas::fill_rect(pm, 0.0, h - t, w, t, c);
                canvas::fill_rect(pm, 0.0, 0.0, t, h, c);
                canvas::fill_rect(pm, w - t, 0.0, t, h, c);
            }
            if let Some(l) = backdrop {
                let fill = bg.color.with_opacity(bg.opacity);
                canvas::fill_rect(pm, l.box_x, l.box_y, l.box_width, l.box_height, fill);
            }
        })?;
    }

    if let Some((face, l)) = layout {
        let style = TextStyle {
            size: settings.font_size,
            color: settings.text_color,
            align: settings.text_align,
            baseline: TextBaseline::Middle,
        };
        for line in &l.lines {
            text::fill_text(&mut out, face, &line.text, (line.x, line.y), &style);
        }
    }
    Ok(out)
}

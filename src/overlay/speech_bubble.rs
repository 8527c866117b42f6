//! Rounded speech bubble with a triangular tail, anchored on a 3x3 grid.

use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, PathBuilder, Stroke, Transform};

use super::{canvas_size, max_line_width, LineAnchor, LINE_HEIGHT_FACTOR};
use crate::canvas::{self, solid_paint};
use crate::codec::PixelBuffer;
use crate::color::Color;
use crate::error::Result;
use crate::geometry::Point;
use crate::text::{self, TextAlign, TextBaseline, TextStyle, Typeface};

/// Corner radius of the bubble body.
pub const CORNER_RADIUS: f32 = 25.0;
/// Distance kept between the bubble and the canvas edges.
const GRID_MARGIN: f32 = 20.0;
/// Outline drawn around body and tail.
const OUTLINE_COLOR: Color = Color::rgb(0x33, 0x33, 0x33);
const OUTLINE_WIDTH: f32 = 3.0;
/// Control-point distance (as a fraction of the radius) for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Settings for [`render`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeechBubbleSettings {
    /// Text, lines separated by `\n`.
    pub text: String,
    /// Em size in pixels.
    pub font_size: f32,
    /// Glyph fill.
    pub text_color: Color,
    /// Bubble fill.
    pub bubble_color: Color,
    /// Bubble fill opacity (0-1). The outline is always opaque.
    pub bubble_opacity: f32,
    /// Space between text and bubble edge.
    pub padding: f32,
    /// `[row, col]` in the 3x3 anchor grid, each 0-2.
    pub position: [u8; 2],
    /// Tail base width.
    pub tail_width: f32,
    /// Distance from the bubble edge to the tail apex.
    pub tail_height: f32,
    /// Where the tail sits along its edge, 0 = start, 1 = end.
    pub tail_position_ratio: f32,
}

impl Default for SpeechBubbleSettings {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 48.0,
            text_color: Color::BLACK,
            bubble_color: Color::WHITE,
            bubble_opacity: 0.9,
            padding: 25.0,
            position: [2, 1],
            tail_width: 40.0,
            tail_height: 30.0,
            tail_position_ratio: 0.5,
        }
    }
}

/// Which edge the tail leaves from and where its apex points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailDirection {
    /// Out of the top edge.
    Up,
    /// Out of the bottom edge.
    Down,
    /// Out of the left edge.
    Left,
    /// Out of the right edge.
    Right,
    /// No tail.
    None,
}

impl TailDirection {
    /// Tail for a grid cell.
    ///
    /// A bubble in the top row points down at the content below it, one in the
    /// bottom row points up, and side cells of the middle row point inward.
    #[must_use]
    pub fn for_position(row: u8, col: u8) -> Self {
        match (row, col) {
            (0, _) => Self::Down,
            (2, _) => Self::Up,
            (1, 0) => Self::Right,
            (1, 2) => Self::Left,
            _ => Self::None,
        }
    }

    fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Bubble body placement and tail geometry on a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleLayout {
    /// Left edge of the body (tail excluded).
    pub box_x: f32,
    /// Top edge of the body (tail excluded).
    pub box_y: f32,
    /// Body width.
    pub width: f32,
    /// Body height.
    pub height: f32,
    /// Tail direction.
    pub tail: TailDirection,
    /// Center of the tail base on the top/bottom edge (x) or left/right edge (y).
    pub tail_base: Point,
    /// Text lines, anchored at their top center.
    pub lines: Vec<LineAnchor>,
}

impl BubbleLayout {
    /// Lay out the bubble for `settings` on a `canvas` sized `(width, height)`.
    ///
    /// Returns `None` when the text is empty or whitespace.
    #[must_use]
    pub fn compute(
        settings: &SpeechBubbleSettings,
        canvas: (f32, f32),
        face: &dyn Typeface,
    ) -> Option<Self> {
        if settings.text.trim().is_empty() {
            return None;
        }
        let (cw, ch) = canvas;
        let fs = settings.font_size;
        let pad = settings.padding;
        let th = settings.tail_height;

        let lines: Vec<&str> = settings.text.split('\n').collect();
        let line_height = fs * LINE_HEIGHT_FACTOR;
        #[allow(clippy::cast_precision_loss)]
        let text_height = lines.len() as f32 * line_height - (line_height - fs);
        let text_width = max_line_width(face, &lines, fs);

        let width = text_width + pad * 2.0;
        let height = text_height + pad * 2.0;

        let [row, col] = settings.position;
        let tail = TailDirection::for_position(row, col);
        let total_w = width + if tail.is_horizontal() { th } else { 0.0 };
        let total_h = height + if tail.is_vertical() { th } else { 0.0 };

        let mut box_x = match col {
            0 => GRID_MARGIN,
            1 => (cw - total_w) / 2.0,
            _ => cw - total_w - GRID_MARGIN,
        };
        let mut box_y = match row {
            0 => GRID_MARGIN,
            1 => (ch - total_h) / 2.0,
            _ => ch - total_h - GRID_MARGIN,
        };
        if tail == TailDirection::Left {
            box_x += th;
        }
        if tail == TailDirection::Up {
            box_y += th;
        }

        let r = CORNER_RADIUS;
        let tp = settings.tail_position_ratio;
        let tail_base = Point::new(
            box_x + (width * tp).min(width - r).max(r),
            box_y + (height * tp).min(height - r).max(r),
        );

        let lines = lines
            .iter()
            .enumerate()
            .map(|(i, l)| {
                #[allow(clippy::cast_precision_loss)]
                let y = box_y + pad + i as f32 * line_height;
                LineAnchor {
                    text: (*l).to_string(),
                    x: box_x + width / 2.0,
                    y,
                }
            })
            .collect();

        Some(Self {
            box_x,
            box_y,
            width,
            height,
            tail,
            tail_base,
            lines,
        })
    }

    /// Outline of the body with the tail notched into its edge, clockwise from
    /// the top-left corner.
    #[must_use]
    pub fn path(&self, tail_width: f32, tail_height: f32) -> Option<tiny_skia::Path> {
        let (x, y, w, h) = (self.box_x, self.box_y, self.width, self.height);
        let r = CORNER_RADIUS;
        let (tw, th) = (tail_width / 2.0, tail_height);
        let Point { x: tx, y: ty } = self.tail_base;

        let mut pb = PathBuilder::new();
        pb.move_to(x + r, y);
        if self.tail == TailDirection::Up {
            pb.line_to(tx - tw, y);
            pb.line_to(tx, y - th);
            pb.line_to(tx + tw, y);
        }
        pb.line_to(x + w - r, y);
        corner(&mut pb, (x + w - r, y), (x + w, y), (x + w, y + r));

        if self.tail == TailDirection::Right {
            pb.line_to(x + w, ty - tw);
            pb.line_to(x + w + th, ty);
            pb.line_to(x + w, ty + tw);
        }
        pb.line_to(x + w, y + h - r);
        corner(&mut pb, (x + w, y + h - r), (x + w, y + h), (x + w - r, y + h));

        if self.tail == TailDirection::Down {
            pb.line_to(tx + tw, y + h);
            pb.line_to(tx, y + h + th);
            pb.line_to(tx - tw, y + h);
        }
        pb.line_to(x + r, y + h);
        corner(&mut pb, (x + r, y + h), (x, y + h), (x, y + h - r));

        if self.tail == TailDirection::Left {
            pb.line_to(x, ty + tw);
            pb.line_to(x - th, ty);
            pb.line_to(x, ty - tw);
        }
        pb.line_to(x, y + r);
        corner(&mut pb, (x, y + r), (x, y), (x + r, y));
        pb.close();
        pb.finish()
    }
}

/// Quarter-circle from `from` to `to`, tangent to the two edges meeting at `apex`.
fn corner(pb: &mut PathBuilder, from: (f32, f32), apex: (f32, f32), to: (f32, f32)) {
    pb.cubic_to(
        from.0 + (apex.0 - from.0) * KAPPA,
        from.1 + (apex.1 - from.1) * KAPPA,
        to.0 + (apex.0 - to.0) * KAPPA,
        to.1 + (apex.1 - to.1) * KAPPA,
        to.0,
        to.1,
    );
}

/// Draw a speech bubble with its text over a copy of `source`.
///
/// Blank text returns an unchanged copy without needing a typeface.
///
/// # Errors
///
/// Returns [`crate::Error::FontUnavailable`] if there is text but no typeface,
/// or [`crate::Error::CanvasUnavailable`] if no drawing surface can be allocated.
pub fn render(
    source: &PixelBuffer,
    settings: &SpeechBubbleSettings,
    face: Option<&dyn Typeface>,
) -> Result<PixelBuffer> {
    if settings.text.trim().is_empty() {
        return Ok(source.clone());
    }
    let face = text::require(face)?;
    let Some(layout) = BubbleLayout::compute(settings, canvas_size(source), face) else {
        return Ok(source.clone());
    };

    let mut out = source.clone();
    if let Some(path) = layout.path(settings.tail_width, settings.tail_height) {
        canvas::with_pixmap(&mut out, |pm| {
            let fill = solid_paint(settings.bubble_color.with_opacity(settings.bubble_opacity));
            pm.fill_path(&path, &fill, FillRule::Winding, Transform::identity(), None);
            let stroke = Stroke {
                width: OUTLINE_WIDTH,
                ..Stroke::default()
            };
            pm.stroke_path(
                &path,
                &solid_paint(OUTLINE_COLOR),
                &stroke,
                Transform::identity(),
                None,
            );
        })?;
    }

    let style = TextStyle {
        size: settings.font_size,
        color: settings.text_color,
        align: TextAlign::Center,
        baseline: TextBaseline::Top,
    };
    for line in &layout.lines {
        text::fill_text(&mut out, face, &line.text, (line.x, line.y), &style);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::testing::BlockFace;
    use image::{Rgba, RgbaImage};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn settings(text: &str, position: [u8; 2]) -> SpeechBubbleSettings {
        SpeechBubbleSettings {
            text: text.to_string(),
            font_size: 20.0,
            position,
            ..SpeechBubbleSettings::default()
        }
    }

    #[test]
    fn tail_direction_follows_grid_cell() {
        assert_eq!(TailDirection::for_position(0, 0), TailDirection::Down);
        assert_eq!(TailDirection::for_position(0, 1), TailDirection::Down);
        assert_eq!(TailDirection::for_position(2, 2), TailDirection::Up);
        assert_eq!(TailDirection::for_position(1, 0), TailDirection::Right);
        assert_eq!(TailDirection::for_position(1, 2), TailDirection::Left);
        assert_eq!(TailDirection::for_position(1, 1), TailDirection::None);
    }

    #[test]
    fn defaults_match_editor() {
        let s = SpeechBubbleSettings::default();
        assert_eq!(s.position, [2, 1]);
        assert_eq!(s.text_color, Color::BLACK);
        assert_eq!(s.bubble_color, Color::WHITE);
        assert!(close(s.bubble_opacity, 0.9));
        assert!(close(s.padding, 25.0));
        assert!(close(s.tail_width, 40.0) && close(s.tail_height, 30.0));
        assert!(close(s.tail_position_ratio, 0.5));

        let parsed: SpeechBubbleSettings =
            serde_json::from_str(r#"{"text":"a","position":[0,2],"tailHeight":10}"#).unwrap();
        assert_eq!(parsed.position, [0, 2]);
        assert!(close(parsed.tail_height, 10.0));
        assert!(close(parsed.font_size, 48.0));
    }

    #[test]
    fn bottom_center_bubble_leaves_room_for_tail_above() {
        // "abcd" -> 40 wide; body 90 x 70; tail up adds 30 above.
        let l = BubbleLayout::compute(&settings("abcd", [2, 1]), (400.0, 300.0), &BlockFace)
            .unwrap();
        assert!(close(l.width, 90.0) && close(l.height, 70.0));
        assert_eq!(l.tail, TailDirection::Up);
        assert!(close(l.box_x, 155.0));
        assert!(close(l.box_y, 300.0 - 100.0 - 20.0 + 30.0));
        assert!(close(l.tail_base.x, 155.0 + 45.0));
        assert!(close(l.lines[0].x, 200.0));
        assert!(close(l.lines[0].y, l.box_y + 25.0));
    }

    #[test]
    fn side_bubbles_shift_past_their_tail() {
        let left = BubbleLayout::compute(&settings("ab", [1, 2]), (400.0, 300.0), &BlockFace)
            .unwrap();
        assert_eq!(left.tail, TailDirection::Left);
        // body 70 wide; total 100; right-aligned at margin then shifted by the tail.
        assert!(close(left.box_x, 400.0 - 100.0 - 20.0 + 30.0));

        let right = BubbleLayout::compute(&settings("ab", [1, 0]), (400.0, 300.0), &BlockFace)
            .unwrap();
        assert_eq!(right.tail, TailDirection::Right);
        assert!(close(right.box_x, 20.0));
        assert!(close(right.box_y, (300.0 - 70.0) / 2.0));
    }

    #[test]
    fn tail_base_stays_clear_of_corners() {
        let mut s = settings("abcdefgh", [0, 1]);
        s.tail_position_ratio = 0.0;
        let l = BubbleLayout::compute(&s, (400.0, 300.0), &BlockFace).unwrap();
        assert!(close(l.tail_base.x, l.box_x + CORNER_RADIUS));
        s.tail_position_ratio = 1.0;
        let l = BubbleLayout::compute(&s, (400.0, 300.0), &BlockFace).unwrap();
        assert!(close(l.tail_base.x, l.box_x + l.width - CORNER_RADIUS));
    }

    #[test]
    fn multi_line_text_height_excludes_trailing_leading() {
        let l = BubbleLayout::compute(&settings("a\nb\nc", [1, 1]), (400.0, 300.0), &BlockFace)
            .unwrap();
        // 3 * 24 - 4 = 68, plus padding
        assert!(close(l.height, 68.0 + 50.0));
        assert!(close(l.lines[2].y - l.lines[0].y, 48.0));
    }

    #[test]
    fn blank_text_returns_source_without_typeface() {
        let src = RgbaImage::from_pixel(30, 30, Rgba([1, 2, 3, 4]));
        assert_eq!(render(&src, &settings(" ", [0, 0]), None).unwrap(), src);
    }

    #[test]
    fn bubble_body_and_tail_are_filled() {
        let src = RgbaImage::from_pixel(400, 300, Rgba([0, 0, 255, 255]));
        let mut s = settings("abcd", [0, 1]);
        s.bubble_opacity = 1.0;
        s.text_color = Color::rgb(255, 0, 0);
        let out = render(&src, &s, Some(&BlockFace)).unwrap();
        // body x 155..245, y 20..90; tail apex 30 below the bottom edge at x=200.
        assert_eq!(*out.get_pixel(165, 50), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(200, 100), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(160, 105), Rgba([0, 0, 255, 255]));
        assert_eq!(*out.get_pixel(200, 55), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(10, 10), Rgba([0, 0, 255, 255]));
    }
}

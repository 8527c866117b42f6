//! Freehand brush strokes accumulated into a mask surface.
//!
//! Each drag segment is a round-capped, round-joined line from the previous
//! pointer position to the current one. A segment with no previous point is a
//! single dot, so a click without movement still marks something.

use tiny_skia::{BlendMode, FillRule, LineCap, LineJoin, PathBuilder, Pixmap, Stroke, Transform};

use crate::canvas::{self, solid_paint};
use crate::codec::PixelBuffer;
use crate::color::Color;
use crate::error::Result;
use crate::geometry::Point;

/// Translucent marker used by selection editors.
pub const MARKER_COLOR: Color = Color::rgba(255, 0, 0, 179);
/// Translucent cover laid over the whole image by erase editors.
pub const COVER_COLOR: Color = Color::rgba(0, 0, 0, 128);

/// How a brush affects the mask surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushMode {
    /// Paint the color over the surface.
    Paint(Color),
    /// Remove coverage from the surface (destination-out).
    Erase,
}

/// Initial state of the mask surface, restored by [`StrokeRasterizer::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskInit {
    /// Fully transparent: nothing marked.
    Empty,
    /// Filled with a color: everything covered.
    Cover(Color),
}

/// Rasterizes brush strokes into a display-resolution mask.
pub struct StrokeRasterizer {
    surface: Pixmap,
    brush_size: f32,
    mode: BrushMode,
    init: MaskInit,
    last: Option<Point>,
}

impl StrokeRasterizer {
    /// Create a rasterizer over a `width` x `height` surface.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CanvasUnavailable`] if the surface cannot be allocated.
    pub fn new(
        width: u32,
        height: u32,
        brush_size: f32,
        mode: BrushMode,
        init: MaskInit,
    ) -> Result<Self> {
        let mut rasterizer = Self {
            surface: canvas::new_pixmap(width, height)?,
            brush_size: brush_size.max(1.0),
            mode,
            init,
            last: None,
        };
        rasterizer.reset();
        Ok(rasterizer)
    }

    /// Erase editor preset: everything covered, strokes uncover.
    ///
    /// # Errors
    ///
    /// See [`StrokeRasterizer::new`].
    pub fn for_inpaint(width: u32, height: u32, brush_size: f32) -> Result<Self> {
        Self::new(
            width,
            height,
            brush_size,
            BrushMode::Erase,
            MaskInit::Cover(COVER_COLOR),
        )
    }

    /// Selection editor preset: nothing marked, strokes paint the marker color.
    ///
    /// # Errors
    ///
    /// See [`StrokeRasterizer::new`].
    pub fn for_mosaic(width: u32, height: u32, brush_size: f32) -> Result<Self> {
        Self::new(
            width,
            height,
            brush_size,
            BrushMode::Paint(MARKER_COLOR),
            MaskInit::Empty,
        )
    }

    /// Surface dimensions.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    /// Current brush diameter.
    #[must_use]
    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    /// Change the brush diameter for subsequent segments.
    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = size.max(1.0);
    }

    /// Start a stroke at `p` without drawing.
    pub fn begin_stroke(&mut self, p: Point) {
        self.last = Some(p);
    }

    /// Draw a segment from the previous point to `p` and make `p` the new previous point.
    pub fn extend_stroke(&mut self, p: Point) {
        let from = self.last.unwrap_or(p);
        self.draw_segment(from, p);
        self.last = Some(p);
    }

    /// Finish the current stroke.
    pub fn end_stroke(&mut self) {
        self.last = None;
    }

    /// Whether a stroke is in progress.
    #[must_use]
    pub fn is_stroking(&self) -> bool {
        self.last.is_some()
    }

    /// Restore the surface to its initial state and drop any stroke in progress.
    pub fn reset(&mut self) {
        match self.init {
            MaskInit::Empty => self.surface.fill(tiny_skia::Color::TRANSPARENT),
            MaskInit::Cover(c) => self.surface.fill(c.to_skia()),
        }
        self.last = None;
    }

    /// Snapshot of the surface as a straight-alpha buffer.
    #[must_use]
    pub fn mask(&self) -> PixelBuffer {
        canvas::from_pixmap(&self.surface)
    }

    fn draw_segment(&mut self, from: Point, to: Point) {
        let paint = match self.mode {
            BrushMode::Paint(c) => solid_paint(c),
            BrushMode::Erase => {
                let mut p = solid_paint(Color::BLACK);
                p.blend_mode = BlendMode::DestinationOut;
                p
            }
        };

        let radius = self.brush_size / 2.0;
        if (from.x - to.x).abs() < f32::EPSILON && (from.y - to.y).abs() < f32::EPSILON {
            if let Some(dot) = PathBuilder::from_circle(to.x, to.y, radius) {
                self.surface
                    .fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
            }
            return;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        let Some(path) = pb.finish() else {
            return;
        };

        let stroke = Stroke {
            width: self.brush_size,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.surface
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mosaic_preset_starts_empty() {
        let r = StrokeRasterizer::for_mosaic(20, 10, 4.0).unwrap();
        assert_eq!(r.size(), (20, 10));
        assert!(r.mask().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn inpaint_preset_starts_covered() {
        let r = StrokeRasterizer::for_inpaint(8, 8, 4.0).unwrap();
        assert!(r.mask().pixels().all(|p| p[3] == COVER_COLOR.a));
    }

    #[test]
    fn extend_without_begin_draws_a_dot() {
        let mut r = StrokeRasterizer::for_mosaic(40, 40, 10.0).unwrap();
        r.extend_stroke(Point::new(20.0, 20.0));
        let mask = r.mask();
        assert!(mask.get_pixel(20, 20)[3] > 0);
        assert_eq!(mask.get_pixel(2, 2)[3], 0);
        assert_eq!(mask.get_pixel(20, 30)[3], 0);
    }

    #[test]
    fn segment_covers_the_capsule_between_points() {
        let mut r = StrokeRasterizer::for_mosaic(100, 40, 10.0).unwrap();
        r.begin_stroke(Point::new(10.0, 20.0));
        r.extend_stroke(Point::new(90.0, 20.0));
        r.end_stroke();
        let mask = r.mask();
        for x in [10, 30, 50, 70, 89] {
            assert!(mask.get_pixel(x, 20)[3] > 0, "gap at x={x}");
        }
        // Round caps extend half a brush past the endpoints, no further.
        assert!(mask.get_pixel(7, 20)[3] > 0);
        assert_eq!(mask.get_pixel(2, 20)[3], 0);
        assert_eq!(mask.get_pixel(50, 30)[3], 0);
        assert!(!r.is_stroking());
    }

    #[test]
    fn erase_mode_clears_cover() {
        let mut r = StrokeRasterizer::for_inpaint(60, 60, 20.0).unwrap();
        r.begin_stroke(Point::new(30.0, 30.0));
        r.extend_stroke(Point::new(30.0, 30.0));
        let mask = r.mask();
        assert_eq!(mask.get_pixel(30, 30)[3], 0);
        assert_eq!(mask.get_pixel(0, 0)[3], COVER_COLOR.a);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut r = StrokeRasterizer::for_mosaic(30, 30, 8.0).unwrap();
        r.begin_stroke(Point::new(5.0, 5.0));
        r.extend_stroke(Point::new(25.0, 25.0));
        assert!(r.mask().pixels().any(|p| p[3] > 0));
        r.reset();
        assert!(r.mask().pixels().all(|p| p[3] == 0));
        assert!(!r.is_stroking());
    }

    #[test]
    fn brush_size_never_drops_below_one() {
        let mut r = StrokeRasterizer::for_mosaic(4, 4, 0.0).unwrap();
        assert!((r.brush_size() - 1.0).abs() < f32::EPSILON);
        r.set_brush_size(42.0);
        assert!((r.brush_size() - 42.0).abs() < f32::EPSILON);
    }
}

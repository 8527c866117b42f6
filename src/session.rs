//! Interactive mask editing session.
//!
//! A session owns one exclusive mask surface sized to the rendered image box.
//! Pointer events arrive in viewport coordinates; [`MaskSession::finish`]
//! hands back the mask at native resolution. Dropping a session without
//! finishing it is a cancellation and releases the surface.

use crate::codec::{self, OutputFormat};
use crate::compositor;
use crate::error::Result;
use crate::geometry::{DisplayGeometry, Point};
use crate::handle::ImageHandle;
use crate::stroke::{StrokeRasterizer, COVER_COLOR};

/// Smallest brush the editors offer.
pub const MIN_BRUSH: f32 = 10.0;
/// Largest brush the editors offer.
pub const MAX_BRUSH: f32 = 100.0;
/// Brush diameter a new session starts with.
pub const DEFAULT_BRUSH: f32 = 40.0;

/// Which editor a session backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// Everything starts covered; strokes reveal the region to inpaint.
    Inpaint,
    /// Nothing starts marked; strokes select blocks to pixelate.
    Mosaic,
}

/// One editing session over one source image.
pub struct MaskSession {
    kind: EditorKind,
    viewport: (f32, f32),
    geometry: DisplayGeometry,
    surface: StrokeRasterizer,
    dragging: bool,
}

impl MaskSession {
    /// Open a session for an image of `natural` size shown in `viewport`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Geometry`] for degenerate sizes or
    /// [`crate::Error::CanvasUnavailable`] if the surface cannot be allocated.
    pub fn new(kind: EditorKind, natural: (u32, u32), viewport: (f32, f32)) -> Result<Self> {
        let geometry = DisplayGeometry::fit(natural, viewport)?;
        let surface = Self::surface_for(kind, &geometry, DEFAULT_BRUSH)?;
        Ok(Self {
            kind,
            viewport,
            geometry,
            surface,
            dragging: false,
        })
    }

    /// Inpaint session for `source`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Decode`] if the source cannot be read, otherwise
    /// see [`MaskSession::new`].
    pub fn inpaint(source: &ImageHandle, viewport: (f32, f32)) -> Result<Self> {
        let img = codec::decode_as(source, "original")?;
        Self::new(EditorKind::Inpaint, img.dimensions(), viewport)
    }

    /// Mosaic session for `source`.
    ///
    /// # Errors
    ///
    /// See [`MaskSession::inpaint`].
    pub fn mosaic(source: &ImageHandle, viewport: (f32, f32)) -> Result<Self> {
        let img = codec::decode_as(source, "original")?;
        Self::new(EditorKind::Mosaic, img.dimensions(), viewport)
    }

    fn surface_for(kind: EditorKind, g: &DisplayGeometry, brush: f32) -> Result<StrokeRasterizer> {
        let (w, h) = g.surface_size();
        match kind {
            EditorKind::Inpaint => StrokeRasterizer::for_inpaint(w, h, brush),
            EditorKind::Mosaic => StrokeRasterizer::for_mosaic(w, h, brush),
        }
    }

    /// Editor this session backs.
    #[must_use]
    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    /// Current placement of the image in the viewport.
    #[must_use]
    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    /// Current brush diameter in display pixels.
    #[must_use]
    pub fn brush_size(&self) -> f32 {
        self.surface.brush_size()
    }

    /// Set the brush diameter, clamped to the editor range.
    pub fn set_brush_size(&mut self, size: f32) {
        self.surface.set_brush_size(size.clamp(MIN_BRUSH, MAX_BRUSH));
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Start a drag. Presses outside the rendered image are ignored.
    pub fn pointer_down(&mut self, p: Point) {
        if !self.geometry.contains(p) {
            return;
        }
        self.dragging = true;
        self.surface.begin_stroke(self.geometry.to_surface(p));
    }

    /// Extend the drag to `p`. Leaving the rendered image ends the drag.
    pub fn pointer_move(&mut self, p: Point) {
        if !self.dragging {
            return;
        }
        if !self.geometry.contains(p) {
            self.pointer_leave();
            return;
        }
        self.surface.extend_stroke(self.geometry.to_surface(p));
    }

    /// End the drag.
    pub fn pointer_up(&mut self) {
        self.dragging = false;
        self.surface.end_stroke();
    }

    /// The pointer left the drawing area; same as releasing it.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// The viewport changed size: recompute placement and start a blank mask.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Geometry`] for a degenerate viewport, leaving
    /// the session unchanged.
    pub fn resize_viewport(&mut self, viewport: (f32, f32)) -> Result<()> {
        self.rebuild(self.geometry.natural_size(), viewport)
    }

    /// A different source image was loaded: recompute placement and start a blank mask.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Geometry`] for a zero-size image, leaving the
    /// session unchanged.
    pub fn replace_image(&mut self, natural: (u32, u32)) -> Result<()> {
        self.rebuild(natural, self.viewport)
    }

    fn rebuild(&mut self, natural: (u32, u32), viewport: (f32, f32)) -> Result<()> {
        let geometry = DisplayGeometry::fit(natural, viewport)?;
        let surface = Self::surface_for(self.kind, &geometry, self.surface.brush_size())?;
        self.geometry = geometry;
        self.viewport = viewport;
        self.surface = surface;
        self.dragging = false;
        Ok(())
    }

    /// Clear every stroke.
    pub fn reset(&mut self) {
        self.surface.reset();
        self.dragging = false;
    }

    /// The display-resolution surface as currently drawn.
    #[must_use]
    pub fn preview(&self) -> codec::PixelBuffer {
        self.surface.mask()
    }

    /// Close the session and produce the native-resolution mask as a PNG.
    ///
    /// Inpaint sessions yield WHITE where the cover was erased and BLACK
    /// elsewhere; mosaic sessions yield the binary selection.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Encode`] if PNG encoding fails.
    pub fn finish(self) -> Result<ImageHandle> {
        let (w, h) = self.geometry.natural_size();
        let drawn = self.surface.mask();
        let mask = match self.kind {
            EditorKind::Inpaint => compositor::erased_region_mask(&drawn, COVER_COLOR, w, h),
            EditorKind::Mosaic => compositor::normalize_binary(&drawn, w, h),
        };
        codec::encode(&mask, OutputFormat::Png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn brush_is_clamped_to_editor_range() {
        let mut s = MaskSession::new(EditorKind::Mosaic, (100, 100), (100.0, 100.0)).unwrap();
        assert!((s.brush_size() - DEFAULT_BRUSH).abs() < f32::EPSILON);
        s.set_brush_size(2.0);
        assert!((s.brush_size() - MIN_BRUSH).abs() < f32::EPSILON);
        s.set_brush_size(500.0);
        assert!((s.brush_size() - MAX_BRUSH).abs() < f32::EPSILON);
    }

    #[test]
    fn moves_draw_only_while_dragging() {
        let mut s = MaskSession::new(EditorKind::Mosaic, (100, 100), (100.0, 100.0)).unwrap();
        s.pointer_move(Point::new(50.0, 50.0));
        assert!(s.preview().pixels().all(|p| p[3] == 0));

        s.pointer_down(Point::new(50.0, 50.0));
        s.pointer_move(Point::new(50.0, 50.0));
        s.pointer_up();
        assert!(s.preview().get_pixel(50, 50)[3] > 0);
        assert!(!s.is_dragging());
    }

    #[test]
    fn presses_outside_the_image_are_ignored() {
        // 200x100 image in a 100x100 viewport: rendered box y 25..75.
        let mut s = MaskSession::new(EditorKind::Mosaic, (200, 100), (100.0, 100.0)).unwrap();
        s.pointer_down(Point::new(50.0, 10.0));
        assert!(!s.is_dragging());
        s.pointer_down(Point::new(50.0, 50.0));
        assert!(s.is_dragging());
        s.pointer_move(Point::new(50.0, 90.0));
        assert!(!s.is_dragging());
    }

    #[test]
    fn resize_resets_the_mask() {
        let mut s = MaskSession::new(EditorKind::Mosaic, (100, 100), (100.0, 100.0)).unwrap();
        s.pointer_down(Point::new(50.0, 50.0));
        s.pointer_move(Point::new(60.0, 50.0));
        s.resize_viewport((50.0, 80.0)).unwrap();
        assert_eq!(s.preview().dimensions(), (50, 50));
        assert!(s.preview().pixels().all(|p| p[3] == 0));
        assert!(!s.is_dragging());
        assert!(s.resize_viewport((0.0, 10.0)).is_err());
        assert_eq!(s.preview().dimensions(), (50, 50));
    }

    #[test]
    fn replace_image_recomputes_geometry() {
        let mut s = MaskSession::new(EditorKind::Inpaint, (100, 100), (200.0, 200.0)).unwrap();
        s.replace_image((400, 100)).unwrap();
        assert_eq!(s.geometry().natural_size(), (400, 100));
        assert_eq!(s.preview().dimensions(), (200, 50));
        assert!(s.preview().pixels().all(|p| p[3] == COVER_COLOR.a));
    }

    #[test]
    fn mosaic_finish_is_binary_at_native_size() {
        let mut s = MaskSession::new(EditorKind::Mosaic, (200, 200), (100.0, 100.0)).unwrap();
        s.pointer_down(Point::new(50.0, 50.0));
        s.pointer_move(Point::new(50.0, 50.0));
        let handle = s.finish().unwrap();
        let mask = codec::decode(&handle).unwrap();
        assert_eq!(mask.dimensions(), (200, 200));
        assert_eq!(*mask.get_pixel(100, 100), Rgba([255, 255, 255, 255]));
        assert_eq!(*mask.get_pixel(5, 5), Rgba([0, 0, 0, 255]));
        assert!(mask
            .pixels()
            .all(|p| *p == Rgba([255, 255, 255, 255]) || *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn inpaint_finish_marks_erased_region_white() {
        let mut s = MaskSession::new(EditorKind::Inpaint, (100, 100), (100.0, 100.0)).unwrap();
        s.pointer_down(Point::new(50.0, 50.0));
        s.pointer_move(Point::new(50.0, 50.0));
        let mask = codec::decode(&s.finish().unwrap()).unwrap();
        assert_eq!(*mask.get_pixel(50, 50), Rgba([255, 255, 255, 255]));
        assert_eq!(*mask.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }
}

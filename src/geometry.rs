//! Display geometry: how a native-resolution image is letterboxed in a viewport.
//!
//! Editors draw masks on a surface the size of the *rendered* image box, while
//! compositing happens at native resolution. [`DisplayGeometry`] is the single
//! affine scale+offset transform between the two spaces.

use crate::error::{Error, Result};

/// A point in either display or native space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Construct a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Placement of an image inside a viewport with `object-fit: contain` semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    /// Width of the rendered image box.
    pub rendered_width: f32,
    /// Height of the rendered image box.
    pub rendered_height: f32,
    /// Distance from the viewport's top edge to the rendered box.
    pub offset_top: f32,
    /// Distance from the viewport's left edge to the rendered box.
    pub offset_left: f32,
    natural_width: u32,
    natural_height: u32,
}

impl DisplayGeometry {
    /// Fit an image of `natural` size into a `viewport`, preserving aspect ratio
    /// and centering along the axis with leftover space.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Geometry`] if either size is zero, negative or not finite.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(natural: (u32, u32), viewport: (f32, f32)) -> Result<Self> {
        let (nw, nh) = natural;
        let (vw, vh) = viewport;
        if nw == 0 || nh == 0 {
            return Err(Error::geometry(format!("image is {nw}x{nh}")));
        }
        if !(vw.is_finite() && vh.is_finite()) || vw <= 0.0 || vh <= 0.0 {
            return Err(Error::geometry(format!("viewport is {vw}x{vh}")));
        }

        let image_aspect = nw as f32 / nh as f32;
        let viewport_aspect = vw / vh;

        let (rendered_width, rendered_height, offset_left, offset_top) =
            if image_aspect > viewport_aspect {
                let h = vw / image_aspect;
                (vw, h, 0.0, (vh - h) / 2.0)
            } else {
                let w = vh * image_aspect;
                (w, vh, (vw - w) / 2.0, 0.0)
            };

        Ok(Self {
            rendered_width,
            rendered_height,
            offset_top,
            offset_left,
            natural_width: nw,
            natural_height: nh,
        })
    }

    /// Native image size this geometry was computed for.
    #[must_use]
    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    /// Native pixels per display pixel along x.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn scale_x(&self) -> f32 {
        self.natural_width as f32 / self.rendered_width
    }

    /// Native pixels per display pixel along y.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn scale_y(&self) -> f32 {
        self.natural_height as f32 / self.rendered_height
    }

    /// Pixel size of a drawing surface covering the rendered box.
    ///
    /// Fractional sizes truncate, as canvas width/height attributes do.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn surface_size(&self) -> (u32, u32) {
        (
            (self.rendered_width as u32).max(1),
            (self.rendered_height as u32).max(1),
        )
    }

    /// Translate a viewport point into the rendered box's local coordinates.
    #[must_use]
    pub fn to_surface(&self, p: Point) -> Point {
        Point::new(p.x - self.offset_left, p.y - self.offset_top)
    }

    /// Whether a viewport point falls inside the rendered box.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        let local = self.to_surface(p);
        (0.0..=self.rendered_width).contains(&local.x)
            && (0.0..=self.rendered_height).contains(&local.y)
    }

    /// Map a viewport point to native image coordinates.
    #[must_use]
    pub fn to_native(&self, p: Point) -> Point {
        let local = self.to_surface(p);
        Point::new(local.x * self.scale_x(), local.y * self.scale_y())
    }

    /// Map a native image point back to viewport coordinates.
    #[must_use]
    pub fn to_display(&self, p: Point) -> Point {
        Point::new(
            p.x / self.scale_x() + self.offset_left,
            p.y / self.scale_y() + self.offset_top,
        )
    }
}

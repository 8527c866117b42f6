//! Raster compositing and masking for image editing front ends.
//!
//! Everything here works on decoded RGBA buffers and exchanges images as
//! [`ImageHandle`]s (MIME type, encoded bytes, unique id), so results can be
//! passed straight to an external inpainting or generation service.
//!
//! - Masking: punch transparent holes for inpainting, normalize drawn
//!   selections to binary masks, paste display-size drawings back at native size.
//! - Mosaic: block-average selected regions with width-proportional blocks.
//! - Overlays: border frame with a text block, speech bubbles with a tail,
//!   and a brand bar with logo and name.
//! - Editing sessions: pointer-driven brush strokes in viewport coordinates,
//!   reconciled with the image's native resolution.
//!
//! # Quick Start
//!
//! ```no_run
//! use canvas_compositor::{Compositor, ImageHandle};
//! use std::path::Path;
//!
//! let engine = Compositor::new();
//! let photo = ImageHandle::from_path(Path::new("photo.jpg")).unwrap();
//! let mask = ImageHandle::from_path(Path::new("mask.png")).unwrap();
//! let hole = engine.apply_erase_mask(&photo, &mask).unwrap();
//! hole.write_to(Path::new("photo_erased.png")).unwrap();
//! ```
//!
//! # Editing sessions
//!
//! A [`MaskSession`] turns pointer events on a letterboxed preview into a
//! native-resolution mask.
//!
//! ```no_run
//! use canvas_compositor::{Compositor, ImageHandle, MaskSession, Point};
//! use std::path::Path;
//!
//! let photo = ImageHandle::from_path(Path::new("photo.png")).unwrap();
//! let mut session = MaskSession::mosaic(&photo, (592.0, 592.0)).unwrap();
//! session.pointer_down(Point::new(300.0, 300.0));
//! session.pointer_move(Point::new(340.0, 310.0));
//! session.pointer_up();
//! let mask = session.finish().unwrap();
//! let pixelated = Compositor::new().apply_mosaic(&photo, &mask).unwrap();
//! ```

#![deny(missing_docs)]

pub mod background;
pub mod canvas;
pub mod codec;
pub mod color;
pub mod compositor;
mod engine;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod mosaic;
pub mod overlay;
pub mod session;
pub mod stroke;
pub mod text;

pub use codec::{OutputFormat, PixelBuffer};
pub use color::Color;
pub use engine::{
    default_output_path, merge_by_source, BatchResult, ComposeOptions, Compositor, Operation,
    ProcessOptions, ProcessResult,
};
pub use error::{Error, Result};
pub use geometry::{DisplayGeometry, Point};
pub use handle::{is_supported_image, ImageHandle};
pub use overlay::{
    BarPosition, BrandOverlaySettings, OverlaySettings, SpeechBubbleSettings, TailDirection,
};
pub use session::{EditorKind, MaskSession};
pub use text::{FontFace, TextAlign, TextBaseline, Typeface};

//! Error types for the canvas-compositor crate.

/// Errors that can occur while decoding, compositing or rendering images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bytes behind an image handle are not a readable raster image.
    #[error("failed to decode {input} image: {reason}")]
    Decode {
        /// Which input failed (`"original"`, `"mask"`, `"logo"`, ...).
        input: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// Encoding a pixel buffer into a handle failed.
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),

    /// A drawing surface of the requested size could not be allocated.
    #[error("drawing surface unavailable ({width}x{height})")]
    CanvasUnavailable {
        /// Requested surface width in pixels.
        width: u32,
        /// Requested surface height in pixels.
        height: u32,
    },

    /// Degenerate image or viewport dimensions.
    #[error("invalid geometry: {0}")]
    Geometry(String),

    /// Text was requested but no usable typeface is available.
    #[error("font unavailable: {0}")]
    FontUnavailable(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    /// An image payload was not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A settings document could not be parsed.
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format or MIME type is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    pub(crate) fn decode(input: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            input,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

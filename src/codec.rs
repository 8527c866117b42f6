//! Image codec adapter: [`ImageHandle`] <-> [`PixelBuffer`].

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::{Error, Result};
use crate::handle::{ImageHandle, JPEG_MIME, PNG_MIME};

/// Decoded working representation: straight-alpha RGBA8, `width * height * 4` bytes.
pub type PixelBuffer = RgbaImage;

/// Output encoding for [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossless PNG. Required whenever the alpha channel carries meaning.
    Png,
    /// JPEG at the given quality (1-100). Alpha is discarded.
    Jpeg {
        /// Encoder quality.
        quality: u8,
    },
}

impl OutputFormat {
    /// Format to use for a fully opaque result derived from a `mime_type` source.
    ///
    /// JPEG sources stay JPEG; everything else becomes PNG.
    #[must_use]
    pub fn preserving(mime_type: &str, jpeg_quality: u8) -> Self {
        if mime_type == JPEG_MIME {
            Self::Jpeg {
                quality: jpeg_quality,
            }
        } else {
            Self::Png
        }
    }
}

/// Decode a handle into a pixel buffer.
///
/// `input` names the role of the handle in error messages.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the bytes are not a readable raster image or
/// decode to zero width or height.
pub fn decode_as(handle: &ImageHandle, input: &'static str) -> Result<PixelBuffer> {
    let format = ImageFormat::from_mime_type(handle.mime_type());
    let img = match format {
        Some(f) => image::load_from_memory_with_format(handle.data(), f)
            .or_else(|_| image::load_from_memory(handle.data())),
        None => image::load_from_memory(handle.data()),
    }
    .map_err(|e| Error::decode(input, e))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(Error::decode(input, "image has zero width or height"));
    }
    Ok(img.into_rgba8())
}

/// Decode a handle into a pixel buffer.
///
/// # Errors
///
/// See [`decode_as`].
pub fn decode(handle: &ImageHandle) -> Result<PixelBuffer> {
    decode_as(handle, "source")
}

/// Decode two handles and return once both have finished.
///
/// With the `cli` feature the two decodes run concurrently; completion order
/// does not matter. The first input's error wins if both fail.
///
/// # Errors
///
/// Returns [`Error::Decode`] naming whichever input failed.
pub fn decode_pair(
    first: (&ImageHandle, &'static str),
    second: (&ImageHandle, &'static str),
) -> Result<(PixelBuffer, PixelBuffer)> {
    #[cfg(feature = "cli")]
    let (a, b) = rayon::join(
        || decode_as(first.0, first.1),
        || decode_as(second.0, second.1),
    );

    #[cfg(not(feature = "cli"))]
    let (a, b) = (decode_as(first.0, first.1), decode_as(second.0, second.1));

    Ok((a?, b?))
}

/// Encode a pixel buffer into a new handle with a fresh id.
///
/// # Errors
///
/// Returns [`Error::Geometry`] for an empty buffer or [`Error::Encode`] if
/// the encoder fails.
pub fn encode(buffer: &PixelBuffer, format: OutputFormat) -> Result<ImageHandle> {
    if buffer.width() == 0 || buffer.height() == 0 {
        return Err(Error::geometry("cannot encode an empty pixel buffer"));
    }

    let mut bytes = Cursor::new(Vec::new());
    let mime = match format {
        OutputFormat::Png => {
            buffer
                .write_to(&mut bytes, ImageFormat::Png)
                .map_err(Error::Encode)?;
            PNG_MIME
        }
        OutputFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgba8(buffer.clone()).into_rgb8();
            let quality = quality.clamp(1, 100);
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
            encoder.encode_image(&rgb).map_err(Error::Encode)?;
            JPEG_MIME
        }
    };

    Ok(ImageHandle::new(mime, bytes.into_inner()))
}

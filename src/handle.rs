//! Opaque image handles: the only image form that crosses the crate boundary.

use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use uuid::Uuid;

use crate::error::{Error, Result};

/// MIME type of PNG payloads.
pub const PNG_MIME: &str = "image/png";
/// MIME type of JPEG payloads.
pub const JPEG_MIME: &str = "image/jpeg";

/// An encoded image plus its MIME type and a unique identity.
///
/// Handles are immutable. Every transform produces a new handle with a fresh id;
/// batch callers match results back to inputs through [`ImageHandle::id`].
#[derive(Clone, PartialEq, Eq)]
pub struct ImageHandle {
    id: Uuid,
    mime_type: String,
    data: Vec<u8>,
}

impl ImageHandle {
    /// Wrap encoded bytes under a freshly minted id.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Wrap a base64 payload, as produced by browser data URLs and the AI service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Base64`] if the payload is not valid base64.
    pub fn from_base64(mime_type: impl Into<String>, payload: &str) -> Result<Self> {
        let data = BASE64.decode(payload.trim())?;
        Ok(Self::new(mime_type, data))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the URL is not a base64 data URL,
    /// or [`Error::Base64`] if the payload is malformed.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| Error::UnsupportedFormat("not a data URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::UnsupportedFormat("data URL without payload".to_string()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::UnsupportedFormat("data URL is not base64".to_string()))?;
        Self::from_base64(mime, payload)
    }

    /// Read an image file, guessing the MIME type from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for unknown extensions or
    /// [`Error::Io`] if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime = mime_for_path(path)
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        let data = std::fs::read(path)?;
        Ok(Self::new(mime, data))
    }

    /// Unique identity of this handle.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// MIME type of the payload.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Encoded image bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload as standard base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// Payload as a `data:` URL.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Write the encoded bytes to disk unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if writing fails.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Preferred file extension for this handle's MIME type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            JPEG_MIME => "jpg",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            _ => "png",
        }
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.id)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// MIME type for a supported image file extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some(PNG_MIME),
        "jpg" | "jpeg" => Some(JPEG_MIME),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    mime_for_path(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_handle_gets_a_fresh_id() {
        let a = ImageHandle::new(PNG_MIME, vec![1, 2, 3]);
        let b = ImageHandle::new(PNG_MIME, vec![1, 2, 3]);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn data_url_round_trip_preserves_payload() {
        let h = ImageHandle::new(JPEG_MIME, vec![0xff, 0xd8, 0x00, 0x10]);
        let url = h.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        let back = ImageHandle::from_data_url(&url).unwrap();
        assert_eq!(back.mime_type(), JPEG_MIME);
        assert_eq!(back.data(), h.data());
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        assert!(matches!(
            ImageHandle::from_data_url("image/png;base64,AAAA"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ImageHandle::from_data_url("data:image/png,AAAA"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ImageHandle::from_data_url("data:image/png;base64,@@@"),
            Err(Error::Base64(_))
        ));
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.webp")));
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo")));
    }
}

//! Compositing engine: handle-in, handle-out operations plus file helpers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::background;
use crate::codec::{self, OutputFormat, PixelBuffer};
use crate::compositor;
use crate::error::Result;
use crate::handle::{is_supported_image, mime_for_path, ImageHandle};
use crate::mosaic;
use crate::overlay::{brand, frame_text, speech_bubble};
use crate::overlay::{BrandOverlaySettings, OverlaySettings, SpeechBubbleSettings};
use crate::text::Typeface;

/// Output encoding preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Quality used when an overlay result is written as JPEG.
    pub jpeg_quality: u8,
    /// Keep JPEG sources as JPEG for overlays. Masking results are always PNG.
    pub keep_source_format: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: 92,
            keep_source_format: false,
        }
    }
}

/// Options controlling file processing output.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was left alone (operation disabled).
    pub skipped: bool,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            message: String::new(),
        }
    }

    fn failed(path: &Path, message: String) -> Self {
        Self {
            message,
            ..Self::new(path)
        }
    }
}

/// Outcome of one item of a batch, tagged with the id of its input.
#[derive(Debug)]
pub struct BatchResult {
    /// Id of the input handle this result belongs to.
    pub source_id: Uuid,
    /// The new handle, or why it could not be produced.
    pub outcome: Result<ImageHandle>,
}

/// One file-level operation.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Punch a transparent hole where the mask file is white.
    EraseMask {
        /// Mask image file.
        mask: PathBuf,
    },
    /// Pixelate the blocks selected by the mask file.
    Mosaic {
        /// Mask image file.
        mask: PathBuf,
    },
    /// Frame and text block.
    FrameText(OverlaySettings),
    /// Speech bubble.
    Bubble(SpeechBubbleSettings),
    /// Brand bar.
    Brand(BrandOverlaySettings),
}

impl Operation {
    /// Suffix appended to output file stems.
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::EraseMask { .. } => "erased",
            Self::Mosaic { .. } => "mosaic",
            Self::FrameText(_) => "framed",
            Self::Bubble(_) => "bubble",
            Self::Brand(_) => "branded",
        }
    }
}

/// The compositing engine.
///
/// Holds the typeface used for text overlays and output preferences. Create
/// once and reuse; every operation is independent and leaves its inputs
/// untouched.
#[derive(Clone, Default)]
pub struct Compositor {
    typeface: Option<Arc<dyn Typeface>>,
    options: ComposeOptions,
}

impl Compositor {
    /// An engine without a typeface. Operations that need to draw text fail
    /// with [`crate::Error::FontUnavailable`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine drawing text with `face`.
    #[must_use]
    pub fn with_typeface(face: impl Typeface + 'static) -> Self {
        Self {
            typeface: Some(Arc::new(face)),
            options: ComposeOptions::default(),
        }
    }

    /// Replace the output preferences.
    #[must_use]
    pub fn with_options(mut self, options: ComposeOptions) -> Self {
        self.options = options;
        self
    }

    /// Output preferences in effect.
    #[must_use]
    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    fn face(&self) -> Option<&dyn Typeface> {
        self.typeface.as_deref()
    }

    fn overlay_format(&self, source: &ImageHandle) -> OutputFormat {
        if self.options.keep_source_format {
            OutputFormat::preserving(source.mime_type(), self.options.jpeg_quality)
        } else {
            OutputFormat::Png
        }
    }

    /// Make `original` transparent wherever `mask` is white.
    ///
    /// Both images are decoded together; the mask is rescaled to the
    /// original's size. The result is always PNG.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Decode`] naming the input that failed, or
    /// [`crate::Error::Encode`].
    pub fn apply_erase_mask(
        &self,
        original: &ImageHandle,
        mask: &ImageHandle,
    ) -> Result<ImageHandle> {
        let (img, mask) = codec::decode_pair((original, "original"), (mask, "mask"))?;
        codec::encode(&compositor::erase_to_transparent(&img, &mask), OutputFormat::Png)
    }

    /// Pixelate the blocks of `original` selected by a binary `stroke_mask`.
    ///
    /// # Errors
    ///
    /// See [`Compositor::apply_erase_mask`].
    pub fn apply_mosaic(
        &self,
        original: &ImageHandle,
        stroke_mask: &ImageHandle,
    ) -> Result<ImageHandle> {
        let (img, mask) = codec::decode_pair((original, "original"), (stroke_mask, "mask"))?;
        codec::encode(&mosaic::apply_mosaic(&img, &mask), OutputFormat::Png)
    }

    /// Scale a display-size drawing onto `original` at native size.
    ///
    /// # Errors
    ///
    /// See [`Compositor::apply_erase_mask`].
    pub fn paste_overlay(
        &self,
        original: &ImageHandle,
        drawing: &ImageHandle,
    ) -> Result<ImageHandle> {
        let (img, drawing) = codec::decode_pair((original, "original"), (drawing, "overlay"))?;
        codec::encode(&compositor::direct_paste(&img, &drawing), self.overlay_format(original))
    }

    /// Draw a frame and text block over `original`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Decode`], [`crate::Error::FontUnavailable`] if
    /// there is text but no typeface, or [`crate::Error::Encode`].
    pub fn render_frame_and_text(
        &self,
        original: &ImageHandle,
        settings: &OverlaySettings,
    ) -> Result<ImageHandle> {
        let img = codec::decode_as(original, "original")?;
        let out = self.frame_and_text_buffer(&img, settings)?;
        codec::encode(&out, self.overlay_format(original))
    }

    /// Frame and text over an already decoded buffer, for live previews.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FontUnavailable`] if there is text but no typeface.
    pub fn frame_and_text_buffer(
        &self,
        img: &PixelBuffer,
        settings: &OverlaySettings,
    ) -> Result<PixelBuffer> {
        frame_text::render(img, settings, self.face())
    }

    /// Draw a speech bubble over `original`.
    ///
    /// # Errors
    ///
    /// See [`Compositor::render_frame_and_text`].
    pub fn render_speech_bubble(
        &self,
        original: &ImageHandle,
        settings: &SpeechBubbleSettings,
    ) -> Result<ImageHandle> {
        let img = codec::decode_as(original, "original")?;
        let out = speech_bubble::render(&img, settings, self.face())?;
        codec::encode(&out, self.overlay_format(original))
    }

    /// Draw the brand bar over `original`.
    ///
    /// A disabled overlay returns `original` itself, id included.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Decode`] for the image or the logo,
    /// [`crate::Error::FontUnavailable`] if there is a name but no typeface,
    /// or [`crate::Error::Encode`].
    pub fn apply_brand_overlay(
        &self,
        original: &ImageHandle,
        settings: &BrandOverlaySettings,
    ) -> Result<ImageHandle> {
        if !settings.enabled {
            return Ok(original.clone());
        }
        let (img, logo) = match &settings.logo {
            Some(logo) => {
                let (img, logo) = codec::decode_pair((original, "original"), (logo, "logo"))?;
                (img, Some(logo))
            }
            None => (codec::decode_as(original, "original")?, None),
        };
        let out = brand::render(&img, settings, logo.as_ref(), self.face())?;
        codec::encode(&out, OutputFormat::Png)
    }

    /// Whether `image` has transparency or a flat single-color background.
    /// Never fails; undecodable input yields `false`.
    #[must_use]
    #[allow(clippy::unused_self)] // method on `self` for API consistency
    pub fn detect_empty_background(&self, image: &ImageHandle) -> bool {
        background::detect_empty_background(image)
    }

    /// Apply the same frame/text settings to every image.
    ///
    /// Images are processed independently (in parallel with the `cli`
    /// feature); results carry their source id and may complete in any order.
    #[must_use]
    pub fn batch_frame_and_text(
        &self,
        images: &[ImageHandle],
        settings: &OverlaySettings,
    ) -> Vec<BatchResult> {
        let run = |image: &ImageHandle| BatchResult {
            source_id: image.id(),
            outcome: self.render_frame_and_text(image, settings),
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            images.par_iter().map(run).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            images.iter().map(run).collect()
        }
    }

    /// Run `op` on one file and write the result to `output`.
    ///
    /// If `output`'s extension does not match the produced format (a JPEG
    /// overlay result written to `*.png`, say), the extension is replaced.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path, op: &Operation) -> ProcessResult {
        let mut result = ProcessResult::new(input);

        if let Operation::Brand(settings) = op {
            if !settings.enabled {
                result.success = true;
                result.skipped = true;
                result.message = "Brand overlay disabled".to_string();
                return result;
            }
        }

        let source = match ImageHandle::from_path(input) {
            Ok(h) => h,
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let produced = match op {
            Operation::EraseMask { mask } => {
                ImageHandle::from_path(mask).and_then(|m| self.apply_erase_mask(&source, &m))
            }
            Operation::Mosaic { mask } => {
                ImageHandle::from_path(mask).and_then(|m| self.apply_mosaic(&source, &m))
            }
            Operation::FrameText(s) => self.render_frame_and_text(&source, s),
            Operation::Bubble(s) => self.render_speech_bubble(&source, s),
            Operation::Brand(s) => self.apply_brand_overlay(&source, s),
        };

        let handle = match produced {
            Ok(h) => h,
            Err(e) => {
                result.message = e.to_string();
                return result;
            }
        };

        let output = output_path_for(output, &handle);
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match handle.write_to(&output) {
            Ok(()) => {
                result.success = true;
                result.message = format!("Wrote {} ({})", output.display(), handle.mime_type());
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Run `op` on every supported image in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        op: &Operation,
    ) -> Vec<ProcessResult> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult::failed(
                    input_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::failed(
                    output_dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        let run = |input: &PathBuf| {
            let output = output_dir.join(output_file_name(input, op.suffix()));
            self.process_file(input, &output, op)
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries.par_iter().map(run).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries.iter().map(run).collect()
        }
    }
}

/// Replace entries of `images` with batch outputs, matching by source id.
///
/// Failed items and unknown ids leave the list as it was. Returns how many
/// entries were replaced.
pub fn merge_by_source(images: &mut [ImageHandle], results: Vec<BatchResult>) -> usize {
    let mut replaced = 0;
    for result in results {
        let Ok(handle) = result.outcome else {
            continue;
        };
        if let Some(slot) = images.iter_mut().find(|h| h.id() == result.source_id) {
            *slot = handle;
            replaced += 1;
        }
    }
    replaced
}

fn output_path_for(requested: &Path, handle: &ImageHandle) -> PathBuf {
    if mime_for_path(requested) == Some(handle.mime_type()) {
        requested.to_path_buf()
    } else {
        requested.with_extension(handle.extension())
    }
}

fn output_file_name(input: &Path, suffix: &str) -> String {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    format!("{stem}_{suffix}.png")
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` with suffix `"mosaic"` becomes `"photo_mosaic.png"`.
/// [`Compositor::process_file`] swaps the `.png` for `.jpg` when the result is JPEG.
#[must_use]
pub fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(output_file_name(input, suffix))
}

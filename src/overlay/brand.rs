//! Full-width brand bar carrying an optional logo and a name.

use serde::{Deserialize, Serialize};

use super::canvas_size;
use crate::canvas;
use crate::codec::PixelBuffer;
use crate::color::Color;
use crate::error::Result;
use crate::handle::ImageHandle;
use crate::text::{self, TextAlign, TextBaseline, TextStyle, Typeface};

/// Fraction of the bar height kept clear above and below the content.
const PADDING_RATIO: f32 = 0.15;
/// Name font size as a fraction of the content height.
const FONT_RATIO: f32 = 0.7;
/// Gap between logo and name as a fraction of the content height.
const SPACING_RATIO: f32 = 0.5;

/// Edge the bar is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarPosition {
    /// Along the top edge.
    Top,
    /// Along the bottom edge.
    #[default]
    Bottom,
}

/// Settings for the brand bar.
///
/// In JSON the logo is a `data:` URL or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrandOverlaySettings {
    /// Draw the bar at all.
    pub enabled: bool,
    /// Logo drawn left of the name.
    #[serde(with = "data_url")]
    pub logo: Option<ImageHandle>,
    /// Name drawn right of the logo.
    pub name: String,
    /// Edge the bar is attached to.
    pub position: BarPosition,
    /// Bar fill.
    pub bg_color: Color,
    /// Name fill.
    pub text_color: Color,
    /// Bar height as a fraction of the image height.
    pub bar_height_ratio: f32,
}

impl Default for BrandOverlaySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            logo: None,
            name: String::new(),
            position: BarPosition::Bottom,
            bg_color: Color::BLACK,
            text_color: Color::WHITE,
            bar_height_ratio: 0.08,
        }
    }
}

mod data_url {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::handle::ImageHandle;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(logo: &Option<ImageHandle>, s: S) -> Result<S::Ok, S::Error> {
        match logo {
            Some(h) => s.serialize_some(&h.to_data_url()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ImageHandle>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|url| ImageHandle::from_data_url(&url).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Where the bar, logo and name land on a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrandLayout {
    /// Top of the bar.
    pub bar_y: f32,
    /// Bar height.
    pub bar_height: f32,
    /// Logo box `(x, y, width, height)`, if there is a logo.
    pub logo: Option<(f32, f32, f32, f32)>,
    /// Left end of the name on its middle line.
    pub name_at: (f32, f32),
    /// Name font size.
    pub font_size: f32,
}

impl BrandLayout {
    /// Lay out the bar for a canvas of `(width, height)`.
    ///
    /// `logo_size` is the logo's native size; `name_width` the measured width
    /// of the name at [`BrandLayout::font_size_for`].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(
        settings: &BrandOverlaySettings,
        canvas: (f32, f32),
        logo_size: Option<(u32, u32)>,
        name_width: f32,
    ) -> Self {
        let (w, h) = canvas;
        let bar_height = h * settings.bar_height_ratio;
        let bar_y = match settings.position {
            BarPosition::Top => 0.0,
            BarPosition::Bottom => h - bar_height,
        };
        let padding = bar_height * PADDING_RATIO;
        let content = bar_height - padding * 2.0;

        let logo_width = logo_size
            .filter(|&(_, lh)| lh > 0)
            .map_or(0.0, |(lw, lh)| lw as f32 / lh as f32 * content);
        let spacing = if logo_size.is_some() && !settings.name.is_empty() {
            content * SPACING_RATIO
        } else {
            0.0
        };

        let mut x = (w - (logo_width + spacing + name_width)) / 2.0;
        let logo = logo_size.map(|_| {
            let r = (x, bar_y + padding, logo_width, content);
            x += logo_width + spacing;
            r
        });

        Self {
            bar_y,
            bar_height,
            logo,
            name_at: (x, bar_y + bar_height / 2.0),
            font_size: content * FONT_RATIO,
        }
    }

    /// Name font size for a bar on a canvas of the given height.
    #[must_use]
    pub fn font_size_for(settings: &BrandOverlaySettings, canvas_height: f32) -> f32 {
        let bar = canvas_height * settings.bar_height_ratio;
        (bar - bar * PADDING_RATIO * 2.0) * FONT_RATIO
    }
}

/// Draw the bar, the logo and the name over a copy of `source`.
///
/// `logo` is the already decoded logo, if any. A disabled overlay returns an
/// unchanged copy.
///
/// # Errors
///
/// Returns [`crate::Error::FontUnavailable`] if there is a name but no
/// typeface, or [`crate::Error::CanvasUnavailable`] if no drawing surface can
/// be allocated.
pub fn render(
    source: &PixelBuffer,
    settings: &BrandOverlaySettings,
    logo: Option<&PixelBuffer>,
    face: Option<&dyn Typeface>,
) -> Result<PixelBuffer> {
    if !settings.enabled {
        return Ok(source.clone());
    }
    let (w, h) = canvas_size(source);
    let name_face = if settings.name.is_empty() {
        None
    } else {
        Some(text::require(face)?)
    };
    let name_width = name_face.map_or(0.0, |f| {
        f.measure(&settings.name, BrandLayout::font_size_for(settings, h))
    });
    let logo_size = logo.map(PixelBuffer::dimensions);
    let layout = BrandLayout::compute(settings, (w, h), logo_size, name_width);

    let mut out = source.clone();
    canvas::with_pixmap(&mut out, |pm| {
        canvas::fill_rect(pm, 0.0, layout.bar_y, w, layout.bar_height, settings.bg_color);
    })?;

    if let (Some(img), Some((lx, ly, lw, lh))) = (logo, layout.logo) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (sw, sh) = (lw.round().max(1.0) as u32, lh.round().max(1.0) as u32);
        #[allow(clippy::cast_possible_truncation)]
        let (dx, dy) = (lx.round() as i64, ly.round() as i64);
        let scaled = canvas::scale_to(img, sw, sh);
        canvas::draw_image(&mut out, &scaled, dx, dy);
    }

    if let Some(face) = name_face {
        let style = TextStyle {
            size: layout.font_size,
            color: settings.text_color,
            align: TextAlign::Left,
            baseline: TextBaseline::Middle,
        };
        text::fill_text(&mut out, face, &settings.name, layout.name_at, &style);
    }
    Ok(out)
}

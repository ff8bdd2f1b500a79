//! Text watermark rendering.
//!
//! This module renders a line of text to a transparent PNG whose canvas is
//! derived from the measured text: the glyphs sit flush against the top-left
//! corner, followed by a fixed transparent margin on the right and bottom.
//!
//! # Example
//!
//! ```
//! use project_identifier::watermark::{ImageRenderer, TextRenderOptions};
//!
//! let renderer = ImageRenderer::default();
//! let image = renderer.render("MAP", &TextRenderOptions::default());
//! assert!(image.width() > 50);
//! assert!(image.png.starts_with(&[0x89, b'P', b'N', b'G']));
//! ```

use super::fonts::{fallback_font, EmbeddedFontCatalog, FontCatalog};
use super::WatermarkError;
use crate::constants::{
    log_preview, DEFAULT_FONT_SIZE_PX, DEFAULT_TEXT_COLOR_ARGB, FALLBACK_FONT_FAMILY,
    MARGIN_BOTTOM_PX, MARGIN_RIGHT_PX, MAX_CANVAS_PIXELS, MIN_FONT_SIZE_PX,
};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// ARGB colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Unpack a `0xAARRGGBB` value.
    pub fn from_argb(argb: u32) -> Self {
        Self::new(
            (argb >> 24) as u8,
            (argb >> 16) as u8,
            (argb >> 8) as u8,
            argb as u8,
        )
    }

    /// Pack into `0xAARRGGBB`.
    pub fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Opaque white.
    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// The low-opacity white used when no colour is configured.
    pub fn watermark_default() -> Self {
        Self::from_argb(DEFAULT_TEXT_COLOR_ARGB)
    }
}

/// Parse a hex colour string into an ARGB colour.
///
/// Supports `#RGB` and `#RRGGBB` (both opaque) and `#AARRGGBB`.
///
/// ```
/// use project_identifier::watermark::{parse_hex_color, Color};
///
/// assert_eq!(parse_hex_color("#F00").unwrap(), Color::new(255, 255, 0, 0));
/// assert_eq!(parse_hex_color("#26FFFFFF").unwrap().a, 0x26);
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let hex = hex
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::ColorError("Color must start with '#'".to_string()))?;

    let digit = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| WatermarkError::ColorError(format!("Invalid hex digits '{}'", s)))
    };

    if !hex.is_ascii() {
        return Err(WatermarkError::ColorError(
            "Color must contain only hex digits".to_string(),
        ));
    }

    match hex.len() {
        3 => {
            // #RGB - each digit doubled: 0xF -> 0xFF
            let r = digit(&hex[0..1])?;
            let g = digit(&hex[1..2])?;
            let b = digit(&hex[2..3])?;
            Ok(Color::new(255, r * 17, g * 17, b * 17))
        }
        6 => Ok(Color::new(
            255,
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        8 => Ok(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
            digit(&hex[6..8])?,
        )),
        _ => Err(WatermarkError::ColorError(format!(
            "Color must be #RGB, #RRGGBB or #AARRGGBB, got {} characters",
            hex.len()
        ))),
    }
}

/// Optional style overrides; `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRenderOptions {
    /// Requested font family.
    pub font_family: Option<String>,
    /// Requested font size (em size) in pixels.
    pub font_size_px: Option<i32>,
    /// Packed `0xAARRGGBB` text colour.
    pub color_argb: Option<u32>,
}

impl TextRenderOptions {
    /// Effective font size: the requested size clamped to at least
    /// [`MIN_FONT_SIZE_PX`], or [`DEFAULT_FONT_SIZE_PX`].
    pub fn effective_font_size(&self) -> u32 {
        match self.font_size_px {
            Some(size) if size >= MIN_FONT_SIZE_PX as i32 => size as u32,
            Some(_) => MIN_FONT_SIZE_PX,
            None => DEFAULT_FONT_SIZE_PX,
        }
    }

    /// Effective colour: the configured one verbatim, or translucent white.
    pub fn effective_color(&self) -> Color {
        self.color_argb
            .map(Color::from_argb)
            .unwrap_or_else(Color::watermark_default)
    }

    /// Requested family, if present and non-blank.
    pub fn requested_family(&self) -> Option<&str> {
        self.font_family
            .as_deref()
            .map(str::trim)
            .filter(|family| !family.is_empty())
    }
}

/// Font metrics of a laid-out line, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMetrics {
    pub ascent: u32,
    pub descent: u32,
    pub width: u32,
}

/// A rendered watermark: the raster and its PNG encoding.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub raster: RgbaImage,
    pub png: Vec<u8>,
}

impl RenderedImage {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }
}

/// Scale at which the font's em square is `size_px` pixels tall.
fn em_scale(font: &FontArc, size_px: u32) -> PxScale {
    let size = size_px as f32;
    match font.units_per_em() {
        Some(units_per_em) if units_per_em > 0.0 => {
            PxScale::from(size * font.height_unscaled() / units_per_em)
        }
        _ => PxScale::from(size),
    }
}

/// Measure `text` without allocating a canvas.
pub fn measure_text(font: &FontArc, size_px: u32, text: &str) -> TextMetrics {
    let scaled_font = font.as_scaled(em_scale(font, size_px));

    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;
    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }
        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    TextMetrics {
        ascent: scaled_font.ascent().ceil().max(0.0) as u32,
        descent: (-scaled_font.descent()).ceil().max(0.0) as u32,
        width: width.ceil().max(0.0) as u32,
    }
}

/// Encode an RGBA raster as PNG.
pub fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>, WatermarkError> {
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder as _;
    use std::io::Cursor;

    let mut output = Cursor::new(Vec::new());
    let encoder = PngEncoder::new(&mut output);
    encoder
        .write_image(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| WatermarkError::EncodeError(e.to_string()))?;

    Ok(output.into_inner())
}

/// The minimal 1x1 fully transparent image.
pub fn blank_image() -> RenderedImage {
    let raster = RgbaImage::new(1, 1);
    let png = encode_png(&raster).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to encode blank watermark");
        Vec::new()
    });
    RenderedImage { raster, png }
}

/// Renders watermark text using fonts from an injected catalog.
#[derive(Clone)]
pub struct ImageRenderer {
    catalog: Arc<dyn FontCatalog>,
}

impl ImageRenderer {
    pub fn new(catalog: Arc<dyn FontCatalog>) -> Self {
        Self { catalog }
    }

    /// Render `text` and return PNG bytes.
    pub fn render_png(
        &self,
        text: &str,
        font_family: Option<&str>,
        font_size_px: Option<i32>,
        color_argb: Option<u32>,
    ) -> Vec<u8> {
        let options = TextRenderOptions {
            font_family: font_family.map(str::to_string),
            font_size_px,
            color_argb,
        };
        self.render(text, &options).png
    }

    /// Render `text` to a raster and its PNG encoding.
    ///
    /// Never fails: blank text and unrecoverable render errors both produce
    /// the 1x1 transparent image.
    pub fn render(&self, text: &str, options: &TextRenderOptions) -> RenderedImage {
        tracing::info!(
            len = text.chars().count(),
            text = %log_preview(text),
            "Rendering watermark PNG"
        );

        if text.trim().is_empty() {
            return blank_image();
        }

        match self.try_render(text, options) {
            Ok(image) => {
                tracing::debug!(
                    bytes = image.png.len(),
                    width = image.width(),
                    height = image.height(),
                    "PNG rendered"
                );
                image
            }
            Err(e) => {
                tracing::warn!(error = %e, "Watermark rendering failed; using blank image");
                blank_image()
            }
        }
    }

    /// Pick the font for `options`, substituting the bundled sans-serif face
    /// for unknown or unloadable families.
    pub fn resolve_font(
        &self,
        options: &TextRenderOptions,
    ) -> Result<(String, FontArc), WatermarkError> {
        if let Some(family) = options.requested_family() {
            let known = self
                .catalog
                .family_names()
                .map_or(true, |names| names.contains(family));

            if known {
                if let Some(font) = self.catalog.load(family) {
                    return Ok((family.to_string(), font));
                }
                tracing::debug!(family = family, "Font family could not be loaded; using fallback");
            } else {
                tracing::debug!(family = family, "Font family not installed; using fallback");
            }
        }

        Ok((FALLBACK_FONT_FAMILY.to_string(), fallback_font()?))
    }

    fn try_render(
        &self,
        text: &str,
        options: &TextRenderOptions,
    ) -> Result<RenderedImage, WatermarkError> {
        let (family, font) = self.resolve_font(options)?;
        let font_size = options.effective_font_size();
        let color = options.effective_color();

        let metrics = measure_text(&font, font_size, text);
        let (width, height) = canvas_size(&metrics)?;

        let raster = draw_text(&font, font_size, text, metrics.ascent, width, height, color);
        tracing::info!(
            x = 0,
            y = metrics.ascent,
            canvas_width = width,
            canvas_height = height,
            text_width = metrics.width,
            ascent = metrics.ascent,
            descent = metrics.descent,
            font_family = %family,
            font_size = font_size,
            "Drew watermark text"
        );

        let png = encode_png(&raster)?;
        Ok(RenderedImage { raster, png })
    }
}

impl Default for ImageRenderer {
    fn default() -> Self {
        Self::new(Arc::new(EmbeddedFontCatalog))
    }
}

/// Canvas dimensions for `metrics`, rejecting canvases over
/// [`MAX_CANVAS_PIXELS`].
fn canvas_size(metrics: &TextMetrics) -> Result<(u32, u32), WatermarkError> {
    let width = metrics.width.checked_add(MARGIN_RIGHT_PX);
    let height = metrics
        .ascent
        .checked_add(metrics.descent)
        .and_then(|h| h.checked_add(MARGIN_BOTTOM_PX));

    match (width, height) {
        (Some(width), Some(height))
            if (width as u64).saturating_mul(height as u64) <= MAX_CANVAS_PIXELS =>
        {
            Ok((width.max(1), height.max(1)))
        }
        _ => Err(WatermarkError::RenderError(format!(
            "canvas for text {}px wide and {}px tall exceeds {} pixels",
            metrics.width,
            metrics.ascent.saturating_add(metrics.descent),
            MAX_CANVAS_PIXELS
        ))),
    }
}

/// Rasterize `text` on a transparent canvas with its baseline at `baseline`.
fn draw_text(
    font: &FontArc,
    font_size: u32,
    text: &str,
    baseline: u32,
    width: u32,
    height: u32,
    color: Color,
) -> RgbaImage {
    let scale = em_scale(font, font_size);
    let scaled_font = font.as_scaled(scale);

    // Coverage is accumulated first so overlapping glyph edges composite
    // once, then scaled so the densest pixel carries the exact requested
    // colour even when small glyphs never cover a whole pixel.
    let mut coverage = vec![0.0f32; width as usize * height as usize];

    let mut cursor_x = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;
    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph =
            glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline as f32));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, c| {
                let x = px as i64 + bounds.min.x as i64;
                let y = py as i64 + bounds.min.y as i64;
                if x >= 0 && y >= 0 && x < width as i64 && y < height as i64 {
                    let idx = y as usize * width as usize + x as usize;
                    let c = c.clamp(0.0, 1.0);
                    coverage[idx] = c + coverage[idx] * (1.0 - c);
                }
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    let peak = coverage.iter().copied().fold(0.0f32, f32::max);
    let gain = if peak > 0.0 { 1.0 / peak } else { 0.0 };

    let mut image = RgbaImage::new(width, height);
    for (idx, cov) in coverage.into_iter().enumerate() {
        let cov = ((cov * gain).min(1.0) * 255.0).round() as u32;
        if cov == 0 {
            continue;
        }
        let alpha = ((cov * color.a as u32 + 127) / 255) as u8;
        let x = (idx % width as usize) as u32;
        let y = (idx / width as usize) as u32;
        image.put_pixel(x, y, Rgba([color.r, color.g, color.b, alpha]));
    }
    image
}

//! Watermark module for rendering the project identifier as an image.
//!
//! The renderer produces a tight, transparent PNG: the text is measured with
//! the chosen font, the canvas is sized to the text plus fixed right/bottom
//! margins, and the glyphs are drawn once, anti-aliased, flush to the top-left
//! corner.
//!
//! # Features
//!
//! - **Injected font catalog**: host font enumeration is a capability
//!   ([`FontCatalog`]), never a hidden global
//! - **Bundled fallback face** for unknown or unloadable families
//! - **Exact colours**: the densest pixels carry the configured ARGB verbatim,
//!   at every font size
//! - **Never fails**: blank text, oversized canvases and render errors yield a
//!   1x1 transparent PNG

pub mod error;
pub mod fonts;
pub mod text_renderer;

// Re-export main types for convenience
pub use error::WatermarkError;
pub use fonts::{fallback_font, EmbeddedFontCatalog, FontCatalog, SystemFontCatalog};
pub use text_renderer::{
    blank_image, encode_png, measure_text, parse_hex_color, Color, ImageRenderer, RenderedImage,
    TextMetrics, TextRenderOptions,
};

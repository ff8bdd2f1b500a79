//! Watermark error types.
//!
//! Defines errors that can occur while rendering a watermark image. None of
//! them escape [`ImageRenderer::render_png`](super::ImageRenderer::render_png):
//! the renderer recovers by falling back to safe defaults.

use std::fmt;

/// Errors that can occur during watermark rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkError {
    /// Font data could not be loaded or parsed
    FontError(String),

    /// Failed to lay out or rasterize text
    RenderError(String),

    /// Failed to encode the raster as PNG
    EncodeError(String),

    /// Invalid colour specification
    ColorError(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontError(msg) => write!(f, "Failed to load watermark font: {}", msg),
            Self::RenderError(msg) => write!(f, "Failed to render text watermark: {}", msg),
            Self::EncodeError(msg) => write!(f, "Failed to encode watermark PNG: {}", msg),
            Self::ColorError(msg) => write!(f, "Invalid watermark colour: {}", msg),
        }
    }
}

impl std::error::Error for WatermarkError {}

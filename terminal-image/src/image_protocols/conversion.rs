// ABOUTME: Container conversion for native protocols that only accept certain formats
// ABOUTME: Re-encodes decoded pixels to PNG when the source bytes are in another format

use crate::error::{RenderError, Result};
use crate::image_protocols::SourceImage;
use image::ImageFormat;
use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub max_payload_bytes: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageConverter {
    config: ConversionConfig,
}

impl ImageConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// Return the source as PNG bytes, borrowing when no conversion is needed
    pub fn to_png<'a>(&self, source: &SourceImage<'a>) -> Result<Cow<'a, [u8]>> {
        let detected = image::guess_format(source.bytes).ok();

        let png = if detected == Some(ImageFormat::Png) {
            Cow::Borrowed(source.bytes)
        } else {
            log::debug!(
                "Converting {} image ({}) to PNG",
                detected.map(format_name).unwrap_or("unknown"),
                format_size(source.bytes.len())
            );
            let encoded = source
                .pixels
                .to_png()
                .map_err(|e| RenderError::Protocol(format!("PNG conversion failed: {}", e)))?;
            Cow::Owned(encoded)
        };

        if png.len() > self.config.max_payload_bytes {
            return Err(RenderError::Protocol(format!(
                "Image too large for native transmission: {} exceeds limit of {}",
                format_size(png.len()),
                format_size(self.config.max_payload_bytes)
            )));
        }

        Ok(png)
    }
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::WebP => "WebP",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::Bmp => "BMP",
        _ => "Unknown",
    }
}

fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

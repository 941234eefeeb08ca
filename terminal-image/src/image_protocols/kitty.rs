// ABOUTME: Kitty terminal graphics protocol implementation
// ABOUTME: Handles base64 encoding and chunking for the Kitty graphics protocol

use super::conversion::ImageConverter;
use super::{ImageProtocol, Placement, SourceImage};
use crate::constants::protocol::{KITTY_CHUNK_SIZE, KITTY_FORMAT_PNG};
use crate::constants::terminal::CELL_ASPECT_RATIO;
use crate::error::{RenderError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

#[derive(Debug, Clone, Default)]
pub struct KittyProtocol {
    converter: ImageConverter,
}

impl KittyProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_converter(converter: ImageConverter) -> Self {
        Self { converter }
    }
}

impl ImageProtocol for KittyProtocol {
    fn render_image(&self, source: &SourceImage<'_>, placement: &Placement) -> Result<String> {
        // Kitty only takes PNG (f=100) or raw pixels, so normalize the container first
        let png = self.converter.to_png(source)?;
        let base64_data = STANDARD.encode(&*png);

        let (columns, rows) = size_constraints(
            source.pixels.width(),
            source.pixels.height(),
            placement,
        );

        let mut control = format!("a=T,f={},q=2", KITTY_FORMAT_PNG);
        if let Some(columns) = columns {
            control.push_str(&format!(",c={}", columns));
        }
        if let Some(rows) = rows {
            control.push_str(&format!(",r={}", rows));
        }

        frame_payload(&base64_data, &control)
    }

    fn name(&self) -> &'static str {
        "kitty"
    }
}

/// Split base64 text into transport-sized chunks
pub fn chunk_payload(base64_data: &str) -> Result<Vec<&str>> {
    base64_data
        .as_bytes()
        .chunks(KITTY_CHUNK_SIZE)
        .map(std::str::from_utf8)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            RenderError::Protocol(format!("Failed to convert base64 chunk to UTF-8: {}", e))
        })
}

/// Wrap each chunk in an APC frame. The first frame carries the control
/// parameters; m=1 marks that more chunks follow, m=0 ends the transmission.
pub fn frame_payload(base64_data: &str, control: &str) -> Result<String> {
    let mut chunks = chunk_payload(base64_data)?;
    if chunks.is_empty() {
        chunks.push("");
    }

    let mut output = String::with_capacity(base64_data.len() + chunks.len() * 16);
    let last = chunks.len() - 1;

    for (i, chunk) in chunks.iter().enumerate() {
        let m_value = if i == last { 0 } else { 1 };

        if i == 0 {
            output.push_str(&format!("\x1b_G{},m={};{}\x1b\\", control, m_value, chunk));
        } else {
            output.push_str(&format!("\x1b_Gm={};{}\x1b\\", m_value, chunk));
        }
    }

    Ok(output)
}

/// Decide which cell dimensions to send. With the aspect ratio preserved and
/// both known, only the dominant one is sent so the terminal scales the other.
fn size_constraints(
    image_width: u32,
    image_height: u32,
    placement: &Placement,
) -> (Option<u32>, Option<u32>) {
    match (placement.columns, placement.rows) {
        (Some(columns), Some(rows)) if placement.preserve_aspect_ratio => {
            let image_aspect = image_width as f64 / image_height.max(1) as f64;
            let box_aspect = columns as f64 * CELL_ASPECT_RATIO / rows.max(1) as f64;
            if image_aspect >= box_aspect {
                (Some(columns), None)
            } else {
                (None, Some(rows))
            }
        }
        other => other,
    }
}

// ABOUTME: iTerm2 terminal inline image protocol implementation
// ABOUTME: Handles base64 encoding with iTerm2-specific escape sequences

use super::{ImageProtocol, Placement, SourceImage};
use crate::error::Result;
use base64::{Engine, engine::general_purpose::STANDARD};

#[derive(Debug, Clone, Copy, Default)]
pub struct ITerm2Protocol;

impl ImageProtocol for ITerm2Protocol {
    fn render_image(&self, source: &SourceImage<'_>, placement: &Placement) -> Result<String> {
        // iTerm2 decodes the original container itself, no conversion needed
        let base64_data = STANDARD.encode(source.bytes);

        // \x1b]1337;File=size=N;width=W;height=H;preserveAspectRatio=P;inline=1:base64data\x07
        Ok(format!(
            "\x1b]1337;File=size={};width={};height={};preserveAspectRatio={};inline=1:{}\x07",
            source.bytes.len(),
            cell_size(placement.columns),
            cell_size(placement.rows),
            u8::from(placement.preserve_aspect_ratio),
            base64_data
        ))
    }

    fn name(&self) -> &'static str {
        "iterm2"
    }
}

fn cell_size(cells: Option<u32>) -> String {
    cells
        .map(|n| n.to_string())
        .unwrap_or_else(|| "auto".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::{PixelBuffer, Rgba};

    fn render(bytes: &[u8], placement: Placement) -> String {
        let pixels = PixelBuffer::from_pixels(1, 1, &[Rgba::opaque(1, 2, 3)]).unwrap();
        let source = SourceImage {
            bytes,
            pixels: &pixels,
        };
        ITerm2Protocol.render_image(&source, &placement).unwrap()
    }

    #[test]
    fn test_iterm2_protocol_rendering() {
        let test_data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]; // PNG signature
        let output = render(
            &test_data,
            Placement {
                columns: Some(40),
                rows: Some(12),
                preserve_aspect_ratio: true,
            },
        );

        assert!(output.starts_with("\x1b]1337;File="));
        assert!(output.contains("size=8"));
        assert!(output.contains("width=40;height=12"));
        assert!(output.contains("preserveAspectRatio=1"));
        assert!(output.contains("inline=1"));
        assert!(output.ends_with('\x07'));
    }

    #[test]
    fn test_iterm2_protocol_base64_encoding() {
        let test_data = b"test data".to_vec();
        let expected_b64 = STANDARD.encode(&test_data);

        let output = render(
            &test_data,
            Placement {
                columns: None,
                rows: None,
                preserve_aspect_ratio: false,
            },
        );

        assert!(output.contains(&format!(":{}\x07", expected_b64)));
        assert!(output.contains("width=auto;height=auto"));
        assert!(output.contains("preserveAspectRatio=0"));
    }
}

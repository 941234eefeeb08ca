// ABOUTME: Still-image rendering pipeline that orchestrates decoding, sizing and encoding
// ABOUTME: Tries the selected native protocol first and falls back to half-block glyphs

use crate::dimensions::{self, Dimension, DimensionRequest, native_extent};
use crate::error::{RenderError, Result};
use crate::halfblocks;
use crate::image_protocols::{
    ITerm2Protocol, ImageProtocol, KittyProtocol, Placement, Protocol, ProtocolSelector,
    SourceImage,
};
use crate::pixels::{self, PixelBuffer};
use crate::terminal::TerminalSize;
use image::imageops::FilterType;
use std::io::Write;

/// Caller-facing options for a still render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub preserve_aspect_ratio: bool,
    /// Allow Kitty or iTerm2 output when the terminal supports it
    pub prefer_native: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            preserve_aspect_ratio: true,
            prefer_native: true,
        }
    }
}

impl RenderOptions {
    pub fn dimensions(&self) -> DimensionRequest {
        DimensionRequest {
            width: self.width,
            height: self.height,
            preserve_aspect_ratio: self.preserve_aspect_ratio,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.dimensions().validate()
    }
}

/// Resizes pixel buffers to a resolved target and draws them as half-blocks
#[derive(Debug, Clone, Copy)]
pub struct GlyphRenderer {
    terminal: TerminalSize,
    filter: FilterType,
}

impl GlyphRenderer {
    pub fn new(terminal: TerminalSize) -> Self {
        Self {
            terminal,
            filter: FilterType::Lanczos3,
        }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn terminal(&self) -> TerminalSize {
        self.terminal
    }

    pub fn render(&self, pixels: &PixelBuffer, request: &DimensionRequest) -> Result<String> {
        let target = dimensions::resolve(pixels.width(), pixels.height(), request, self.terminal)?;
        let resized = pixels.resize(target.pixel_width(), target.pixel_height(), self.filter);
        Ok(halfblocks::render(&resized))
    }
}

/// The protocols that draw through terminal graphics instead of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NativeProtocol {
    Kitty,
    ITerm2,
}

impl NativeProtocol {
    fn from_protocol(protocol: Protocol) -> Option<Self> {
        match protocol {
            Protocol::Kitty => Some(NativeProtocol::Kitty),
            Protocol::ITerm2 => Some(NativeProtocol::ITerm2),
            Protocol::Halfblocks => None,
        }
    }
}

pub struct Renderer {
    selector: ProtocolSelector,
    glyphs: GlyphRenderer,
    kitty: KittyProtocol,
    iterm2: ITerm2Protocol,
    output: Box<dyn Write + Send>,
}

impl Renderer {
    /// Renderer bound to the current terminal, writing native output to stdout
    pub fn from_env() -> Self {
        Self::with_parts(
            ProtocolSelector::from_env(),
            TerminalSize::detect(),
            Box::new(std::io::stdout()),
        )
    }

    pub fn with_parts(
        selector: ProtocolSelector,
        terminal: TerminalSize,
        output: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            selector,
            glyphs: GlyphRenderer::new(terminal),
            kitty: KittyProtocol::new(),
            iterm2: ITerm2Protocol,
            output,
        }
    }

    pub fn glyph_renderer(&self) -> GlyphRenderer {
        self.glyphs
    }

    /// Render a still image. Kitty output is written straight to the output
    /// writer and yields an empty string; every other path returns the text.
    pub fn render(&mut self, bytes: &[u8], options: &RenderOptions) -> Result<String> {
        options.validate()?;
        let pixels = pixels::decode(bytes)?;
        let request = options.dimensions();

        let protocol = self.selector.select(options.prefer_native, false);
        log::debug!(
            "Rendering {}x{} image with {}",
            pixels.width(),
            pixels.height(),
            protocol
        );

        if let Some(native) = NativeProtocol::from_protocol(protocol) {
            let source = SourceImage {
                bytes,
                pixels: &pixels,
            };
            match self.render_native(native, &source, &request) {
                Ok(output) => return Ok(output),
                Err(e) if e.is_recoverable() => {
                    log::warn!("{} rendering failed, using half-blocks: {}", protocol, e);
                }
                Err(e) => return Err(e),
            }
        }

        self.glyphs.render(&pixels, &request)
    }

    fn render_native(
        &mut self,
        protocol: NativeProtocol,
        source: &SourceImage<'_>,
        request: &DimensionRequest,
    ) -> Result<String> {
        let (width, height) = native_extent(source.pixels.width(), source.pixels.height());
        let target = dimensions::resolve(width, height, request, self.glyphs.terminal())?;
        let placement = Placement {
            columns: Some(target.columns),
            rows: Some(target.rows),
            preserve_aspect_ratio: request.preserve_aspect_ratio,
        };

        match protocol {
            NativeProtocol::Kitty => {
                let stream = self.kitty.render_image(source, &placement)?;
                self.transmit(&stream)?;
                Ok(String::new())
            }
            NativeProtocol::ITerm2 => self.iterm2.render_image(source, &placement),
        }
    }

    /// Write a complete protocol stream in one go
    fn transmit(&mut self, stream: &str) -> Result<()> {
        self.output
            .write_all(stream.as_bytes())
            .and_then(|()| self.output.flush())
            .map_err(|e| RenderError::Protocol(format!("failed to write to terminal: {}", e)))
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("selector", &self.selector)
            .field("glyphs", &self.glyphs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_protocols::GraphicsProbe;
    use crate::pixels::Rgba;
    use crate::terminal::EnvSnapshot;
    use std::io;
    use std::sync::{Arc, Mutex};

    struct FixedProbe(bool);

    impl GraphicsProbe for FixedProbe {
        fn supports_kitty_graphics(&self) -> bool {
            self.0
        }
    }

    #[derive(Clone, Default)]
    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn renderer(
        env: &[(&str, &str)],
        kitty: bool,
        output: Box<dyn Write + Send>,
    ) -> Renderer {
        let selector = ProtocolSelector::new(
            &EnvSnapshot::from_pairs(env.iter().copied()),
            true,
            Box::new(FixedProbe(kitty)),
        );
        Renderer::with_parts(selector, TerminalSize::new(80, 24), output)
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let pixels = vec![Rgba::opaque(30, 60, 90); (width * height) as usize];
        PixelBuffer::from_pixels(width, height, &pixels)
            .unwrap()
            .to_png()
            .unwrap()
    }

    #[test]
    fn test_only_graphics_protocols_are_native() {
        assert_eq!(
            NativeProtocol::from_protocol(Protocol::Kitty),
            Some(NativeProtocol::Kitty)
        );
        assert_eq!(
            NativeProtocol::from_protocol(Protocol::ITerm2),
            Some(NativeProtocol::ITerm2)
        );
        assert_eq!(NativeProtocol::from_protocol(Protocol::Halfblocks), None);
    }

    #[test]
    fn test_halfblocks_when_native_disabled() {
        let mut renderer = renderer(&[], true, Box::new(io::sink()));
        let options = RenderOptions {
            prefer_native: false,
            ..Default::default()
        };
        let output = renderer.render(&png(4, 6), &options).unwrap();
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_kitty_writes_to_output_and_returns_empty() {
        let writer = SharedWriter::default();
        let mut renderer = renderer(&[], true, Box::new(writer.clone()));

        let output = renderer.render(&png(16, 16), &RenderOptions::default()).unwrap();
        assert!(output.is_empty());

        let written = String::from_utf8(writer.0.lock().unwrap().clone()).unwrap();
        assert!(written.starts_with("\x1b_Ga=T,f=100,q=2"));
        assert!(written.ends_with("\x1b\\"));
    }

    #[test]
    fn test_iterm2_returns_escape_sequence() {
        let mut renderer = renderer(&[("TERM_PROGRAM", "iTerm.app")], false, Box::new(io::sink()));
        let output = renderer.render(&png(16, 32), &RenderOptions::default()).unwrap();

        // 16x32 px is 2 columns x 2 rows of 8x16 cells
        assert!(output.starts_with("\x1b]1337;File="));
        assert!(output.contains("width=2;height=2"));
    }

    #[test]
    fn test_kitty_write_failure_falls_back_to_halfblocks() {
        let mut renderer = renderer(&[], true, Box::new(BrokenWriter));
        let output = renderer.render(&png(4, 4), &RenderOptions::default()).unwrap();
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_validation_happens_before_decoding() {
        let mut renderer = renderer(&[], false, Box::new(io::sink()));
        let options = RenderOptions {
            width: Some(Dimension::Cells(0)),
            ..Default::default()
        };
        let err = renderer.render(b"not an image", &options).unwrap_err();
        assert!(matches!(err, RenderError::Validation { field: "width", .. }));
    }

    #[test]
    fn test_decode_error_is_not_absorbed() {
        let mut renderer = renderer(&[], true, Box::new(io::sink()));
        let err = renderer
            .render(b"not an image", &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn test_glyph_renderer_respects_requested_width() {
        let glyphs = GlyphRenderer::new(TerminalSize::new(80, 24));
        let pixels = decode_png(&png(40, 40));
        let request = DimensionRequest {
            width: Some(Dimension::Cells(10)),
            ..Default::default()
        };
        let output = glyphs.render(&pixels, &request).unwrap();
        assert_eq!(output.lines().count(), 5);
    }

    fn decode_png(bytes: &[u8]) -> PixelBuffer {
        pixels::decode(bytes).unwrap()
    }
}

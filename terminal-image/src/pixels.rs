// ABOUTME: Decoded pixel buffers and animation frames backed by the image crate
// ABOUTME: Wraps still and multi-frame decoding behind a small RGBA accessor contract

use crate::constants::animation::FALLBACK_FRAME_DELAY;
use crate::error::{RenderError, Result};
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::time::Duration;

/// A single 8-bit RGBA pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Two pixels look the same in a cell when both are invisible,
    /// or both are visible with the same color.
    pub fn same_color(&self, other: &Rgba) -> bool {
        match (self.is_transparent(), other.is_transparent()) {
            (true, true) => true,
            (false, false) => (self.r, self.g, self.b) == (other.r, other.g, other.b),
            _ => false,
        }
    }
}

/// Width × height RGBA pixels, row-major, four bytes per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::validation(
                "pixel buffer",
                format!("dimensions must be positive, got {}x{}", width, height),
            ));
        }

        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RenderError::validation(
                "pixel buffer",
                format!(
                    "expected {} bytes for {}x{} RGBA, got {}",
                    expected,
                    width,
                    height,
                    data.len()
                ),
            ));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_pixels(width: u32, height: u32, pixels: &[Rgba]) -> Result<Self> {
        let data = pixels.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect();
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at (x, y). Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Rgba::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        )
    }

    /// Resample to exactly `width` × `height`; a no-op when the size already matches
    pub fn resize(&self, width: u32, height: u32, filter: FilterType) -> PixelBuffer {
        if width == self.width && height == self.height {
            return self.clone();
        }

        log::debug!(
            "Resizing pixel buffer from {}x{} to {}x{}",
            self.width,
            self.height,
            width,
            height
        );
        let resized = image::imageops::resize(&self.to_rgba_image(), width, height, filter);
        PixelBuffer::from(resized)
    }

    /// Encode the buffer into a PNG container
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(self.to_rgba_image())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(buffer)
    }

    fn to_rgba_image(&self) -> RgbaImage {
        // Length is checked on construction
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.into_raw(),
        }
    }
}

impl From<&DynamicImage> for PixelBuffer {
    fn from(img: &DynamicImage) -> Self {
        PixelBuffer::from(img.to_rgba8())
    }
}

/// One decoded animation frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub buffer: PixelBuffer,
    /// Presentation time relative to the start of the animation
    pub time_code: Duration,
    /// How long this frame stays on screen
    pub delay: Duration,
}

/// Decode a still image
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer> {
    let img = image::load_from_memory(bytes)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(RenderError::Decode("image has no pixels".to_string()));
    }
    Ok(PixelBuffer::from(&img))
}

/// Decode every frame of an animated image. Sources without animation
/// (including plain PNGs and other still formats) yield a single frame.
pub fn decode_animated(bytes: &[u8]) -> Result<Vec<Frame>> {
    let format = image::guess_format(bytes)?;

    let raw_frames = match format {
        ImageFormat::Gif => GifDecoder::new(Cursor::new(bytes))?
            .into_frames()
            .collect_frames()?,
        ImageFormat::Png => {
            let decoder = PngDecoder::new(Cursor::new(bytes))?;
            if decoder.is_apng()? {
                decoder.apng()?.into_frames().collect_frames()?
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    };

    if raw_frames.is_empty() {
        log::debug!("No animation found in {:?} source, using a single frame", format);
        return Ok(vec![Frame {
            buffer: decode(bytes)?,
            time_code: Duration::ZERO,
            delay: FALLBACK_FRAME_DELAY,
        }]);
    }

    let mut time_code = Duration::ZERO;
    let frames = raw_frames
        .into_iter()
        .map(|frame| {
            let delay = match Duration::from(frame.delay()) {
                d if d.is_zero() => FALLBACK_FRAME_DELAY,
                d => d,
            };
            let decoded = Frame {
                buffer: PixelBuffer::from(frame.into_buffer()),
                time_code,
                delay,
            };
            time_code += delay;
            decoded
        })
        .collect::<Vec<_>>();

    log::debug!("Decoded {} animation frames", frames.len());
    Ok(frames)
}

/// Whether the bytes hold more than one frame (a multi-frame GIF or APNG).
/// Only the first two frames are decoded.
pub fn is_animated(bytes: &[u8]) -> bool {
    frame_stream(bytes)
        .is_some_and(|frames| frames.take(2).filter(|frame| frame.is_ok()).count() > 1)
}

fn frame_stream(bytes: &[u8]) -> Option<image::Frames<'_>> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Gif => Some(GifDecoder::new(Cursor::new(bytes)).ok()?.into_frames()),
        ImageFormat::Png => {
            let decoder = PngDecoder::new(Cursor::new(bytes)).ok()?;
            if !decoder.is_apng().ok()? {
                return None;
            }
            Some(decoder.apng().ok()?.into_frames())
        }
        _ => None,
    }
}

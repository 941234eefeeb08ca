// ABOUTME: Terminal image rendering library for still and animated raster images
// ABOUTME: Picks Kitty, iTerm2 or half-block output and drives timed animation playback

pub mod animation;
pub mod constants;
pub mod dimensions;
pub mod error;
pub mod halfblocks;
pub mod image_protocols;
pub mod pixels;
pub mod renderer;
pub mod terminal;

pub use animation::{
    AnimationDriver, AnimationState, FrameRenderer, LogUpdateSink, OutputSink, PlaybackState,
    StopHandle,
};
pub use dimensions::{Dimension, DimensionRequest, RenderTarget};
pub use error::{RenderError, Result};
pub use image_protocols::Protocol;
pub use pixels::{Frame, PixelBuffer, Rgba};
pub use renderer::{GlyphRenderer, RenderOptions, Renderer};
pub use terminal::{EnvSnapshot, TerminalSize};

use crate::constants::animation::DEFAULT_MAXIMUM_FRAME_RATE;
use crate::image_protocols::ProtocolSelector;
use image::imageops::FilterType;
use std::path::Path;
use tokio::runtime::Handle;

/// Options for animated playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationOptions {
    pub render: RenderOptions,
    /// Upper bound on frames written per second
    pub maximum_frame_rate: u32,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            maximum_frame_rate: DEFAULT_MAXIMUM_FRAME_RATE,
        }
    }
}

impl AnimationOptions {
    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;
        if self.maximum_frame_rate == 0 {
            return Err(RenderError::validation(
                "maximum_frame_rate",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Render a still image held in memory. Must be awaited inside a tokio
/// runtime; decoding, resizing and the terminal query run on its blocking
/// pool.
pub async fn render_buffer(bytes: &[u8], options: &RenderOptions) -> Result<String> {
    let bytes = bytes.to_vec();
    let options = *options;
    run_blocking(move || Renderer::from_env().render(&bytes, &options)).await
}

/// Read an image file and render it as a still image
pub async fn render_file(path: impl AsRef<Path>, options: &RenderOptions) -> Result<String> {
    options.validate()?;
    let bytes = tokio::fs::read(path.as_ref()).await?;
    let options = *options;
    run_blocking(move || Renderer::from_env().render(&bytes, &options)).await
}

async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let runtime = Handle::try_current().map_err(|_| RenderError::NoRuntime)?;
    match runtime.spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        // Only happens while the runtime shuts down
        Err(_) => Err(RenderError::NoRuntime),
    }
}

/// Start playing an animated image in the background. Must be called from
/// within a tokio runtime; playback continues until the handle is stopped
/// or dropped.
pub fn render_animated_buffer<S: OutputSink>(
    bytes: &[u8],
    options: &AnimationOptions,
    sink: S,
) -> Result<StopHandle> {
    options.validate()?;
    let frames = pixels::decode_animated(bytes)?;

    let protocol = ProtocolSelector::from_env().select(options.render.prefer_native, true);
    log::debug!("Animating {} frames with {}", frames.len(), protocol);

    let glyphs = GlyphRenderer::new(TerminalSize::detect()).with_filter(FilterType::Triangle);
    let renderer = animation::halfblock_frames(glyphs, options.render.dimensions());
    AnimationDriver::new(frames, options.maximum_frame_rate, renderer)?.spawn(sink)
}

/// Read an animated image file and start playing it
pub fn render_animated_file<S: OutputSink>(
    path: impl AsRef<Path>,
    options: &AnimationOptions,
    sink: S,
) -> Result<StopHandle> {
    options.validate()?;
    let bytes = std::fs::read(path.as_ref())?;
    render_animated_buffer(&bytes, options, sink)
}

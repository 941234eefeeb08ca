// ABOUTME: Native terminal graphics protocols and the logic that chooses between them
// ABOUTME: Handles encoding for Kitty and iTerm2 plus capability detection and probing

use crate::error::Result;
use crate::pixels::PixelBuffer;

/// Encoded image bytes alongside their decoded pixels
#[derive(Debug, Clone, Copy)]
pub struct SourceImage<'a> {
    pub bytes: &'a [u8],
    pub pixels: &'a PixelBuffer,
}

/// Where and how large the terminal should draw the image, in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub columns: Option<u32>,
    pub rows: Option<u32>,
    pub preserve_aspect_ratio: bool,
}

pub trait ImageProtocol {
    /// Render image data as a terminal escape sequence
    fn render_image(&self, source: &SourceImage<'_>, placement: &Placement) -> Result<String>;

    /// Protocol name used in logs
    fn name(&self) -> &'static str;
}

pub mod conversion;
pub mod detection;
pub mod iterm2;
pub mod kitty;
pub mod probe;
pub mod selector;

pub use detection::{Protocol, TerminalCapabilities, detect_capability};
pub use iterm2::ITerm2Protocol;
pub use kitty::KittyProtocol;
pub use probe::{GraphicsProbe, TerminalQueryProbe};
pub use selector::ProtocolSelector;

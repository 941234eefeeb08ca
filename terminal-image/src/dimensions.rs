// ABOUTME: Terminal-aware dimension resolution for rendered images
// ABOUTME: Turns absolute or percentage requests into a cell-sized target that never exceeds the terminal

use crate::constants::terminal::{CELL_HEIGHT_PX, CELL_WIDTH_PX};
use crate::error::{RenderError, Result};
use crate::terminal::TerminalSize;
use std::fmt;
use std::str::FromStr;

/// A requested width or height
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    /// Terminal columns (for width) or rows (for height)
    Cells(u32),
    /// Percentage of the terminal extent, in (0, 100]
    Percent(f64),
}

impl Dimension {
    pub fn parse(value: &str, field: &'static str) -> Result<Self> {
        let value = value.trim();

        let dimension = if let Some(percent) = value.strip_suffix('%') {
            let percent: f64 = percent.trim().parse().map_err(|_| {
                RenderError::validation(field, format!("'{}' is not a valid percentage", value))
            })?;
            Dimension::Percent(percent)
        } else {
            let cells: u32 = value.parse().map_err(|_| {
                RenderError::validation(
                    field,
                    format!("'{}' must be a whole number or a percentage", value),
                )
            })?;
            Dimension::Cells(cells)
        };

        dimension.validate(field)?;
        Ok(dimension)
    }

    pub fn validate(&self, field: &'static str) -> Result<()> {
        match *self {
            Dimension::Cells(0) => Err(RenderError::validation(field, "must be greater than 0")),
            Dimension::Percent(p) if !p.is_finite() || p <= 0.0 || p > 100.0 => Err(
                RenderError::validation(field, format!("{}% is outside (0%, 100%]", p)),
            ),
            _ => Ok(()),
        }
    }

    /// Resolve against a terminal extent, yielding whole cells
    fn cells(&self, extent: u16) -> u32 {
        match *self {
            Dimension::Cells(n) => n,
            Dimension::Percent(p) => ((p / 100.0 * extent as f64).floor() as u32).max(1),
        }
    }
}

impl FromStr for Dimension {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        Dimension::parse(s, "dimension")
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Cells(n) => write!(f, "{}", n),
            Dimension::Percent(p) => write!(f, "{}%", p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionRequest {
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub preserve_aspect_ratio: bool,
}

impl Default for DimensionRequest {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            preserve_aspect_ratio: true,
        }
    }
}

impl DimensionRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(width) = &self.width {
            width.validate("width")?;
        }
        if let Some(height) = &self.height {
            height.validate("height")?;
        }
        Ok(())
    }
}

/// Resolved render size in terminal cells. Each row holds two vertical
/// pixels in glyph mode, so the pixel box is `columns` × `rows * 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub columns: u32,
    pub rows: u32,
}

impl RenderTarget {
    pub fn pixel_width(&self) -> u32 {
        self.columns
    }

    pub fn pixel_height(&self) -> u32 {
        self.rows * 2
    }
}

/// Measure a raster image in half-cell units for native protocols, using the
/// approximate terminal cell size. Glyph mode uses the raw pixel size instead.
pub fn native_extent(width_px: u32, height_px: u32) -> (u32, u32) {
    let half_cell_height = CELL_HEIGHT_PX / 2;
    (
        width_px.div_ceil(CELL_WIDTH_PX).max(1),
        height_px.div_ceil(half_cell_height).max(1),
    )
}

/// Compute the render target for an image of `image_width` × `image_height`
/// half-cell pixels.
pub fn resolve(
    image_width: u32,
    image_height: u32,
    request: &DimensionRequest,
    terminal: TerminalSize,
) -> Result<RenderTarget> {
    request.validate()?;
    if image_width == 0 || image_height == 0 {
        return Err(RenderError::validation(
            "image",
            format!("dimensions must be positive, got {}x{}", image_width, image_height),
        ));
    }

    let image_w = image_width as f64;
    let image_h = image_height as f64;
    let box_w = terminal.columns.max(1) as f64;
    let box_h = terminal.rows.max(1) as f64 * 2.0;

    let requested_w = request.width.map(|w| w.cells(terminal.columns) as f64);
    let requested_h = request.height.map(|h| h.cells(terminal.rows) as f64 * 2.0);

    let (mut width, mut height) = match (requested_w, requested_h) {
        (Some(w), Some(h)) if request.preserve_aspect_ratio => fit(image_w, image_h, w, h),
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, image_h * w / image_w),
        (None, Some(h)) => (image_w * h / image_h, h),
        (None, None) => fit(image_w, image_h, box_w, box_h),
    };

    if width > box_w || height > box_h {
        log::debug!(
            "Target {:.1}x{:.1} exceeds terminal {}x{}, scaling down",
            width,
            height,
            terminal.columns,
            terminal.rows
        );
        (width, height) = fit(width, height, box_w, box_h);
    }

    let target = RenderTarget {
        columns: (width.round() as u32).max(1),
        rows: ((height / 2.0).round() as u32).max(1),
    };
    log::debug!(
        "Resolved {}x{} image to {} columns x {} rows",
        image_width,
        image_height,
        target.columns,
        target.rows
    );
    Ok(target)
}

/// Largest size with the source's ratio that fits in the box, never larger than the source
fn fit(width: f64, height: f64, box_w: f64, box_h: f64) -> (f64, f64) {
    let factor = (box_w / width).min(box_h / height).min(1.0);
    (width * factor, height * factor)
}

// ABOUTME: Half-block glyph renderer, the universal fallback that works in any truecolor terminal
// ABOUTME: Packs two vertical pixels per cell and merges equally styled cells into runs

use crate::constants::glyphs::{BLANK, FULL_BLOCK, LOWER_HALF, UPPER_HALF};
use crate::pixels::{PixelBuffer, Rgba};
use owo_colors::{OwoColorize, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb(u8, u8, u8);

impl From<Rgba> for Rgb {
    fn from(p: Rgba) -> Self {
        Rgb(p.r, p.g, p.b)
    }
}

/// What a single terminal cell shows for an upper/lower pixel pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Blank,
    Full(Rgb),
    Upper { fg: Rgb, bg: Option<Rgb> },
    Lower(Rgb),
}

impl Cell {
    fn classify(upper: Rgba, lower: Option<Rgba>) -> Cell {
        let Some(lower) = lower else {
            // Unpaired final row
            return if upper.is_transparent() {
                Cell::Blank
            } else {
                Cell::Upper {
                    fg: upper.into(),
                    bg: None,
                }
            };
        };

        match (upper.is_transparent(), lower.is_transparent()) {
            (true, true) => Cell::Blank,
            (false, _) if upper.same_color(&lower) => Cell::Full(upper.into()),
            (false, true) => Cell::Upper {
                fg: upper.into(),
                bg: None,
            },
            (false, false) => Cell::Upper {
                fg: upper.into(),
                bg: Some(lower.into()),
            },
            (true, false) => Cell::Lower(lower.into()),
        }
    }

    fn glyph(&self) -> char {
        match self {
            Cell::Blank => BLANK,
            Cell::Full(_) => FULL_BLOCK,
            Cell::Upper { .. } => UPPER_HALF,
            Cell::Lower(_) => LOWER_HALF,
        }
    }

    fn style(&self) -> Option<Style> {
        let fg = |Rgb(r, g, b): Rgb| Style::new().truecolor(r, g, b);
        match *self {
            Cell::Blank => None,
            Cell::Full(c) | Cell::Lower(c) => Some(fg(c)),
            Cell::Upper { fg: c, bg: None } => Some(fg(c)),
            Cell::Upper {
                fg: c,
                bg: Some(Rgb(r, g, b)),
            } => Some(fg(c).on_truecolor(r, g, b)),
        }
    }
}

/// Render a pixel buffer as lines of half-block glyphs, one line per pair
/// of pixel rows, joined with '\n' and without a trailing newline.
pub fn render(pixels: &PixelBuffer) -> String {
    (0..pixels.height())
        .step_by(2)
        .map(|y| render_row_pair(pixels, y))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_row_pair(pixels: &PixelBuffer, y: u32) -> String {
    let has_lower = y + 1 < pixels.height();
    let mut line = String::new();
    let mut run: Option<(Cell, usize)> = None;

    for x in 0..pixels.width() {
        let lower = has_lower.then(|| pixels.pixel(x, y + 1));
        let cell = Cell::classify(pixels.pixel(x, y), lower);

        run = match run {
            Some((current, len)) if current == cell => Some((current, len + 1)),
            Some((current, len)) => {
                push_run(&mut line, current, len);
                Some((cell, 1))
            }
            None => Some((cell, 1)),
        };
    }

    if let Some((cell, len)) = run {
        push_run(&mut line, cell, len);
    }
    line
}

fn push_run(line: &mut String, cell: Cell, len: usize) {
    let glyphs: String = std::iter::repeat_n(cell.glyph(), len).collect();
    match cell.style() {
        Some(style) => line.push_str(&glyphs.style(style).to_string()),
        None => line.push_str(&glyphs),
    }
}

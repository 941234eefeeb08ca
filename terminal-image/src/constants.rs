// ABOUTME: Centralized constants for terminal image rendering
// ABOUTME: Contains glyphs, protocol framing limits, terminal defaults and timing values

/// Terminal extent used when the real size cannot be queried
pub mod terminal {
    pub const DEFAULT_COLUMNS: u16 = 80;
    pub const DEFAULT_ROWS: u16 = 24;

    /// Approximate cell size in pixels, used to measure images for native protocols
    pub const CELL_WIDTH_PX: u32 = 8;
    pub const CELL_HEIGHT_PX: u32 = 16;

    /// Width / height of a single cell
    pub const CELL_ASPECT_RATIO: f64 = 0.5;
}

/// Half-block glyphs
pub mod glyphs {
    pub const BLANK: char = ' ';
    pub const FULL_BLOCK: char = '\u{2588}';
    pub const UPPER_HALF: char = '\u{2580}';
    pub const LOWER_HALF: char = '\u{2584}';
}

/// Native protocol framing
pub mod protocol {
    use std::time::Duration;

    /// Maximum base64 payload carried by a single Kitty frame
    pub const KITTY_CHUNK_SIZE: usize = 4096;

    /// Kitty format code for PNG payloads
    pub const KITTY_FORMAT_PNG: u32 = 100;

    /// Environment variable overriding protocol detection
    pub const FORCE_PROTOCOL_ENV: &str = "TERMINAL_IMAGE_FORCE_PROTOCOL";

    /// How long to wait for the terminal to answer the graphics probe
    pub const PROBE_TIMEOUT: Duration = Duration::from_millis(200);
}

/// Animation pacing
pub mod animation {
    use std::time::Duration;

    pub const DEFAULT_MAXIMUM_FRAME_RATE: u32 = 30;

    /// Delay used for frames that declare no duration of their own
    pub const FALLBACK_FRAME_DELAY: Duration = Duration::from_millis(100);

    /// Smallest frame edge (in pixels) accepted for playback
    pub const MIN_FRAME_EDGE: u32 = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_defaults() {
        assert_eq!(terminal::DEFAULT_COLUMNS, 80);
        assert_eq!(terminal::DEFAULT_ROWS, 24);
        assert_eq!(
            terminal::CELL_WIDTH_PX as f64 / terminal::CELL_HEIGHT_PX as f64,
            terminal::CELL_ASPECT_RATIO
        );
    }

    #[test]
    fn test_chunk_size_is_base64_aligned() {
        assert_eq!(protocol::KITTY_CHUNK_SIZE % 4, 0);
    }

    #[test]
    fn test_glyphs_are_distinct() {
        let all = [
            glyphs::BLANK,
            glyphs::FULL_BLOCK,
            glyphs::UPPER_HALF,
            glyphs::LOWER_HALF,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}

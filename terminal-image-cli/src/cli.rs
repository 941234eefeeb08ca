// ABOUTME: CLI argument definitions for the terminal-image application
// ABOUTME: Defines the command-line interface structure using clap derive macros

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;
use terminal_image::constants::animation::DEFAULT_MAXIMUM_FRAME_RATE;
use terminal_image::pixels::is_animated;
use terminal_image::{AnimationOptions, Dimension, RenderOptions};

#[derive(Parser, Debug)]
#[command(name = "terminal-image")]
#[command(about = "Display images and animated GIFs in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Image file path or http(s) URL
    pub source: String,

    /// Width in terminal columns (e.g. 40) or percentage of the terminal (e.g. 50%)
    #[arg(long, short = 'W', value_parser = parse_dimension)]
    pub width: Option<Dimension>,

    /// Height in terminal rows (e.g. 12) or percentage of the terminal (e.g. 50%)
    #[arg(long, short = 'H', value_parser = parse_dimension)]
    pub height: Option<Dimension>,

    /// Stretch to the requested width and height instead of keeping proportions
    #[arg(long)]
    pub no_preserve_aspect_ratio: bool,

    /// Always draw with half-block characters, never Kitty or iTerm2 graphics
    #[arg(long)]
    pub no_native: bool,

    /// Play the source as an animation even if it does not look animated
    #[arg(long, conflicts_with = "still")]
    pub animate: bool,

    /// Show only the first frame of an animated source
    #[arg(long)]
    pub still: bool,

    /// Maximum frames per second during playback
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=120))]
    pub fps: Option<u32>,

    /// Enable verbose output for debugging
    #[arg(long, short)]
    pub verbose: bool,

    /// Read configuration from this file instead of the standard locations
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Combine flags with file configuration; flags win
    pub fn animation_options(&self, config: &Config) -> AnimationOptions {
        let render = RenderOptions {
            width: self.width.or(config.width),
            height: self.height.or(config.height),
            preserve_aspect_ratio: !self.no_preserve_aspect_ratio
                && config.preserve_aspect_ratio.unwrap_or(true),
            prefer_native: !self.no_native && config.prefer_native.unwrap_or(true),
        };

        AnimationOptions {
            render,
            maximum_frame_rate: self
                .fps
                .or(config.max_frame_rate)
                .unwrap_or(DEFAULT_MAXIMUM_FRAME_RATE),
        }
    }

    /// Playback needs a terminal to redraw in place; anything else gets the
    /// first frame. `--animate` forces playback of single-frame sources.
    pub fn should_animate(&self, bytes: &[u8], interactive: bool) -> bool {
        interactive && !self.still && (self.animate || is_animated(bytes))
    }
}

fn parse_dimension(value: &str) -> Result<Dimension, String> {
    Dimension::parse(value, "dimension").map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba, RgbaImage};

    fn gif(frame_count: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            let frames = (0..frame_count).map(|i| {
                let shade = (i * 80) as u8;
                Frame::from_parts(
                    RgbaImage::from_pixel(4, 4, Rgba([shade, shade, shade, 255])),
                    0,
                    0,
                    Delay::from_numer_denom_ms(50, 1),
                )
            });
            encoder.encode_frames(frames).unwrap();
        }
        bytes
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "terminal-image",
            "cat.gif",
            "--width",
            "50%",
            "-H",
            "10",
            "--no-native",
            "--fps",
            "12",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.source, "cat.gif");
        assert_eq!(cli.width, Some(Dimension::Percent(50.0)));
        assert_eq!(cli.height, Some(Dimension::Cells(10)));
        assert!(cli.no_native);
        assert!(!cli.no_preserve_aspect_ratio);
        assert_eq!(cli.fps, Some(12));
        assert!(cli.verbose);
    }

    #[test]
    fn test_rejects_invalid_dimensions() {
        for bad in ["0", "150%", "wide"] {
            let result = Cli::try_parse_from(["terminal-image", "a.png", "--width", bad]);
            assert!(result.is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_rejects_out_of_range_fps() {
        assert!(Cli::try_parse_from(["terminal-image", "a.gif", "--fps", "0"]).is_err());
        assert!(Cli::try_parse_from(["terminal-image", "a.gif", "--fps", "500"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            width: Some(Dimension::Cells(30)),
            height: Some(Dimension::Percent(25.0)),
            prefer_native: Some(true),
            max_frame_rate: Some(15),
            ..Default::default()
        };
        let cli = Cli::try_parse_from(["terminal-image", "a.png", "--width", "60", "--no-native"])
            .unwrap();

        let options = cli.animation_options(&config);
        assert_eq!(options.render.width, Some(Dimension::Cells(60)));
        assert_eq!(options.render.height, Some(Dimension::Percent(25.0)));
        assert!(!options.render.prefer_native);
        assert!(options.render.preserve_aspect_ratio);
        assert_eq!(options.maximum_frame_rate, 15);
    }

    #[test]
    fn test_defaults_without_config() {
        let cli = Cli::try_parse_from(["terminal-image", "a.png"]).unwrap();
        let options = cli.animation_options(&Config::default());
        assert_eq!(options, AnimationOptions::default());
    }

    #[test]
    fn test_animate_conflicts_with_still() {
        let result = Cli::try_parse_from(["terminal-image", "a.gif", "--animate", "--still"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_should_animate() {
        let cli = Cli::try_parse_from(["terminal-image", "a.gif"]).unwrap();
        let animated = gif(3);
        let single = gif(1);

        assert!(cli.should_animate(&animated, true));
        assert!(!cli.should_animate(&single, true));
        // Redirected output always gets a still image
        assert!(!cli.should_animate(&animated, false));

        let forced = Cli::try_parse_from(["terminal-image", "a.gif", "--animate"]).unwrap();
        assert!(forced.should_animate(&single, true));
        assert!(!forced.should_animate(&single, false));

        let still = Cli::try_parse_from(["terminal-image", "a.gif", "--still"]).unwrap();
        assert!(!still.should_animate(&animated, true));
    }
}

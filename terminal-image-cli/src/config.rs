// ABOUTME: Configuration file loading, validation, and hierarchical merging for terminal-image
// ABOUTME: Supports TOML config files with XDG Base Directory specification compliance

use crate::url_validator::parse_size;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use terminal_image::Dimension;

pub const DEFAULT_MAX_DOWNLOAD_SIZE: u64 = 10 * 1024 * 1024; // 10MB
const MAX_FRAME_RATE_LIMIT: u32 = 120;

/// Accepts either a bare integer (`width = 40`) or a string (`width = "50%"`)
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDimension {
    Cells(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default, deserialize_with = "validate_dimension")]
    pub width: Option<Dimension>,
    #[serde(default, deserialize_with = "validate_dimension")]
    pub height: Option<Dimension>,
    #[serde(default)]
    pub preserve_aspect_ratio: Option<bool>,
    #[serde(default)]
    pub prefer_native: Option<bool>,
    #[serde(default, deserialize_with = "validate_frame_rate")]
    pub max_frame_rate: Option<u32>,
    #[serde(default, deserialize_with = "validate_size")]
    pub max_download_size: Option<u64>,
}

impl Config {
    /// Load configuration from standard XDG-compliant locations
    pub fn load() -> Result<Self> {
        let paths = Self::get_config_paths();
        Self::load_from_paths(&paths)
    }

    /// Load configuration from file paths listed highest precedence first.
    /// Missing files are skipped; broken files are reported.
    pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut config = Config::default();

        // Apply lowest precedence first so earlier paths win
        for path in paths.iter().rev() {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            log::debug!("Loading config from {}", path.display());
            config = config.merge(Self::load_from_file(path)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML config file: {}",
                path.as_ref().display()
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get standard config file paths in order of precedence (highest first)
    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Project-specific config (highest precedence)
        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(current_dir.join("terminal-image.toml"));
        }

        // 2. XDG config home
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(
                PathBuf::from(config_home)
                    .join("terminal-image")
                    .join("config.toml"),
            );
        }

        // 3. User config directory fallback
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(
                home_dir
                    .join(".config")
                    .join("terminal-image")
                    .join("config.toml"),
            );
        }

        paths
    }

    /// Merge this config with another, giving precedence to the other config
    pub fn merge(self, other: Config) -> Config {
        Config {
            width: other.width.or(self.width),
            height: other.height.or(self.height),
            preserve_aspect_ratio: other.preserve_aspect_ratio.or(self.preserve_aspect_ratio),
            prefer_native: other.prefer_native.or(self.prefer_native),
            max_frame_rate: other.max_frame_rate.or(self.max_frame_rate),
            max_download_size: other.max_download_size.or(self.max_download_size),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(width) = &self.width {
            width.validate("width")?;
        }
        if let Some(height) = &self.height {
            height.validate("height")?;
        }
        if let Some(rate) = self.max_frame_rate {
            check_frame_rate(rate).map_err(|e| anyhow!(e))?;
        }
        if self.max_download_size == Some(0) {
            return Err(anyhow!("max_download_size must be greater than 0"));
        }
        Ok(())
    }

    pub fn max_download_size(&self) -> u64 {
        self.max_download_size.unwrap_or(DEFAULT_MAX_DOWNLOAD_SIZE)
    }
}

fn check_frame_rate(rate: u32) -> std::result::Result<u32, String> {
    if (1..=MAX_FRAME_RATE_LIMIT).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!(
            "Invalid max_frame_rate {}. Must be between 1 and {}",
            rate, MAX_FRAME_RATE_LIMIT
        ))
    }
}

// Custom deserializer for width/height values
fn validate_dimension<'de, D>(deserializer: D) -> Result<Option<Dimension>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<RawDimension>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(RawDimension::Cells(cells)) => Dimension::parse(&cells.to_string(), "dimension")
            .map(Some)
            .map_err(D::Error::custom),
        Some(RawDimension::Text(text)) => Dimension::parse(&text, "dimension")
            .map(Some)
            .map_err(D::Error::custom),
    }
}

// Custom deserializer for frame rate validation
fn validate_frame_rate<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<u32>::deserialize(deserializer)? {
        Some(rate) => check_frame_rate(rate).map(Some).map_err(D::Error::custom),
        None => Ok(None),
    }
}

// Custom deserializer for human-readable sizes like "10MB"
fn validate_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<String>::deserialize(deserializer)? {
        Some(size) => parse_size(&size).map(Some).map_err(|e| {
            D::Error::custom(format!(
                "Invalid size '{}': {}. Expected format like '512KB' or '10MB'",
                size, e
            ))
        }),
        None => Ok(None),
    }
}

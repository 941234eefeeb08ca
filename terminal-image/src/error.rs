// ABOUTME: Error types for the rendering pipeline with user-friendly messages
// ABOUTME: Separates fatal decode/validation failures from recoverable protocol failures

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Native protocol transmission failed: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rendering requires a running tokio runtime")]
    NoRuntime,
}

impl RenderError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        RenderError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn help_text(&self) -> Option<&'static str> {
        match self {
            RenderError::Decode(_) => {
                Some("Supported formats are PNG, JPEG, GIF, WebP, TIFF and BMP")
            }
            RenderError::Validation { field, .. } if *field == "width" || *field == "height" => {
                Some("Use a positive number of cells (e.g. 40) or a percentage between 1% and 100%")
            }
            RenderError::Validation { .. } => None,
            RenderError::NoRuntime => {
                Some("Call rendering from inside a tokio runtime (e.g. #[tokio::main])")
            }
            _ => None,
        }
    }

    /// Whether the pipeline may absorb this error by falling back to glyph rendering
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RenderError::Protocol(_))
    }
}

/// Image errors only arise from in-memory buffers, so even `IoError`
/// (a truncated stream hitting EOF) means the bytes are malformed
impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Decode(err.to_string())
    }
}

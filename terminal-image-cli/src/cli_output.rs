// ABOUTME: Centralized CLI output utilities for consistent user-facing messages
// ABOUTME: Formats errors with their cause chain and rendering hints on stderr

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_image::RenderError;

/// Centralized CLI output utilities for consistent formatting
pub struct CliOutput {
    use_color: bool,
}

impl CliOutput {
    /// Create new CLI output utility with TTY detection
    pub fn new() -> Self {
        Self {
            use_color: std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Create CLI output utility with explicit color setting
    pub fn with_color(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Display an error message
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.format_error(message));
    }

    /// Display a hint below an error
    pub fn hint(&self, message: &str) {
        if self.use_color {
            eprintln!("  {} {}", "hint:".cyan().bold(), message);
        } else {
            eprintln!("  hint: {}", message);
        }
    }

    /// Report a failed run: the error, its causes, and any advice the
    /// rendering library has for it
    pub fn report(&self, err: &anyhow::Error) {
        self.error(&format_chain(err));
        if let Some(help) = help_text(err) {
            self.hint(help);
        }
    }

    fn format_error(&self, message: &str) -> String {
        if self.use_color {
            format!("{} {}", "error:".red().bold(), message)
        } else {
            format!("error: {}", message)
        }
    }
}

impl Default for CliOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// "outer: inner: root" rendering of an error chain
pub fn format_chain(err: &anyhow::Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

/// Advice from the first rendering error found in the chain
pub fn help_text(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<RenderError>())
        .and_then(RenderError::help_text)
}

// ABOUTME: Terminal capability detection for image protocol support
// ABOUTME: Pure function over an environment snapshot deciding which protocols may be used

use crate::constants::protocol::FORCE_PROTOCOL_ENV;
use crate::terminal::EnvSnapshot;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Kitty graphics protocol, found by probing the terminal
    Kitty,
    /// iTerm2 inline images, found from environment markers
    ITerm2,
    /// Half-block glyph art, works everywhere
    Halfblocks,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Kitty => "kitty",
            Protocol::ITerm2 => "iterm2",
            Protocol::Halfblocks => "halfblocks",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalCapabilities {
    /// Set through TERMINAL_IMAGE_FORCE_PROTOCOL, bypasses detection
    pub forced_protocol: Option<Protocol>,
    pub supports_iterm2_images: bool,
    /// Whether it is worth sending the Kitty graphics query at all
    pub may_support_kitty_images: bool,
    pub terminal_name: String,
}

pub fn detect_capability(env: &EnvSnapshot) -> TerminalCapabilities {
    let term_program = env.var("TERM_PROGRAM");
    let term = env.var("TERM");
    let terminal_name = determine_terminal_name(term_program, term);

    // Check for user override first
    if let Some(forced) = env.get(FORCE_PROTOCOL_ENV) {
        match parse_forced_protocol(forced) {
            Some(protocol) => {
                return TerminalCapabilities {
                    forced_protocol: Some(protocol),
                    supports_iterm2_images: protocol == Protocol::ITerm2,
                    may_support_kitty_images: protocol == Protocol::Kitty,
                    terminal_name: format!("forced-{}", protocol),
                };
            }
            None => log::warn!(
                "Unknown protocol '{}' in {}. Valid values: kitty, iterm2, none",
                forced,
                FORCE_PROTOCOL_ENV
            ),
        }
    }

    TerminalCapabilities {
        forced_protocol: None,
        supports_iterm2_images: detect_iterm2_support(env, term_program, term),
        may_support_kitty_images: !matches!(term, "dumb" | "linux"),
        terminal_name,
    }
}

fn parse_forced_protocol(value: &str) -> Option<Protocol> {
    match value.trim().to_lowercase().as_str() {
        "kitty" => Some(Protocol::Kitty),
        "iterm2" | "iterm" => Some(Protocol::ITerm2),
        "none" | "disable" | "disabled" | "halfblocks" => Some(Protocol::Halfblocks),
        _ => None,
    }
}

fn detect_iterm2_support(env: &EnvSnapshot, term_program: &str, term: &str) -> bool {
    // iTerm2 itself
    if term_program == "iTerm.app" || env.contains("ITERM_SESSION_ID") {
        return true;
    }

    // iTerm2 exports this through ssh sessions
    if env.var("LC_TERMINAL") == "iTerm2" {
        return true;
    }

    // Terminals that support iTerm2 protocol
    if matches!(
        term_program,
        "WezTerm" |     // WezTerm supports both Kitty and iTerm2
        "mintty" |      // Windows terminal
        "WarpTerminal" |
        "Tabby" |
        "rio"
    ) {
        return true;
    }

    if env.contains("WEZTERM_EXECUTABLE") || env.contains("KONSOLE_VERSION") {
        return true;
    }

    // Check TERM variable for iTerm2 patterns
    term.contains("iterm")
}

fn determine_terminal_name(term_program: &str, term: &str) -> String {
    if !term_program.is_empty() {
        term_program.to_string()
    } else if !term.is_empty() {
        term.to_string()
    } else {
        "unknown".to_string()
    }
}

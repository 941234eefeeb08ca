// ABOUTME: Chooses between Kitty, iTerm2 and half-block rendering for each render call
// ABOUTME: Combines caller preferences, interactivity, detected capabilities and the runtime probe

use super::detection::{Protocol, TerminalCapabilities, detect_capability};
use super::probe::{GraphicsProbe, TerminalQueryProbe};
use crate::terminal::{EnvSnapshot, is_interactive};

pub struct ProtocolSelector {
    capabilities: TerminalCapabilities,
    interactive: bool,
    probe: Box<dyn GraphicsProbe>,
}

impl ProtocolSelector {
    pub fn new(env: &EnvSnapshot, interactive: bool, probe: Box<dyn GraphicsProbe>) -> Self {
        Self {
            capabilities: detect_capability(env),
            interactive,
            probe,
        }
    }

    /// Selector for the current process environment and controlling terminal
    pub fn from_env() -> Self {
        Self::new(
            &EnvSnapshot::capture(),
            is_interactive(),
            Box::new(TerminalQueryProbe::new()),
        )
    }

    pub fn capabilities(&self) -> &TerminalCapabilities {
        &self.capabilities
    }

    pub fn select(&self, prefer_native: bool, animation_frame: bool) -> Protocol {
        if !prefer_native || !self.interactive || animation_frame {
            return Protocol::Halfblocks;
        }

        if let Some(forced) = self.capabilities.forced_protocol {
            return forced;
        }

        if self.capabilities.may_support_kitty_images && self.probe.supports_kitty_graphics() {
            return Protocol::Kitty;
        }

        if self.capabilities.supports_iterm2_images {
            return Protocol::ITerm2;
        }

        Protocol::Halfblocks
    }
}

impl std::fmt::Debug for ProtocolSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolSelector")
            .field("capabilities", &self.capabilities)
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}

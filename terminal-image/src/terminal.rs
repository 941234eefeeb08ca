// ABOUTME: Terminal information collaborators: size, interactivity and environment snapshot
// ABOUTME: Captures ambient process state once so detection logic stays pure and testable

use crate::constants::terminal::{DEFAULT_COLUMNS, DEFAULT_ROWS};
use crossterm::terminal::size as terminal_size;
use std::collections::HashMap;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: u16,
    pub rows: u16,
}

impl TerminalSize {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }

    /// Query the controlling terminal, falling back to 80x24
    pub fn detect() -> Self {
        match terminal_size() {
            Ok((columns, rows)) if columns > 0 && rows > 0 => Self { columns, rows },
            Ok(_) => Self::default(),
            Err(e) => {
                log::debug!("Failed to get terminal size, using defaults: {}", e);
                Self::default()
            }
        }
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
        }
    }
}

/// Whether stdout and stdin are both attached to a terminal
pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stdin().is_terminal()
}

/// Immutable copy of the environment variables relevant to protocol detection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value of `key`, or "" when unset
    pub fn var(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }
}

// ABOUTME: Runtime query that asks the terminal whether it understands Kitty graphics
// ABOUTME: Sends a graphics query plus a device-attributes query and waits briefly for replies

use crate::constants::protocol::PROBE_TIMEOUT;
use once_cell::sync::OnceCell;
use std::time::Duration;

/// Graphics query for a 1x1 RGB image; terminals with support answer `OK`
const KITTY_QUERY: &[u8] = b"\x1b_Gi=31,s=1,v=1,a=q,t=d,f=24;AAAA\x1b\\";
/// Primary device attributes, answered by every VT100-compatible terminal
const DA1_QUERY: &[u8] = b"\x1b[c";
const KITTY_OK: &str = "\x1b_Gi=31;OK";
const MAX_RESPONSE_LEN: usize = 256;
/// Extra time the reader thread keeps listening after the caller gave up
const READER_GRACE: Duration = Duration::from_millis(200);

static KITTY_SUPPORT: OnceCell<bool> = OnceCell::new();

pub trait GraphicsProbe: Send + Sync {
    fn supports_kitty_graphics(&self) -> bool;
}

/// Queries the controlling terminal once per process and caches the answer
#[derive(Debug, Clone)]
pub struct TerminalQueryProbe {
    timeout: Duration,
}

impl TerminalQueryProbe {
    pub fn new() -> Self {
        Self {
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TerminalQueryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsProbe for TerminalQueryProbe {
    fn supports_kitty_graphics(&self) -> bool {
        *KITTY_SUPPORT.get_or_init(|| {
            let supported = query_terminal(self.timeout).unwrap_or(false);
            log::debug!("Kitty graphics probe answered: {}", supported);
            supported
        })
    }
}

/// Interpret whatever the terminal sent back. `None` until the
/// device-attributes reply is complete, then whether the graphics `OK`
/// arrived ahead of it. Answering only once DA1 is in keeps the rest of
/// the reply from leaking into the shell after raw mode is switched off.
pub fn parse_probe_response(response: &[u8]) -> Option<bool> {
    let text = String::from_utf8_lossy(response);
    let da1_start = text.find("\x1b[?")?;
    if !text[da1_start..].contains('c') {
        return None;
    }
    Some(text[..da1_start].contains(KITTY_OK))
}

#[cfg(unix)]
fn query_terminal(timeout: Duration) -> Option<bool> {
    use crossterm::terminal::{disable_raw_mode, enable_raw_mode, is_raw_mode_enabled};
    use std::io::Write;

    let was_raw = is_raw_mode_enabled().unwrap_or(false);
    if !was_raw {
        enable_raw_mode().ok()?;
    }

    let result = (|| {
        let mut tty = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .ok()?;
        tty.write_all(KITTY_QUERY).ok()?;
        tty.write_all(DA1_QUERY).ok()?;
        tty.flush().ok()?;

        let answer = read_probe_reply(tty, timeout);
        if answer.is_none() {
            log::debug!("Graphics probe timed out after {:?}", timeout);
        }
        answer
    })();

    if !was_raw {
        let _ = disable_raw_mode();
    }
    result
}

/// Read the replies on a helper thread so a silent terminal cannot block
/// the caller. The thread gives up on its own shortly after `timeout`.
#[cfg(unix)]
fn read_probe_reply(tty: std::fs::File, timeout: Duration) -> Option<bool> {
    use std::io::Read;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    let (tx, rx) = mpsc::sync_channel::<bool>(1);
    let thread_deadline = timeout + READER_GRACE;

    thread::Builder::new()
        .name("terminal-image-probe".into())
        .spawn(move || {
            let mut reader = std::io::BufReader::new(tty);
            let mut response = Vec::with_capacity(64);
            let mut buf = [0u8; 1];
            let start = Instant::now();

            while response.len() < MAX_RESPONSE_LEN && start.elapsed() <= thread_deadline {
                match reader.read(&mut buf) {
                    Ok(1) => response.push(buf[0]),
                    _ => return,
                }
                if let Some(answer) = parse_probe_response(&response) {
                    let _ = tx.send(answer);
                    return;
                }
            }
        })
        .ok()?;

    rx.recv_timeout(timeout).ok()
}

#[cfg(not(unix))]
fn query_terminal(_timeout: Duration) -> Option<bool> {
    None
}

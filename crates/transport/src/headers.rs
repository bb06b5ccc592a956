//! Status-line parsing and the header-drain state machine.
//!
//! Two detectors watch the same byte stream: a four-step `\r\n\r\n`
//! matcher and a bare `\n\n` matcher. Headers end as soon as either fires.
//! A `\r` never resets the bare-LF detector, so a CRLF blank line satisfies
//! both.

use crate::http::HttpStatus;
use crate::reader::{ByteReader, Next};
use femtoclaw_core::json::text_prefix;
use femtoclaw_core::limits::LINE_CAP;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Progress of the CRLF detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrlfState {
    AwaitCr,
    AwaitLf,
    AwaitSecondCr,
    AwaitSecondLf,
}

/// Detects the blank line that ends an HTTP header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderTerminator {
    crlf: CrlfState,
    prev_lf: bool,
}

impl Default for HeaderTerminator {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderTerminator {
    /// Fresh detector, mid-line.
    pub const fn new() -> Self {
        Self {
            crlf: CrlfState::AwaitCr,
            prev_lf: false,
        }
    }

    /// Detector positioned right after a line break, as it is once the
    /// status line has been consumed.
    pub const fn after_line_break() -> Self {
        Self {
            crlf: CrlfState::AwaitSecondCr,
            prev_lf: true,
        }
    }

    /// Feeds one byte. Returns `true` when the header block has ended.
    pub fn feed(&mut self, b: u8) -> bool {
        let crlf_done = self.step_crlf(b);
        let lf_done = self.step_bare_lf(b);
        crlf_done || lf_done
    }

    fn step_crlf(&mut self, b: u8) -> bool {
        use CrlfState::*;
        let (next, done) = match (self.crlf, b) {
            (AwaitSecondCr, b'\r') => (AwaitSecondLf, false),
            (_, b'\r') => (AwaitLf, false),
            (AwaitLf, b'\n') => (AwaitSecondCr, false),
            (AwaitSecondLf, b'\n') => (AwaitCr, true),
            _ => (AwaitCr, false),
        };
        self.crlf = next;
        done
    }

    fn step_bare_lf(&mut self, b: u8) -> bool {
        match b {
            b'\n' if self.prev_lf => true,
            b'\n' => {
                self.prev_lf = true;
                false
            }
            b'\r' => false,
            _ => {
                self.prev_lf = false;
                false
            }
        }
    }

    pub fn crlf_state(&self) -> CrlfState {
        self.crlf
    }
}

/// Parses `HTTP/<ver> <code> ...`. The code must be exactly three digits.
pub fn parse_status(line: &str) -> Option<u16> {
    let mut parts = line.split_ascii_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}

/// Reads the status line, then discards header bytes until the blank line.
///
/// On timeout or disconnect the status parsed so far is still returned.
pub async fn drain_headers(reader: &mut ByteReader<'_>, timeout: Duration) -> HttpStatus {
    let mut line = [0u8; LINE_CAP];
    let read = reader.read_line(&mut line, timeout).await;
    let status = match parse_status(text_prefix(&line[..read.len])) {
        Some(code) => HttpStatus::Code(code),
        None => HttpStatus::Malformed,
    };
    if read.len == 0 && !read.terminated {
        debug!("No status line received");
        return status;
    }

    let mut fsm = if read.terminated {
        HeaderTerminator::after_line_break()
    } else {
        HeaderTerminator::new()
    };
    let deadline = Instant::now() + timeout;
    let mut drained = 0usize;
    loop {
        match reader.next_byte(deadline).await {
            Next::Byte(b) => {
                drained += 1;
                if fsm.feed(b) {
                    break;
                }
            }
            Next::Closed | Next::TimedOut => {
                debug!(drained, %status, "Header block ended early");
                break;
            }
        }
    }
    status
}

//! One HTTP/1.1 request-response exchange over a [`Connection`].
//!
//! Sequence: close → settle → (TLS: skip verification) → connect → send →
//! await first byte → drain headers → read body → unchunk → close. The
//! connection is closed on every exit path.

use crate::chunked::unchunk_in_place;
use crate::headers::drain_headers;
use crate::reader::ByteReader;
use femtoclaw_core::bounded::Text;
use femtoclaw_core::connection::Connection;
use femtoclaw_core::error::TransportError;
use femtoclaw_core::limits::{HTTP_TIMEOUT, REQUEST_HEAD_CAP, WRITE_SLICE};
use std::fmt::{self, Write};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("femtoclaw/", env!("CARGO_PKG_VERSION"));

/// Outcome of an exchange, printable as the numeric status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Code(u16),
    /// No parsable status line
    Malformed,
    ConnectFailed,
    /// The request could not be framed or written
    SendFailed,
    /// Another exchange holds the busy guard
    Busy,
}

impl HttpStatus {
    /// The status code, or -1 when there is none.
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Code(code) => i16::try_from(code).unwrap_or(i16::MAX),
            _ => -1,
        }
    }

    pub fn code(self) -> Option<u16> {
        match self {
            Self::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Code(200)
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i16())
    }
}

/// Per-phase time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    /// Wait for the first response byte
    pub first_byte: Duration,
    /// Status line and header block, each
    pub headers: Duration,
    pub body: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::uniform(HTTP_TIMEOUT)
    }
}

impl Timeouts {
    pub const fn uniform(t: Duration) -> Self {
        Self {
            connect: t,
            first_byte: t,
            headers: t,
            body: t,
        }
    }
}

/// A request. A body makes it a POST; no body makes it a GET.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    /// Host name without port, used for the `Host` header
    pub host: &'a str,
    pub path: &'a str,
    /// Complete header lines, each ending in `\r\n`
    pub headers: &'a str,
    pub body: Option<&'a [u8]>,
}

impl<'a> Request<'a> {
    pub fn get(host: &'a str, path: &'a str) -> Self {
        Self {
            host,
            path,
            headers: "",
            body: None,
        }
    }

    pub fn post(host: &'a str, path: &'a str, body: &'a [u8]) -> Self {
        Self {
            host,
            path,
            headers: "",
            body: Some(body),
        }
    }

    pub fn with_headers(mut self, headers: &'a str) -> Self {
        self.headers = headers;
        self
    }

    /// Renders the request line and headers.
    pub fn head(&self) -> Result<Text<REQUEST_HEAD_CAP>, TransportError> {
        let mut head = Text::new();
        self.write_head(&mut head)
            .map_err(|_| TransportError::HeadTooLarge(REQUEST_HEAD_CAP))?;
        Ok(head)
    }

    fn write_head(&self, w: &mut impl Write) -> fmt::Result {
        match self.body {
            Some(body) => {
                write!(w, "POST {} HTTP/1.1\r\n", self.path)?;
                write!(w, "Host: {}\r\n", self.host)?;
                write!(w, "User-Agent: {USER_AGENT}\r\n")?;
                w.write_str("Content-Type: application/json\r\n")?;
                w.write_str(self.headers)?;
                write!(w, "Content-Length: {}\r\nConnection: close\r\n\r\n", body.len())
            }
            None => {
                write!(w, "GET {} HTTP/1.1\r\n", self.path)?;
                write!(w, "Host: {}\r\n", self.host)?;
                write!(w, "User-Agent: {USER_AGENT}\r\n")?;
                w.write_str(self.headers)?;
                w.write_str("Connection: close\r\n\r\n")
            }
        }
    }
}

/// How to (re)open the connection object before sending.
#[derive(Debug, Clone, Copy)]
pub struct Dial<'a> {
    pub host: &'a str,
    pub port: u16,
    /// Pause after closing, before reconnecting
    pub settle: Duration,
    /// Skip certificate validation (TLS objects)
    pub insecure: bool,
}

/// Runs one exchange, leaving the decoded body in `out[..len]`.
///
/// Returns the status and body length. A failed connect yields
/// [`HttpStatus::ConnectFailed`] and an empty body.
pub async fn exchange(
    conn: &mut dyn Connection,
    dial: Dial<'_>,
    req: &Request<'_>,
    out: &mut [u8],
    timeouts: &Timeouts,
) -> (HttpStatus, usize) {
    conn.close().await;
    tokio::time::sleep(dial.settle).await;
    if dial.insecure {
        conn.set_insecure();
    }

    debug!(kind = conn.kind(), host = dial.host, port = dial.port, path = req.path, "Connecting");
    let connected = tokio::time::timeout(timeouts.connect, conn.connect(dial.host, dial.port)).await;
    match connected {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(host = dial.host, error = %e, "Connect failed");
            conn.close().await;
            return (HttpStatus::ConnectFailed, 0);
        }
        Err(_) => {
            warn!(host = dial.host, timeout = ?timeouts.connect, "Connect timed out");
            conn.close().await;
            return (HttpStatus::ConnectFailed, 0);
        }
    }

    if let Err(e) = send(conn, req).await {
        warn!(host = dial.host, error = %e, "Request send failed");
        conn.close().await;
        return (HttpStatus::SendFailed, 0);
    }

    let (status, len) = {
        let mut reader = ByteReader::new(conn);
        if !reader.wait_readable(timeouts.first_byte).await {
            debug!(host = dial.host, "No response bytes before timeout or close");
        }
        let status = drain_headers(&mut reader, timeouts.headers).await;
        let raw = reader.read_body(out, timeouts.body).await;
        (status, unchunk_in_place(&mut out[..raw]))
    };
    conn.close().await;

    debug!(host = dial.host, %status, body_len = len, "Exchange complete");
    (status, len)
}

async fn send(conn: &mut dyn Connection, req: &Request<'_>) -> Result<(), TransportError> {
    let head = req.head()?;
    conn.write_all(head.as_bytes()).await?;
    if let Some(body) = req.body {
        for slice in body.chunks(WRITE_SLICE) {
            conn.write_all(slice).await?;
        }
    }
    Ok(())
}

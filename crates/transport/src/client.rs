//! The transport: per-peer connection objects, one shared response buffer
//! and the busy guard.

use crate::busy::BusyFlag;
use crate::http::{Dial, HttpStatus, Request, Timeouts, exchange};
use crate::tcp::TcpConnection;
use crate::tls::TlsConnection;
use femtoclaw_core::connection::Connection;
use femtoclaw_core::json::text_prefix;
use femtoclaw_core::limits::{HTTP_RESP_CAP, PLAIN_RESET_SETTLE, TLS_RESET_SETTLE};
use tracing::warn;

const HTTPS_PORT: u16 = 443;

/// A remote peer group with its own TLS connection object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peer {
    Llm,
    Telegram,
    Discord,
}

impl Peer {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Telegram => "telegram",
            Self::Discord => "discord",
        }
    }
}

/// Which connection object carries a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// HTTPS on port 443 through the peer's dedicated object
    Tls(Peer),
    /// Unencrypted HTTP through the single plain object
    Plain { port: u16 },
}

pub struct Transport {
    llm: Box<dyn Connection>,
    telegram: Box<dyn Connection>,
    discord: Box<dyn Connection>,
    plain: Box<dyn Connection>,
    response: Box<[u8; HTTP_RESP_CAP]>,
    len: usize,
    busy: BusyFlag,
    timeouts: Timeouts,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("body_len", &self.len)
            .field("busy", &self.busy.is_busy())
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl Transport {
    /// Real sockets: three TLS objects and one plain TCP object.
    pub fn new() -> Self {
        Self::with_connections(
            Box::new(TlsConnection::new()),
            Box::new(TlsConnection::new()),
            Box::new(TlsConnection::new()),
            Box::new(TcpConnection::new()),
        )
    }

    pub fn with_connections(
        llm: Box<dyn Connection>,
        telegram: Box<dyn Connection>,
        discord: Box<dyn Connection>,
        plain: Box<dyn Connection>,
    ) -> Self {
        Self {
            llm,
            telegram,
            discord,
            plain,
            response: Box::new([0; HTTP_RESP_CAP]),
            len: 0,
            busy: BusyFlag::new(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Shares an existing busy flag (the scheduler holds the other end).
    pub fn with_busy_flag(mut self, busy: BusyFlag) -> Self {
        self.busy = busy;
        self
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Runs one exchange. The decoded body is available from [`body`]
    /// until the next request.
    ///
    /// [`body`]: Self::body
    pub async fn request(&mut self, route: Route, req: &Request<'_>) -> HttpStatus {
        self.len = 0;
        let Some(_guard) = self.busy.try_acquire() else {
            warn!(host = req.host, "Transport busy, request refused");
            return HttpStatus::Busy;
        };

        let (conn, dial) = match route {
            Route::Tls(peer) => {
                let conn = match peer {
                    Peer::Llm => &mut self.llm,
                    Peer::Telegram => &mut self.telegram,
                    Peer::Discord => &mut self.discord,
                };
                let dial = Dial {
                    host: req.host,
                    port: HTTPS_PORT,
                    settle: TLS_RESET_SETTLE,
                    insecure: true,
                };
                (conn, dial)
            }
            Route::Plain { port } => {
                let dial = Dial {
                    host: req.host,
                    port,
                    settle: PLAIN_RESET_SETTLE,
                    insecure: false,
                };
                (&mut self.plain, dial)
            }
        };

        let (status, len) = exchange(
            conn.as_mut(),
            dial,
            req,
            &mut self.response[..],
            &self.timeouts,
        )
        .await;
        self.len = len;
        status
    }

    /// Decoded body of the last request.
    pub fn body(&self) -> &[u8] {
        &self.response[..self.len]
    }

    /// The longest valid UTF-8 prefix of the last body.
    pub fn body_text(&self) -> &str {
        text_prefix(self.body())
    }
}

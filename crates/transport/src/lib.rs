//! # FemtoClaw Transport
//!
//! HTTP/1.1 over fixed buffers. Every request opens a fresh connection,
//! sends `Connection: close`, reads the body into the shared response
//! buffer, decodes chunked framing in place and closes again.
//!
//! Each remote peer group (LM backend, Telegram, Discord) owns its own TLS
//! connection object, reset before every request. A single plain TCP object
//! serves an unencrypted LM backend.

pub mod busy;
pub mod chunked;
pub mod client;
pub mod headers;
pub mod http;
pub mod mock;
pub mod reader;
pub mod tcp;
pub mod tls;

pub use busy::{BusyFlag, BusyGuard};
pub use client::{Peer, Route, Transport};
pub use http::{HttpStatus, Request, Timeouts};
pub use mock::ScriptedConnection;

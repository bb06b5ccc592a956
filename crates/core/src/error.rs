//! Error types for the FemtoClaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. None of them is fatal:
//! the worst outcome of any error is one request or poll cycle that produced
//! nothing useful.

use crate::bounded::Text;
use crate::limits::{EXCERPT_CAP, PARSE_EXCERPT_CAP};
use std::fmt;
use thiserror::Error;

/// The top-level error type for all FemtoClaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Identifier overflow ---
    #[error(transparent)]
    Id(#[from] IdOverflow),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("connect to {host}:{port} timed out")]
    ConnectTimeout { host: String, port: u16 },

    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("not connected")]
    NotConnected,

    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which field of a chat-completion response was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Choices,
    Message,
    Content,
}

impl fmt::Display for ParseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Choices => "choices",
            Self::Message => "message",
            Self::Content => "content",
        })
    }
}

/// Language-model client failures.
///
/// The `Display` form is the diagnostic handed back to the user in place of
/// a reply, so it is kept short and starts with a bracketed tag.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("[LLM {status}] {excerpt}")]
    Http {
        status: i16,
        excerpt: Text<EXCERPT_CAP>,
    },

    #[error("[parse:no-json] {excerpt}")]
    NoJson { excerpt: Text<PARSE_EXCERPT_CAP> },

    #[error("[parse:{stage}] {excerpt}")]
    MissingField {
        stage: ParseStage,
        excerpt: Text<PARSE_EXCERPT_CAP>,
    },

    #[error("[LLM request too large]")]
    RequestTooLarge,

    #[error("[LLM endpoint] unusable api_base")]
    InvalidEndpoint,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Message delivery failed to {channel}: status {status}")]
    DeliveryFailed { channel: &'static str, status: i16 },

    #[error("Fetch failed on {channel}: status {status}")]
    FetchFailed { channel: &'static str, status: i16 },

    #[error("Message on {channel} too large to frame")]
    FrameTooLarge { channel: &'static str },
}

/// A value did not fit an identifier buffer; the buffer was zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("identifier needs {needed} bytes, buffer holds {capacity}")]
pub struct IdOverflow {
    pub needed: usize,
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_status_and_excerpt() {
        let err = ProviderError::Http {
            status: 429,
            excerpt: Text::try_from("Too many requests").unwrap(),
        };
        assert_eq!(err.to_string(), "[LLM 429] Too many requests");
    }

    #[test]
    fn parse_errors_name_their_stage() {
        let err = ProviderError::MissingField {
            stage: ParseStage::Message,
            excerpt: Text::try_from("{\"choices\":[]}").unwrap(),
        };
        assert!(err.to_string().starts_with("[parse:message]"));
    }

    #[test]
    fn top_level_error_wraps_context() {
        let err: Error = ChannelError::DeliveryFailed {
            channel: "telegram",
            status: -1,
        }
        .into();
        assert!(err.to_string().contains("telegram"));
        assert!(err.to_string().contains("-1"));
    }
}

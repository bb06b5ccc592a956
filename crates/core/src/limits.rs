//! Buffer capacities and timing constants.
//!
//! Capacities are in bytes. They bound every fixed buffer on the data path,
//! so raising one raises the device's static memory footprint.

use std::time::Duration;

/// Raw HTTP response buffer, reused by every request.
pub const HTTP_RESP_CAP: usize = 8192;
/// Encoded session history.
pub const SESSION_CAP: usize = 4096;
/// Outbound JSON request body.
pub const JSON_OUT_CAP: usize = 4096;
/// Inbound chat message text.
pub const PROMPT_CAP: usize = 1024;
/// Model reply text.
pub const REPLY_CAP: usize = 2048;
/// Agent input: a prompt plus room for a tool-result preamble.
pub const COMBINED_CAP: usize = PROMPT_CAP + 512;
/// Generic config string (credentials, URLs, tokens).
pub const CFG_CAP: usize = 128;
pub const MODEL_CAP: usize = 64;
pub const PROVIDER_CAP: usize = 32;
pub const SYSTEM_PROMPT_CAP: usize = 512;
/// Sender, chat and message identifiers, including one reserved byte.
pub const ID_CAP: usize = 32;
pub const ALLOW_LIST_MAX: usize = 8;
/// Tool result text.
pub const TOOL_RESULT_CAP: usize = 512;
pub const TOOL_NAME_CAP: usize = 48;
pub const TOOL_ARGS_CAP: usize = 512;
/// Status line scratch.
pub const LINE_CAP: usize = 128;
/// Request line plus headers.
pub const REQUEST_HEAD_CAP: usize = 768;
/// Diagnostic excerpt of a failed response.
pub const EXCERPT_CAP: usize = 200;
/// Diagnostic excerpt of an unparsable response.
pub const PARSE_EXCERPT_CAP: usize = 120;

/// Bodies are written in slices of this size.
pub const WRITE_SLICE: usize = 512;

pub const TELEGRAM_CHUNK: usize = 3800;
pub const DISCORD_CHUNK: usize = 1800;
/// Updates or messages fetched per poll.
pub const POLL_BATCH: usize = 5;

/// Per-operation network timeout (connect, status line, headers, body).
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
/// Longest single wait for bytes before control returns to the caller's loop.
pub const POLL_SLICE: Duration = Duration::from_millis(10);
/// Pause between closing a TLS object and reconnecting it.
pub const TLS_RESET_SETTLE: Duration = Duration::from_millis(100);
/// Pause before reconnecting the plain-text object.
pub const PLAIN_RESET_SETTLE: Duration = Duration::from_millis(20);
/// Pause between the inbound fetch and the outbound send.
pub const SEND_SETTLE: Duration = Duration::from_millis(20);
pub const TELEGRAM_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DISCORD_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const LIVENESS_INTERVAL: Duration = Duration::from_millis(200);

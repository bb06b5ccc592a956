//! # FemtoClaw Core
//!
//! Domain types, capability traits and error definitions for FemtoClaw, a
//! conversational agent sized for memory-constrained networked devices.
//!
//! ## Design Philosophy
//!
//! Every buffer on the data path has a fixed capacity chosen in [`limits`],
//! and every capacity check lives in a type ([`bounded::IdBuf`],
//! `heapless::String`, [`session::Session`]) rather than at the call site.
//! Platform concerns (sockets, persistence, clocks, the host console) are
//! traits defined here and implemented in their own crates:
//! - [`connection::Connection`] for one TCP or TLS peer
//! - [`platform::Platform`] for uptime, network status and console output
//! - [`provider::ChatModel`] for the language-model backend

pub mod bounded;
pub mod connection;
pub mod error;
pub mod json;
pub mod limits;
pub mod platform;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use bounded::{IdBuf, Identifier, JsonBuf, Text};
pub use connection::{Connection, ReadStatus};
pub use error::{ChannelError, Error, IdOverflow, ProviderError, Result, TransportError};
pub use platform::{NetworkInfo, Platform, StubPlatform};
pub use provider::{ChatModel, ChatRequest, LlmSettings, Reply, ReplySource};
pub use session::{Session, Turn};

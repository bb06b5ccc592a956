//! Connection trait: one TCP or TLS peer the transport can drive.
//!
//! Implementations live in `femtoclaw-transport`. Reads never block longer
//! than the `wait` the caller passes in, so the caller can enforce its own
//! deadline and keep the rest of the runtime responsive between polls.

use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

/// Outcome of one bounded read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// This many bytes were copied into the caller's buffer.
    Data(usize),
    /// Nothing arrived within the wait.
    Idle,
    /// The peer closed the stream, or it was never open.
    Closed,
}

#[async_trait]
pub trait Connection: Send {
    /// Short label for logs ("tls", "tcp", "mock").
    fn kind(&self) -> &'static str;

    /// Skip certificate validation on the next connect.
    fn set_insecure(&mut self) {}

    async fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Copies whatever bytes arrive within `wait` into `buf`.
    async fn read_available(&mut self, buf: &mut [u8], wait: Duration) -> ReadStatus;

    fn is_connected(&self) -> bool;

    /// Releases the socket. Safe to call when already closed.
    async fn close(&mut self);
}

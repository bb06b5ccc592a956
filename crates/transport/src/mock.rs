//! Scripted in-memory connection for tests.
//!
//! Each `connect` consumes the next queued exchange. Response bytes are
//! handed out one fragment per read, so tests can split a response at any
//! byte. Clones share the same script, which lets a test keep a handle while
//! the transport owns the boxed connection.

use crate::client::Transport;
use async_trait::async_trait;
use femtoclaw_core::connection::{Connection, ReadStatus};
use femtoclaw_core::error::TransportError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Exchange {
    refuse: bool,
    fragments: VecDeque<Vec<u8>>,
    /// After the last fragment, stay open and silent instead of closing.
    hang: bool,
}

#[derive(Debug, Default)]
struct Script {
    queued: VecDeque<Exchange>,
    current: Option<Exchange>,
    connects: Vec<(String, u16)>,
    written: Vec<Vec<u8>>,
    closes: usize,
    insecure: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedConnection {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a complete response for the next connect.
    pub fn respond(&self, bytes: impl AsRef<[u8]>) -> &Self {
        self.respond_fragments(&[bytes.as_ref()])
    }

    /// Queues a response delivered in the given pieces.
    pub fn respond_fragments(&self, fragments: &[&[u8]]) -> &Self {
        self.script().queued.push_back(Exchange {
            fragments: fragments.iter().map(|f| f.to_vec()).collect(),
            ..Exchange::default()
        });
        self
    }

    /// Queues a response that goes silent after `bytes` without closing.
    pub fn respond_then_hang(&self, bytes: impl AsRef<[u8]>) -> &Self {
        self.script().queued.push_back(Exchange {
            fragments: VecDeque::from([bytes.as_ref().to_vec()]),
            hang: true,
            ..Exchange::default()
        });
        self
    }

    /// Makes the next connect fail.
    pub fn refuse_next(&self) -> &Self {
        self.script().queued.push_back(Exchange {
            refuse: true,
            ..Exchange::default()
        });
        self
    }

    /// `(host, port)` of every connect attempt.
    pub fn connects(&self) -> Vec<(String, u16)> {
        self.script().connects.clone()
    }

    /// Bytes written on each successful connection, as text.
    pub fn requests(&self) -> Vec<String> {
        self.script()
            .written
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    pub fn closes(&self) -> usize {
        self.script().closes
    }

    /// How many times certificate checks were switched off.
    pub fn insecure_count(&self) -> usize {
        self.script().insecure
    }

    /// Exchanges not yet consumed.
    pub fn pending(&self) -> usize {
        self.script().queued.len()
    }

    /// A transport whose every connection object replays this script.
    pub fn transport(&self) -> Transport {
        Transport::with_connections(
            Box::new(self.clone()),
            Box::new(self.clone()),
            Box::new(self.clone()),
            Box::new(self.clone()),
        )
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    fn kind(&self) -> &'static str {
        "mock"
    }

    fn set_insecure(&mut self) {
        self.script().insecure += 1;
    }

    async fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        let mut script = self.script();
        script.connects.push((host.to_owned(), port));
        match script.queued.pop_front() {
            Some(exchange) if !exchange.refuse => {
                script.current = Some(exchange);
                script.written.push(Vec::new());
                Ok(())
            }
            _ => Err(TransportError::Connect {
                host: host.to_owned(),
                port,
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            }),
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut script = self.script();
        if script.current.is_none() {
            return Err(TransportError::NotConnected);
        }
        if let Some(buf) = script.written.last_mut() {
            buf.extend_from_slice(data);
        }
        Ok(())
    }

    async fn read_available(&mut self, buf: &mut [u8], wait: Duration) -> ReadStatus {
        let hang = {
            let mut script = self.script();
            let Some(exchange) = script.current.as_mut() else {
                return ReadStatus::Closed;
            };
            if let Some(front) = exchange.fragments.front_mut() {
                let n = front.len().min(buf.len());
                buf[..n].copy_from_slice(&front[..n]);
                front.drain(..n);
                if front.is_empty() {
                    exchange.fragments.pop_front();
                }
                return ReadStatus::Data(n);
            }
            exchange.hang
        };
        if hang {
            tokio::time::sleep(wait).await;
            ReadStatus::Idle
        } else {
            ReadStatus::Closed
        }
    }

    fn is_connected(&self) -> bool {
        self.script().current.is_some()
    }

    async fn close(&mut self) {
        let mut script = self.script();
        if script.current.take().is_some() {
            script.closes += 1;
        }
    }
}

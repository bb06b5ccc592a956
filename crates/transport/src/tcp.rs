//! Plain TCP connection.

use async_trait::async_trait;
use femtoclaw_core::connection::{Connection, ReadStatus};
use femtoclaw_core::error::TransportError;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Debug, Default)]
pub struct TcpConnection {
    stream: Option<TcpStream>,
}

impl TcpConnection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Connection for TcpConnection {
    fn kind(&self) -> &'static str {
        "tcp"
    }

    async fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| TransportError::Connect {
                host: host.to_owned(),
                port,
                source,
            })?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        stream.write_all(data).await?;
        Ok(())
    }

    async fn read_available(&mut self, buf: &mut [u8], wait: Duration) -> ReadStatus {
        let Some(stream) = self.stream.as_mut() else {
            return ReadStatus::Closed;
        };
        match tokio::time::timeout(wait, stream.read(buf)).await {
            Ok(Ok(0)) | Ok(Err(_)) => ReadStatus::Closed,
            Ok(Ok(n)) => ReadStatus::Data(n),
            Err(_) => ReadStatus::Idle,
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn round_trip_against_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut got = [0u8; 4];
            sock.read_exact(&mut got).await.unwrap();
            sock.write_all(b"pong").await.unwrap();
            got
        });

        let mut conn = TcpConnection::new();
        conn.connect("127.0.0.1", port).await.unwrap();
        assert!(conn.is_connected());
        conn.write_all(b"ping").await.unwrap();

        let mut buf = [0u8; 16];
        let mut got = Vec::new();
        while got.len() < 4 {
            match conn.read_available(&mut buf, Duration::from_secs(1)).await {
                ReadStatus::Data(n) => got.extend_from_slice(&buf[..n]),
                ReadStatus::Idle => {}
                ReadStatus::Closed => break,
            }
        }
        assert_eq!(got, b"pong");
        assert_eq!(&server.await.unwrap(), b"ping");

        conn.close().await;
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn refused_connect_reports_host_and_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut conn = TcpConnection::new();
        let err = conn.connect("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, TransportError::Connect { port: p, .. } if p == port));
        assert!(!conn.is_connected());
    }
}

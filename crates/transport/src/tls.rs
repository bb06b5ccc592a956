//! TLS connection over `tokio-rustls`.
//!
//! Certificate validation uses the Mozilla root set from `webpki-roots`
//! unless [`Connection::set_insecure`] was called, in which case any
//! certificate is accepted. The firmware-style exchange switches it off
//! before every connect.

use async_trait::async_trait;
use femtoclaw_core::connection::{Connection, ReadStatus};
use femtoclaw_core::error::TransportError;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls;
use tracing::debug;

const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

pub struct TlsConnection {
    stream: Option<TlsStream<TcpStream>>,
    verify: bool,
}

impl Default for TlsConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TlsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnection")
            .field("connected", &self.stream.is_some())
            .field("verify", &self.verify)
            .finish()
    }
}

impl TlsConnection {
    pub fn new() -> Self {
        Self {
            stream: None,
            verify: true,
        }
    }

    fn client_config(&self) -> rustls::ClientConfig {
        if self.verify {
            let root_store: rustls::RootCertStore =
                webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth()
        } else {
            rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerify))
                .with_no_client_auth()
        }
    }
}

#[async_trait]
impl Connection for TlsConnection {
    fn kind(&self) -> &'static str {
        "tls"
    }

    fn set_insecure(&mut self) {
        self.verify = false;
    }

    async fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        let domain = rustls::pki_types::ServerName::try_from(host.to_owned())
            .map_err(|_| TransportError::InvalidServerName(host.to_owned()))?;
        let tcp = TcpStream::connect((host, port))
            .await
            .map_err(|source| TransportError::Connect {
                host: host.to_owned(),
                port,
                source,
            })?;
        tcp.set_nodelay(true)?;

        let connector = tokio_rustls::TlsConnector::from(Arc::new(self.client_config()));
        let tls = connector
            .connect(domain, tcp)
            .await
            .map_err(TransportError::Handshake)?;
        debug!(host, port, verify = self.verify, "TLS session established");
        self.stream = Some(tls);
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        stream.write_all(data).await?;
        stream.flush().await?;
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
            // Peers that never answer close_notify must not stall the caller.
            let _ = tokio::time::timeout(SHUTDOWN_GRACE, stream.shutdown()).await;
        }
    }
}

/// Certificate verifier that accepts any certificate.
#[derive(Debug)]
struct NoVerify;

impl rustls::client::danger::ServerCertVerifier for NoVerify {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_insecure_disables_verification() {
        let mut conn = TlsConnection::new();
        assert!(conn.verify);
        conn.set_insecure();
        assert!(!conn.verify);
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn invalid_server_name_is_rejected_before_dialing() {
        let mut conn = TlsConnection::new();
        let err = conn.connect("not a host name", 443).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidServerName(_)));
    }

    #[tokio::test]
    async fn read_and_write_require_connection() {
        let mut conn = TlsConnection::new();
        let mut buf = [0u8; 8];
        assert_eq!(
            conn.read_available(&mut buf, Duration::from_millis(1)).await,
            ReadStatus::Closed
        );
        assert!(matches!(
            conn.write_all(b"x").await,
            Err(TransportError::NotConnected)
        ));
        conn.close().await;
    }
}

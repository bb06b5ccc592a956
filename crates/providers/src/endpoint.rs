//! Backend base-URL parsing.

use femtoclaw_core::bounded::Text;
use femtoclaw_core::error::ProviderError;
use femtoclaw_core::limits::CFG_CAP;
use femtoclaw_transport::{Peer, Route};
use std::fmt::Write;

const COMPLETIONS: &str = "/chat/completions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// A parsed `api_base` such as `https://openrouter.ai/api/v1` or
/// `http://192.168.1.20:11434/v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint<'a> {
    pub scheme: Scheme,
    /// Host without port; also the `Host` header value
    pub host: &'a str,
    /// Explicit or scheme default. TLS always dials 443.
    pub port: u16,
    /// Path below the host, without a trailing slash
    pub prefix: &'a str,
}

impl<'a> Endpoint<'a> {
    /// Parses a base URL. A missing scheme means HTTPS.
    pub fn parse(base: &'a str) -> Result<Self, ProviderError> {
        let base = base.trim();
        let (scheme, rest) = if let Some(rest) = base.strip_prefix("http://") {
            (Scheme::Http, rest)
        } else if let Some(rest) = base.strip_prefix("https://") {
            (Scheme::Https, rest)
        } else {
            (Scheme::Https, base)
        };

        let (authority, prefix) = match rest.find('/') {
            Some(slash) => rest.split_at(slash),
            None => (rest, ""),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| ProviderError::InvalidEndpoint)?;
                (host, port)
            }
            None => (
                authority,
                match scheme {
                    Scheme::Http => 80,
                    Scheme::Https => 443,
                },
            ),
        };
        if host.is_empty() {
            return Err(ProviderError::InvalidEndpoint);
        }

        Ok(Self {
            scheme,
            host,
            port,
            prefix: prefix.trim_end_matches('/'),
        })
    }

    pub fn route(&self) -> Route {
        match self.scheme {
            Scheme::Http => Route::Plain { port: self.port },
            Scheme::Https => Route::Tls(Peer::Llm),
        }
    }

    /// `<prefix>/chat/completions`.
    pub fn completions_path(&self) -> Result<Text<CFG_CAP>, ProviderError> {
        let mut path = Text::new();
        write!(path, "{}{COMPLETIONS}", self.prefix).map_err(|_| ProviderError::InvalidEndpoint)?;
        Ok(path)
    }
}

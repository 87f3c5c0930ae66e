use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::error::Error as StdError;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use super::Transport;
use crate::config::settings::{AuthSettings, ConnectionSettings};
use crate::error::TransportError;

/// Credentials attached to every request.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub basic: Option<(String, Option<String>)>,
    pub cookie: Option<String>,
}

impl From<&AuthSettings> for Credentials {
    fn from(auth: &AuthSettings) -> Self {
        Self {
            basic: auth
                .username
                .clone()
                .filter(|u| !u.is_empty())
                .map(|user| (user, auth.password.clone())),
            cookie: auth.cookie.clone().filter(|c| !c.is_empty()),
        }
    }
}

/// reqwest-backed [`Transport`].
pub struct HttpTransport {
    client: Client,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(connection: &ConnectionSettings, credentials: Credentials) -> reqwest::Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(connection.accept_invalid_certs)
            .connect_timeout(connection.probe_timeout())
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            credentials,
        })
    }

    /// Sends the request; `deadline` bounds the whole exchange, body included.
    async fn send(
        &self,
        url: &str,
        limit: Duration,
        deadline: Instant,
    ) -> Result<reqwest::Response, TransportError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(limit);
        if let Some((user, password)) = &self.credentials.basic {
            request = request.basic_auth(user, password.as_ref());
        }
        if let Some(cookie) = &self.credentials.cookie {
            request = request.header(COOKIE, cookie);
        }

        match timeout_at(deadline, request.send()).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(classify(url, &e)),
            Err(_) => Err(TransportError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, limit: Duration) -> Result<Value, TransportError> {
        let deadline = Instant::now() + limit;
        let response = self.send(url, limit, deadline).await?;
        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(TransportError::AuthRequired {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(TransportError::HttpError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        match timeout_at(deadline, response.json::<Value>()).await {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(e)) if e.is_timeout() => Err(TransportError::Timeout {
                url: url.to_string(),
            }),
            Ok(Err(e)) => Err(TransportError::InvalidResponse {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(TransportError::Timeout {
                url: url.to_string(),
            }),
        }
    }

    async fn probe(&self, url: &str, limit: Duration) -> Result<u16, TransportError> {
        let response = self.send(url, limit, Instant::now() + limit).await?;
        Ok(response.status().as_u16())
    }
}

/// Maps a reqwest failure onto the transport error classes.
///
/// reqwest does not expose DNS or TLS failures as kinds, so the source chain
/// is inspected.
fn classify(url: &str, err: &reqwest::Error) -> TransportError {
    let url = url.to_string();
    if err.is_timeout() {
        return TransportError::Timeout { url };
    }

    let mut chain = Vec::new();
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    return TransportError::ConnectionRefused { url }
                }
                std::io::ErrorKind::TimedOut => return TransportError::Timeout { url },
                _ => {}
            }
        }
        chain.push(current.to_string());
        source = current.source();
    }
    let message = chain.join(": ");
    let lowered = message.to_lowercase();

    if lowered.contains("dns error")
        || lowered.contains("failed to lookup address")
        || lowered.contains("name or service not known")
        || lowered.contains("no such host")
    {
        TransportError::DnsFailure { url }
    } else if lowered.contains("connection refused") {
        TransportError::ConnectionRefused { url }
    } else if lowered.contains("certificate")
        || lowered.contains("tls")
        || lowered.contains("ssl")
        || lowered.contains("handshake")
        || lowered.contains("corrupt message")
    {
        TransportError::TlsFailure { url, message }
    } else {
        TransportError::Other { url, message }
    }
}

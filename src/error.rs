//! Error taxonomy for a discovery run.
//!
//! Transport failures are classified once, in [`TransportError`]. Stage
//! failures that abort the live path are [`DiscoveryError`]s; per-attribute
//! problems are [`AttributeIssue`]s and never abort a unit.

use serde::Serialize;
use thiserror::Error;

/// Classified failure of a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportError {
    #[error("DNS lookup failed for {url}")]
    DnsFailure { url: String },

    #[error("connection refused by {url}")]
    ConnectionRefused { url: String },

    #[error("TLS handshake failed for {url}: {message}")]
    TlsFailure { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} answered HTTP {status}")]
    HttpError { url: String, status: u16 },

    #[error("{url} requires credentials (HTTP {status})")]
    AuthRequired { url: String, status: u16 },

    #[error("{url} returned a body that is not JSON: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("request to {url} failed: {message}")]
    Other { url: String, message: String },
}

impl TransportError {
    pub fn url(&self) -> &str {
        match self {
            Self::DnsFailure { url }
            | Self::ConnectionRefused { url }
            | Self::TlsFailure { url, .. }
            | Self::Timeout { url }
            | Self::HttpError { url, .. }
            | Self::AuthRequired { url, .. }
            | Self::InvalidResponse { url, .. }
            | Self::Other { url, .. } => url,
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired { .. })
    }
}

/// Which level of the tree a lookup failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundKind {
    Server,
    Database,
    PathSegment,
}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Server => "server",
            Self::Database => "database",
            Self::PathSegment => "path segment",
        };
        f.write_str(label)
    }
}

/// Failure of one probe while resolving the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub candidate: String,
    pub error: TransportError,
}

/// Errors that abort the live path of a run and trigger the synthetic fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveryError {
    #[error("no reachable API endpoint for host {host} ({} candidates tried)", .attempts.len())]
    EndpointUnreachable {
        host: String,
        attempts: Vec<ProbeFailure>,
    },

    #[error("server reachable but {url} rejected the request (HTTP {status})")]
    AuthRequired { url: String, status: u16 },

    #[error("{kind} '{name}' not found; available: [{}]", .available_names.join(", "))]
    NotFound {
        #[serde(rename = "level")]
        kind: NotFoundKind,
        name: String,
        available_names: Vec<String>,
    },

    #[error("path has {segments} segments, more than the limit of {max}")]
    DepthExceeded { segments: usize, max: usize },

    #[error("{error}")]
    Transport { error: TransportError },

    #[error("discovery run cancelled")]
    Cancelled,

    #[error("discovery run exceeded its deadline of {seconds}s")]
    DeadlineExceeded { seconds: u64 },
}

impl From<TransportError> for DiscoveryError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::AuthRequired { url, status } => Self::AuthRequired { url, status },
            error => Self::Transport { error },
        }
    }
}

/// Why a configured attribute has no usable value on a unit.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AttributeIssue {
    #[error("attribute '{display_name}' is not declared on the element")]
    NotDeclared { display_name: String },

    #[error("value is null")]
    NullValue,

    #[error("value '{raw}' is not numeric")]
    ParseFailure { raw: String },

    #[error("value of type {type_name} is not supported")]
    Unsupported { type_name: String },

    #[error("value fetch failed: {error}")]
    FetchFailed { error: TransportError },
}

pub type Result<T, E = DiscoveryError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_required_transport_error_maps_to_distinct_variant() {
        let err: DiscoveryError = TransportError::AuthRequired {
            url: "https://pi/piwebapi/assetservers".into(),
            status: 401,
        }
        .into();
        assert!(matches!(err, DiscoveryError::AuthRequired { status: 401, .. }));

        let err: DiscoveryError = TransportError::Timeout { url: "x".into() }.into();
        assert!(matches!(
            err,
            DiscoveryError::Transport {
                error: TransportError::Timeout { .. }
            }
        ));
    }

    #[test]
    fn not_found_message_lists_available_names() {
        let err = DiscoveryError::NotFound {
            kind: NotFoundKind::PathSegment,
            name: "PadA".into(),
            available_names: vec!["PadB".into(), "PadC".into()],
        };
        assert_eq!(
            err.to_string(),
            "path segment 'PadA' not found; available: [PadB, PadC]"
        );
    }
}

//! Access to the remote asset API.
//!
//! Stages never talk HTTP directly: they go through an [`ApiSession`], which
//! binds an injected [`Transport`] to the base URL resolved for one run.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;

pub mod endpoint;
pub mod models;
pub mod transport;

pub use endpoint::{candidate_urls, EndpointResolver, ResolvedEndpoint};
pub use models::{AssetNode, AttributeDescriptor, AttributeValue, Endpoint, Items, NodeKind};
pub use transport::{Credentials, HttpTransport};

/// One authenticated GET, classified.
///
/// How credentials are negotiated is the implementation's business; callers
/// only see JSON or a [`TransportError`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and parse the body as JSON.
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, TransportError>;

    /// GET `url` and report the status code of whatever answered.
    async fn probe(&self, url: &str, timeout: Duration) -> Result<u16, TransportError>;
}

/// A transport bound to the endpoint resolved for one discovery run.
#[derive(Clone)]
pub struct ApiSession {
    transport: Arc<dyn Transport>,
    base_url: String,
    timeout: Duration,
}

impl ApiSession {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> String {
        match endpoint {
            Endpoint::Relative(path) => format!("{}/{}", self.base_url, path.trim_start_matches('/')),
            Endpoint::Link(link) => link.clone(),
        }
    }

    pub async fn get(&self, endpoint: &Endpoint) -> Result<Value, TransportError> {
        let url = self.url_for(endpoint);
        self.transport.get_json(&url, self.timeout).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, TransportError> {
        let url = self.url_for(endpoint);
        let body = self.transport.get_json(&url, self.timeout).await?;
        serde_json::from_value(body).map_err(|e| TransportError::InvalidResponse {
            url,
            message: e.to_string(),
        })
    }

    /// GET a collection and return its `Items`.
    pub async fn list<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<Vec<T>, TransportError> {
        let items: Items<T> = self.get_as(endpoint).await?;
        Ok(items.items)
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn session_joins_relative_paths_and_passes_links_through() {
        let transport = MockTransport::new()
            .json("https://pi/piwebapi/assetservers", json!({"Items": []}))
            .json("https://other/value", json!({"Value": 1}));
        let session = ApiSession::new(Arc::new(transport), "https://pi/piwebapi/", Duration::from_secs(1));

        let items: Vec<Value> = session
            .list(&Endpoint::Relative("/assetservers".into()))
            .await
            .unwrap();
        assert!(items.is_empty());

        let value = session.get(&Endpoint::Link("https://other/value".into())).await.unwrap();
        assert_eq!(value["Value"], 1);
    }

    #[tokio::test]
    async fn malformed_collection_is_invalid_response() {
        let transport = MockTransport::new().json("https://pi/piwebapi/x", json!({"Items": 5}));
        let session = ApiSession::new(Arc::new(transport), "https://pi/piwebapi", Duration::from_secs(1));
        let err = session
            .list::<Value>(&Endpoint::Relative("x".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidResponse { .. }));
    }
}

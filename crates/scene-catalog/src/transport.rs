//! How search requests reach the catalog.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::CatalogError;
use crate::stac::{StacItemCollection, StacSearchRequest};

/// One search round-trip. Implementations do not retry.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn search(&self, request: &StacSearchRequest) -> Result<StacItemCollection, CatalogError>;
}

/// HTTP transport posting to `{endpoint}/search`.
pub struct ReqwestTransport {
    client: Client,
    search_url: String,
}

impl ReqwestTransport {
    pub fn new(endpoint: &str) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("bloom-worker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            search_url: search_url(endpoint),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

fn search_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.ends_with("/search") {
        base.to_string()
    } else {
        format!("{}/search", base)
    }
}

#[async_trait]
impl CatalogTransport for ReqwestTransport {
    async fn search(&self, request: &StacSearchRequest) -> Result<StacItemCollection, CatalogError> {
        let response = self
            .client
            .post(&self.search_url)
            .json(request)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        debug!(size = bytes.len(), "Search response received");

        serde_json::from_slice(&bytes).map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

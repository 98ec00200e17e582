//! Lookup source API client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use upcvault_core::{ProductKey, RawPayload, SourceError, VaultContext};

/// Trait seam for the external lookup API.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the raw multi-item payload for a key.
    ///
    /// # Errors
    ///
    /// - [`SourceError::NoResults`] when the `items` array is missing or
    ///   empty - the NotFound condition
    /// - [`SourceError::Unavailable`] on non-success status
    /// - [`SourceError::Transport`] on network failures and timeouts
    async fn fetch(&self, key: &ProductKey) -> Result<RawPayload, SourceError>;
}

/// HTTP implementation: one GET with the key as a query parameter. The
/// timeout is attached to every request.
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpSourceFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_context(ctx: &VaultContext) -> Self {
        Self::new(ctx.source_endpoint.clone(), ctx.fetch_timeout)
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, key: &ProductKey) -> Result<RawPayload, SourceError> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .query(&[("upc", key.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SourceError::Unavailable {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = response.json().await.map_err(|e| SourceError::Transport {
            reason: format!("Failed to parse response: {}", e),
        })?;
        let payload = RawPayload::new(value);
        if !payload.has_items() || payload.items().is_empty() {
            return Err(SourceError::NoResults {
                key: key.to_string(),
            });
        }
        Ok(payload)
    }
}

// =============================================================================
// TESTS
// =============================================================================

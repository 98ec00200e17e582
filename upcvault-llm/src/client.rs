//! HTTP client for the chat-completions endpoint.

use crate::types::{ChatMessage, ChatRequest, ChatResponse};
use reqwest::Client;
use std::time::Duration;
use upcvault_core::CleanupError;

/// Completion endpoint client with an explicit per-request timeout.
///
/// An unbounded hang here would stall the whole lookup, so the timeout
/// is attached to every request rather than left to the transport.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl CompletionClient {
    /// Create a client for `base_url` (e.g. `http://localhost:1234/v1`).
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            timeout,
        }
    }

    /// Model name sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Timeout attached to each request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send messages and return the reply content.
    ///
    /// # Errors
    ///
    /// - [`CleanupError::Transport`] on connect/timeout failures
    /// - [`CleanupError::RequestFailed`] on non-success status
    /// - [`CleanupError::InvalidResponse`] when `choices[0].message.content`
    ///   is absent or empty
    pub async fn send(&self, messages: Vec<ChatMessage>) -> Result<String, CleanupError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| CleanupError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CleanupError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| CleanupError::InvalidResponse {
                    reason: format!("Failed to parse response: {}", e),
                })?;

        parsed
            .content()
            .ok_or_else(|| CleanupError::InvalidResponse {
                reason: "missing choices[0].message.content".to_string(),
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================

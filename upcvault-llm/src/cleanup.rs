//! The cleanup service: prompt construction, degradation policy.

use crate::client::CompletionClient;
use crate::types::ChatMessage;
use crate::{parse, similarity, CleanedFields, TextCleanup};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;
use upcvault_core::{CleanupError, VaultContext};

const FIX_TEXT_PROMPT: &str = "Correct grammar, spelling, casing - convert uppercase \
to mixed case, uppercase the first letter of each sentence, and fix punctuation \
spacing for the following sentence.\nReturn only the corrected text as plain text, \
with no JSON, no Markdown, and no extra formatting.";

const NORMALIZE_PROMPT: &str = "Rewrite the following product title and description \
in sentence case, fixing casing and punctuation without changing meaning.\nReply \
with a JSON object containing exactly the keys \"title\" and \"description\", and \
no other text.";

/// Text cleanup backed by a chat-completions endpoint.
///
/// Both trait operations degrade on every failure path; the only method
/// that surfaces errors is [`CleanupService::complete`], used by the
/// response-generation flow where the caller wants to know.
#[derive(Debug, Clone)]
pub struct CleanupService {
    client: CompletionClient,
}

impl CleanupService {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Build from the runtime context.
    pub fn from_context(ctx: &VaultContext) -> Self {
        Self::new(CompletionClient::new(
            ctx.cleanup_endpoint.clone(),
            ctx.cleanup_model.clone(),
            ctx.cleanup_timeout,
        ))
    }

    /// Convenience constructor for a bare endpoint.
    pub fn with_endpoint(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self::new(CompletionClient::new(base_url, model, timeout))
    }

    /// Send an already-prepared prompt and return the raw completion.
    ///
    /// # Errors
    ///
    /// Propagates the underlying [`CleanupError`]; unlike the cleanup
    /// operations this path does NOT degrade.
    pub async fn complete(&self, prepared: &str) -> Result<String, CleanupError> {
        self.client
            .send(vec![
                ChatMessage::system("You are a helpful assistant."),
                ChatMessage::user(prepared),
            ])
            .await
    }
}

#[async_trait]
impl TextCleanup for CleanupService {
    async fn fix_text(&self, text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        let prompt = format!("{FIX_TEXT_PROMPT}\n\n{trimmed}");
        match self.client.send(vec![ChatMessage::user(prompt)]).await {
            Ok(reply) => {
                let cleaned = parse::strip_fences(&reply);
                if cleaned.is_empty() {
                    trimmed.to_string()
                } else {
                    cleaned
                }
            }
            Err(err) => {
                warn!(error = %err, "fix_text degraded to original input");
                trimmed.to_string()
            }
        }
    }

    async fn normalize_fields(&self, title: &str, description: &str) -> CleanedFields {
        let prompt = format!(
            "{NORMALIZE_PROMPT}\n\nTitle: {title}\nDescription: {description}"
        );
        let candidates = match self.client.send(vec![ChatMessage::user(prompt)]).await {
            Ok(reply) => {
                let parsed = parse::parse_fields(&reply);
                if parsed.is_none() {
                    warn!("cleanup reply unparsable, using heuristics");
                }
                parsed
            }
            Err(err) => {
                warn!(error = %err, "cleanup call failed, using heuristics");
                None
            }
        };
        fill_missing(candidates, title, description)
    }
}

/// Fill fields the reply left out with the heuristic form of the
/// original inputs, then reconcile. A reply that omits the title yields
/// the heuristic title, not an empty one.
fn fill_missing(
    candidates: Option<(Option<String>, Option<String>)>,
    title: &str,
    description: &str,
) -> CleanedFields {
    let (heuristic_title, heuristic_description) =
        parse::heuristic_fields(title, description);
    let (parsed_title, parsed_description) = candidates.unwrap_or((None, None));
    similarity::reconcile(
        parsed_title.or(heuristic_title),
        parsed_description.or(heuristic_description),
    )
}

// =============================================================================
// TESTS
// =============================================================================

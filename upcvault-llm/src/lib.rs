//! upcvault LLM - Text Cleanup Service
//!
//! Sends product text fields to a chat-style completion endpoint and
//! defensively parses the reply. The endpoint is untrusted: replies may be
//! fenced, prefixed with chatter, half-JSON, or nonsense, so extraction
//! runs as an ordered chain of parse attempts with a pure heuristic at the
//! end (see [`parse`]).
//!
//! Every public cleanup operation degrades instead of failing - a network
//! error, a timeout, or a garbage reply yields the original or
//! heuristically corrected text, never an error to the enclosing lookup.

use async_trait::async_trait;

pub mod client;
pub mod cleanup;
pub mod parse;
pub mod similarity;
pub mod types;

pub use client::CompletionClient;
pub use cleanup::CleanupService;
pub use types::{ChatMessage, ChatRequest, ChatResponse};

/// Corrected title/description pair after reconciliation.
///
/// `title_dropped` distinguishes the similarity rule (the title
/// near-duplicated the description and must be removed) from a reply
/// that simply produced no title (the caller keeps what it had).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CleanedFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub title_dropped: bool,
}

/// Trait seam for the cleanup service so the lookup pipeline can run
/// against a mock in tests.
///
/// Implementations must be thread-safe (Send + Sync) and must never fail:
/// both operations return best-effort text, not results.
#[async_trait]
pub trait TextCleanup: Send + Sync {
    /// Correct grammar/casing of one text field. Returns the input
    /// unchanged on any service failure or empty reply.
    async fn fix_text(&self, text: &str) -> String;

    /// Correct title and description in one structured request, then
    /// reconcile near-duplicates (see [`similarity`]).
    async fn normalize_fields(&self, title: &str, description: &str) -> CleanedFields;
}

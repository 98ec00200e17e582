//! upcvault Events - Change Notification
//!
//! In-process publish point for cache mutations. Downstream consumers
//! (a UI shell, an event-transport bridge) subscribe at wiring time and
//! receive add/delete/change notifications.
//!
//! ## Delivery contract
//!
//! - Dispatch is best-effort: no receivers is not an error, a lagging or
//!   dropped receiver never affects other subscribers or the sender.
//! - No persistence or replay: a late subscriber receives nothing
//!   retroactively.
//! - Unsubscribing is dropping the receiver.
//!
//! Built on a tokio broadcast channel so a misbehaving subscriber is
//! isolated by construction - there is no subscriber code running on the
//! emitting task.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use upcvault_core::CacheSummary;

/// Default buffer capacity per subscriber.
const DEFAULT_CAPACITY: usize = 256;

/// A cache change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum VaultEvent {
    /// An entry became available (fresh lookup or cache hit).
    EntryAdded { summary: CacheSummary },
    /// An entry and its dependent files were removed.
    EntryDeleted { key: String },
    /// The prompt-template directory changed.
    PromptsChanged,
    /// The response directory changed for a key (`None` = bulk change).
    ResponsesChanged { key: Option<String> },
}

impl VaultEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VaultEvent::EntryAdded { .. } => "entry-added",
            VaultEvent::EntryDeleted { .. } => "entry-deleted",
            VaultEvent::PromptsChanged => "prompts-changed",
            VaultEvent::ResponsesChanged { .. } => "responses-changed",
        }
    }
}

/// Publish point for [`VaultEvent`]s.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<VaultEvent>,
}

impl Notifier {
    /// Notifier with the given per-subscriber buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event to all current subscribers. Non-blocking; dropped
    /// when nobody is listening.
    pub fn emit(&self, event: VaultEvent) {
        let kind = event.kind();
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(event = kind, receivers, "dispatched event");
            }
            Err(_) => {
                debug!(event = kind, "no subscribers for event");
            }
        }
    }

    /// Subscribe to future events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! upcvault Normalize - Payload Merge
//!
//! Merges the ordered items of a raw lookup payload into one flat
//! [`CanonicalRecord`](upcvault_core::CanonicalRecord), and flattens legacy
//! wrapped documents on read.
//!
//! # Merge semantics
//!
//! The merge is first-non-empty-wins per field across items in source
//! order: later items never overwrite an already-set field. The one
//! exception is `images`, which unions across all items. Changing item
//! order changes which source wins ties, so item order is preserved
//! exactly as received - there is deliberately no source-quality scoring.

pub mod merge;
pub mod migrate;

pub use merge::normalize;
pub use migrate::{flatten_legacy, is_legacy};

//! Legacy document migration.
//!
//! Early documents wrapped their content as `{ upc, raw, product }`. On
//! read those are flattened through the normalizer and rewritten in flat
//! form by the store. Migration is value-preserving: the canonical content
//! the old reader would have shown (the `product` sub-object when present,
//! the raw payload otherwise) is what the flat record carries.

use crate::merge::normalize;
use serde_json::Value;
use upcvault_core::{CanonicalRecord, ProductKey, RawPayload};

/// Whether a stored document still uses the legacy wrapper shape.
pub fn is_legacy(doc: &Value) -> bool {
    doc.get("raw").is_some() || doc.get("product").is_some()
}

/// Flatten a legacy wrapped document into a canonical record.
///
/// Returns `None` when the document has no usable `product` or `raw`
/// sub-object, which the store reports as a corrupt entry.
pub fn flatten_legacy(doc: &Value, key: &ProductKey) -> Option<CanonicalRecord> {
    let inner = match (doc.get("product"), doc.get("raw")) {
        (Some(product), _) if product.is_object() => product,
        (_, Some(raw)) if raw.is_object() => raw,
        _ => return None,
    };
    Some(normalize(&RawPayload::new(inner.clone()), key))
}

// =============================================================================
// TESTS
// =============================================================================

//! Canonical record types.
//!
//! A [`CanonicalRecord`] is the flat, per-key document the cache persists:
//! one value per field, insertion order preserved, no empty values. The
//! variant type [`FieldValue`] covers everything a source item can
//! contribute after flattening: text, numbers, flags, and string lists.

use crate::key::ProductKey;
use crate::Timestamp;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Well-known canonical field names.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const BRAND: &str = "brand";
    pub const MODEL: &str = "model";
    pub const DESCRIPTION: &str = "description";
    pub const COLOR: &str = "color";
    pub const SIZE: &str = "size";
    pub const DIMENSIONS: &str = "dimensions";
    pub const WEIGHT: &str = "weight";
    pub const CATEGORY: &str = "category";
    pub const IMAGES: &str = "images";
    pub const CURRENCY: &str = "currency";
    pub const LOWEST_PRICE: &str = "lowest_price";
    pub const HIGHEST_PRICE: &str = "highest_price";
    pub const UPC: &str = "upc";
}

// =============================================================================
// FIELD VALUE
// =============================================================================

/// One canonical field value.
///
/// Serializes untagged so persisted documents stay plain JSON. Variant
/// order matters for deserialization: bool before number before string
/// before list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Convert a loose JSON value into a field value.
    ///
    /// Returns `None` for nulls, objects, and arrays containing anything
    /// other than strings - those never enter a canonical record.
    pub fn from_json(value: &Value) -> Option<FieldValue> {
        match value {
            Value::Bool(b) => Some(FieldValue::Flag(*b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        _ => return None,
                    }
                }
                Some(FieldValue::List(out))
            }
            Value::Null | Value::Object(_) => None,
        }
    }

    /// Whether this value would be stripped from a final record.
    ///
    /// Empty for blank text and for lists whose every element is blank.
    /// Numbers and flags are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
            FieldValue::Number(_) | FieldValue::Flag(_) => false,
        }
    }

    /// Borrow as text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as a string list, if this is a list value.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric view, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

// =============================================================================
// CANONICAL RECORD
// =============================================================================

/// Flat field -> value mapping persisted per key.
///
/// Insertion order is preserved, so documents round-trip in the order the
/// merge produced them. The map itself enforces the one-value-per-field
/// invariant; the strip pass and image dedup are applied by the normalizer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord {
    fields: IndexMap<String, FieldValue>,
}

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text content of a field, if present and textual.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_text)
    }

    /// Numeric content of a field, if present and numeric.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(FieldValue::as_number)
    }

    /// Insert or overwrite a field.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// First-wins insert: sets the field only when not already present
    /// and the value is non-empty. Returns whether the value was taken.
    pub fn set_if_absent(&mut self, name: &str, value: FieldValue) -> bool {
        if self.fields.contains_key(name) || value.is_empty() {
            return false;
        }
        self.fields.insert(name.to_string(), value);
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    /// The deduplicated image URL list, if any.
    pub fn images(&self) -> Option<&[String]> {
        self.fields.get(fields::IMAGES).and_then(FieldValue::as_list)
    }

    /// Drop every field whose value is empty per [`FieldValue::is_empty`].
    pub fn strip_empty(&mut self) {
        self.fields.retain(|_, value| !value.is_empty());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

// =============================================================================
// LISTING AND LOOKUP VIEWS
// =============================================================================

/// Lightweight listing row for one cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSummary {
    pub key: String,
    pub title: String,
    pub brand: String,
    pub model: String,
    pub lowest_price: Option<f64>,
    pub highest_price: Option<f64>,
    pub currency: String,
    /// Resolved local image path; `None` means the placeholder applies.
    pub image: Option<PathBuf>,
    pub modified: Timestamp,
}

impl CacheSummary {
    /// Project a record into its listing row. A record with no title falls
    /// back to the key so listings never show a blank row.
    pub fn from_record(
        key: &ProductKey,
        record: &CanonicalRecord,
        image: Option<PathBuf>,
        modified: Timestamp,
    ) -> Self {
        let text_or_empty =
            |name: &str| record.text(name).unwrap_or_default().to_string();
        Self {
            key: key.to_string(),
            title: record
                .text(fields::TITLE)
                .unwrap_or(key.as_str())
                .to_string(),
            brand: text_or_empty(fields::BRAND),
            model: text_or_empty(fields::MODEL),
            lowest_price: record.number(fields::LOWEST_PRICE),
            highest_price: record.number(fields::HIGHEST_PRICE),
            currency: text_or_empty(fields::CURRENCY),
            image,
            modified,
        }
    }
}

/// Result of a full lookup: the record plus resolved local assets.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupOutcome {
    pub key: ProductKey,
    pub record: CanonicalRecord,
    /// Primary local image, or `None` when only the placeholder applies.
    pub image: Option<PathBuf>,
    /// Every validated local image for the key, in numbered order.
    pub gallery: Vec<PathBuf>,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value_from_json_variants() {
        assert_eq!(
            FieldValue::from_json(&json!("hello")),
            Some(FieldValue::Text("hello".into()))
        );
        assert_eq!(
            FieldValue::from_json(&json!(12.5)),
            Some(FieldValue::Number(12.5))
        );
        assert_eq!(
            FieldValue::from_json(&json!(true)),
            Some(FieldValue::Flag(true))
        );
        assert_eq!(
            FieldValue::from_json(&json!(["a", "b"])),
            Some(FieldValue::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_field_value_from_json_rejects_non_scalar() {
        assert_eq!(FieldValue::from_json(&json!(null)), None);
        assert_eq!(FieldValue::from_json(&json!({"a": 1})), None);
        // mixed arrays never enter a record
        assert_eq!(FieldValue::from_json(&json!(["a", 1])), None);
    }

    #[test]
    fn test_field_value_emptiness() {
        assert!(FieldValue::Text("".into()).is_empty());
        assert!(FieldValue::Text("   ".into()).is_empty());
        assert!(FieldValue::List(vec![]).is_empty());
        assert!(FieldValue::List(vec!["".into(), " ".into()]).is_empty());
        assert!(!FieldValue::Text("x".into()).is_empty());
        assert!(!FieldValue::List(vec!["".into(), "x".into()]).is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
        assert!(!FieldValue::Flag(false).is_empty());
    }

    #[test]
    fn test_set_if_absent_first_wins() {
        let mut record = CanonicalRecord::new();
        assert!(record.set_if_absent(fields::TITLE, "A".into()));
        assert!(!record.set_if_absent(fields::TITLE, "B".into()));
        assert_eq!(record.text(fields::TITLE), Some("A"));
    }

    #[test]
    fn test_set_if_absent_skips_empty() {
        let mut record = CanonicalRecord::new();
        assert!(!record.set_if_absent(fields::COLOR, "".into()));
        assert!(!record.contains(fields::COLOR));
    }

    #[test]
    fn test_strip_empty_removes_blank_fields() {
        let mut record = CanonicalRecord::new();
        record.insert(fields::COLOR, "".into());
        record.insert(fields::IMAGES, FieldValue::List(vec![]));
        record.insert(fields::TITLE, "Widget".into());
        record.strip_empty();
        assert!(!record.contains(fields::COLOR));
        assert!(!record.contains(fields::IMAGES));
        assert_eq!(record.text(fields::TITLE), Some("Widget"));
    }

    #[test]
    fn test_record_serializes_flat() {
        let mut record = CanonicalRecord::new();
        record.insert(fields::TITLE, "Widget".into());
        record.insert(fields::LOWEST_PRICE, FieldValue::Number(9.99));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, json!({"title": "Widget", "lowest_price": 9.99}));
    }

    #[test]
    fn test_record_roundtrip_preserves_order() {
        let doc = json!({"title": "W", "brand": "B", "images": ["u1"]});
        let record: CanonicalRecord = serde_json::from_value(doc).unwrap();
        let names: Vec<_> = record.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["title", "brand", "images"]);
    }

    #[test]
    fn test_summary_falls_back_to_key_title() {
        let key = ProductKey::parse("123456").unwrap();
        let record = CanonicalRecord::new();
        let summary =
            CacheSummary::from_record(&key, &record, None, chrono::Utc::now());
        assert_eq!(summary.title, "123456");
        assert_eq!(summary.brand, "");
    }
}

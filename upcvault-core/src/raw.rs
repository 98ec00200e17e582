//! Loosely-typed source payloads.
//!
//! The lookup API returns an unversioned, loosely-structured document.
//! [`RawPayload`] wraps it without assuming a schema: every accessor is
//! optional-returning and type-checked, so a missing or oddly-typed field
//! reads as absent rather than failing the lookup.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The unprocessed multi-item document returned by the lookup API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(Value);

impl RawPayload {
    pub fn new(value: Value) -> Self {
        RawPayload(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The ordered item list.
    ///
    /// Non-object entries in the `items` array are skipped. A payload that
    /// is itself a bare object (no `items` wrapper) reads as a single item,
    /// matching how legacy documents stored a lone result.
    pub fn items(&self) -> Vec<RawItem<'_>> {
        match self.0.get("items").and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(Value::as_object)
                .map(RawItem)
                .collect(),
            None => self.0.as_object().map(RawItem).into_iter().collect(),
        }
    }

    /// Whether the payload carries an `items` wrapper at all.
    pub fn has_items(&self) -> bool {
        matches!(self.0.get("items"), Some(Value::Array(_)))
    }
}

/// One item inside a raw payload: a name -> loose-value mapping.
#[derive(Debug, Clone, Copy)]
pub struct RawItem<'a>(&'a Map<String, Value>);

impl<'a> RawItem<'a> {
    pub fn new(fields: &'a Map<String, Value>) -> Self {
        RawItem(fields)
    }

    /// Raw JSON value of a field.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.0.get(name)
    }

    /// Non-blank text content of a field.
    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Numeric content of a field.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    /// String-array content of a field; non-string elements are skipped.
    pub fn string_list(&self, name: &str) -> Option<Vec<String>> {
        let items = self.0.get(name)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )
    }

    /// Iterate over every field name and value on the item.
    pub fn entries(&self) -> impl Iterator<Item = (&'a String, &'a Value)> {
        self.0.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================

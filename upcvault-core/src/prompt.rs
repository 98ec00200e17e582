//! Prompt template and response record types.

use crate::record::{fields, CanonicalRecord};
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A named prompt template loaded from the prompts directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub content: String,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Substitute `{title}` `{brand}` `{category}` `{description}`
    /// placeholders from a record. Missing fields substitute as empty.
    pub fn render(&self, record: &CanonicalRecord) -> String {
        let mut text = self.content.clone();
        for (placeholder, field) in [
            ("{title}", fields::TITLE),
            ("{brand}", fields::BRAND),
            ("{category}", fields::CATEGORY),
            ("{description}", fields::DESCRIPTION),
        ] {
            let value = record.text(field).unwrap_or_default();
            text = text.replace(placeholder, value);
        }
        text
    }
}

/// One saved completion response, parsed from
/// `{key}_{template}_{seq:03}.txt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Key portion of the filename. Kept as a plain string so that files
    /// predating key validation still list.
    pub key: String,
    pub template: String,
    pub sequence: u32,
    pub content: String,
    pub modified: Timestamp,
    pub path: PathBuf,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;

    #[test]
    fn test_render_substitutes_fields() {
        let mut record = CanonicalRecord::new();
        record.insert(fields::TITLE, "Widget".into());
        record.insert(fields::BRAND, "Acme".into());
        let template = PromptTemplate::new("pitch", "Sell {title} by {brand}.");
        assert_eq!(template.render(&record), "Sell Widget by Acme.");
    }

    #[test]
    fn test_render_missing_fields_are_empty() {
        let record = CanonicalRecord::new();
        let template = PromptTemplate::new("pitch", "[{category}]");
        assert_eq!(template.render(&record), "[]");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        let mut record = CanonicalRecord::new();
        record.insert(fields::TITLE, FieldValue::Text("X".into()));
        let template = PromptTemplate::new("echo", "{title} {title}");
        assert_eq!(template.render(&record), "X X");
    }
}

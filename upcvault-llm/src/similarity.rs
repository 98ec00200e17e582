//! Title/description similarity reconciliation.
//!
//! Sources frequently ship a description that is the title with different
//! casing or minor punctuation. Storing both wastes the field and reads
//! badly downstream, so after cleanup the pair is compared on a normalized
//! form: if one contains the other or their token sets overlap heavily,
//! the title is dropped and only the description survives.

use crate::CleanedFields;
use std::collections::HashSet;

/// Jaccard threshold above which the pair counts as near-duplicate.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Lowercase, strip non-alphanumerics, collapse whitespace.
pub fn normalize_for_compare(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped
        .split_whitespace()
        .map(|token| token.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Token-set Jaccard similarity of the normalized forms.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}

/// Whether title and description are near-duplicates.
pub fn near_duplicate(title: &str, description: &str) -> bool {
    let a = normalize_for_compare(title);
    let b = normalize_for_compare(description);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a) || jaccard(&a, &b) >= SIMILARITY_THRESHOLD
}

/// Apply the reconciliation rule to a candidate pair. A dropped title
/// is flagged so callers can tell it apart from a missing one.
pub fn reconcile(title: Option<String>, description: Option<String>) -> CleanedFields {
    let title = title.filter(|t| !t.trim().is_empty());
    let description = description.filter(|d| !d.trim().is_empty());
    match (&title, &description) {
        (Some(t), Some(d)) if near_duplicate(t, d) => CleanedFields {
            title: None,
            description,
            title_dropped: true,
        },
        _ => CleanedFields {
            title,
            description,
            title_dropped: false,
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================

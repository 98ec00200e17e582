//! Defensive parsing of cleanup replies.
//!
//! The reply is untrusted output. Extraction runs as an ordered chain,
//! each stage independently testable:
//!
//! 1. strip markdown fences, then direct JSON parse
//! 2. largest `{...}` substring, JSON parse
//! 3. regex extraction of `"title": "..."` / `Title: ...` patterns
//! 4. pure heuristics applied to the ORIGINAL inputs (sentence-case the
//!    first letter, collapse whitespace)
//!
//! Stages 1-3 operate on the reply; stage 4 ignores the reply entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*```[a-zA-Z0-9_-]*[ \t]*\r?\n?").unwrap());
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?```\s*$").unwrap());

static QUOTED_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"title"\s*:\s*"([^"]*)""#).unwrap());
static QUOTED_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"description"\s*:\s*"([^"]*)""#).unwrap());
static LABELED_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*title\s*[:\-]\s*(.+)$").unwrap());
static LABELED_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*description\s*[:\-]\s*(.+)$").unwrap());

/// Remove a surrounding markdown code fence, if any.
pub fn strip_fences(reply: &str) -> String {
    let opened = FENCE_OPEN.replace(reply.trim(), "");
    FENCE_CLOSE.replace(&opened, "").trim().to_string()
}

/// Run stages 1-3 against a reply.
///
/// Returns `None` when no stage produced at least one non-empty field;
/// the caller then falls back to [`heuristic_fields`].
pub fn parse_fields(reply: &str) -> Option<(Option<String>, Option<String>)> {
    let stripped = strip_fences(reply);
    direct_json(&stripped)
        .or_else(|| embedded_json(&stripped))
        .or_else(|| regex_extract(&stripped))
}

/// Stage 1: the whole (fence-stripped) reply is a JSON object.
pub fn direct_json(reply: &str) -> Option<(Option<String>, Option<String>)> {
    let value: Value = serde_json::from_str(reply).ok()?;
    fields_from_object(&value)
}

/// Stage 2: the largest substring shaped like a JSON object.
pub fn embedded_json(reply: &str) -> Option<(Option<String>, Option<String>)> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: Value = serde_json::from_str(&reply[start..=end]).ok()?;
    fields_from_object(&value)
}

/// Stage 3: regex extraction of key/value patterns.
pub fn regex_extract(reply: &str) -> Option<(Option<String>, Option<String>)> {
    let pick = |quoted: &Regex, labeled: &Regex| -> Option<String> {
        quoted
            .captures(reply)
            .or_else(|| labeled.captures(reply))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let title = pick(&QUOTED_TITLE, &LABELED_TITLE);
    let description = pick(&QUOTED_DESCRIPTION, &LABELED_DESCRIPTION);
    if title.is_none() && description.is_none() {
        None
    } else {
        Some((title, description))
    }
}

/// Stage 4: pure heuristics on the original inputs.
pub fn heuristic_fields(title: &str, description: &str) -> (Option<String>, Option<String>) {
    let clean = |text: &str| {
        let cased = sentence_case(text);
        if cased.is_empty() {
            None
        } else {
            Some(cased)
        }
    };
    (clean(title), clean(description))
}

/// Collapse whitespace and sentence-case the first letter. An all-caps
/// input is lowered first so SHOUTING SOURCE DATA comes out readable.
pub fn sentence_case(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return collapsed;
    }
    let has_lower = collapsed.chars().any(char::is_lowercase);
    let body = if has_lower {
        collapsed
    } else {
        collapsed.to_lowercase()
    };
    let mut chars = body.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => body,
    }
}

/// Pull non-empty `title`/`description` strings out of a JSON object,
/// matching keys case-insensitively.
fn fields_from_object(value: &Value) -> Option<(Option<String>, Option<String>)> {
    let object = value.as_object()?;
    let lookup = |wanted: &str| -> Option<String> {
        object
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .and_then(|(_, v)| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let title = lookup("title");
    let description = lookup("description");
    if title.is_none() && description.is_none() {
        None
    } else {
        Some((title, description))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_plain_text_untouched() {
        assert_eq!(strip_fences("hello world"), "hello world");
    }

    #[test]
    fn test_strip_fences_removes_json_fence() {
        let fenced = "```json\n{\"title\": \"A\"}\n```";
        assert_eq!(strip_fences(fenced), "{\"title\": \"A\"}");
    }

    #[test]
    fn test_strip_fences_bare_fence() {
        assert_eq!(strip_fences("```\ntext\n```"), "text");
    }

    #[test]
    fn test_direct_json_parses_object() {
        let (title, description) =
            direct_json(r#"{"title": "Widget", "description": "A widget."}"#).unwrap();
        assert_eq!(title.as_deref(), Some("Widget"));
        assert_eq!(description.as_deref(), Some("A widget."));
    }

    #[test]
    fn test_direct_json_case_insensitive_keys() {
        let (title, _) = direct_json(r#"{"Title": "Widget"}"#).unwrap();
        assert_eq!(title.as_deref(), Some("Widget"));
    }

    #[test]
    fn test_direct_json_rejects_irrelevant_object() {
        assert!(direct_json(r#"{"status": "ok"}"#).is_none());
        assert!(direct_json("not json").is_none());
    }

    #[test]
    fn test_embedded_json_finds_object_in_chatter() {
        let reply = r#"Sure! Here is your JSON: {"title": "Widget", "description": "Nice."} Hope that helps."#;
        let (title, description) = embedded_json(reply).unwrap();
        assert_eq!(title.as_deref(), Some("Widget"));
        assert_eq!(description.as_deref(), Some("Nice."));
    }

    #[test]
    fn test_regex_extract_quoted_pair() {
        // half-JSON without braces, so stages 1-2 cannot apply
        let reply = r#"The fields are "title": "Widget" and "description": "Nice one"."#;
        let (title, description) = regex_extract(reply).unwrap();
        assert_eq!(title.as_deref(), Some("Widget"));
        assert_eq!(description.as_deref(), Some("Nice one"));
    }

    #[test]
    fn test_regex_extract_labeled_lines() {
        let reply = "Title: Red Widget\nDescription: A fine red widget";
        let (title, description) = regex_extract(reply).unwrap();
        assert_eq!(title.as_deref(), Some("Red Widget"));
        assert_eq!(description.as_deref(), Some("A fine red widget"));
    }

    #[test]
    fn test_parse_fields_chain_order() {
        // fenced JSON goes through stage 1
        let fenced = "```json\n{\"description\": \"Clean.\"}\n```";
        assert_eq!(
            parse_fields(fenced),
            Some((None, Some("Clean.".to_string())))
        );
        // chatter around JSON falls to stage 2
        let chatty = "Here you go: {\"title\": \"T\"} thanks";
        assert_eq!(parse_fields(chatty), Some((Some("T".to_string()), None)));
        // no JSON at all falls to stage 3
        let labeled = "Title - Widget";
        assert_eq!(
            parse_fields(labeled),
            Some((Some("Widget".to_string()), None))
        );
        // nothing extractable at all
        assert_eq!(parse_fields("I cannot help with that."), None);
    }

    #[test]
    fn test_sentence_case_basics() {
        assert_eq!(sentence_case("red widget"), "Red widget");
        assert_eq!(sentence_case("  spaced   out  "), "Spaced out");
        assert_eq!(sentence_case(""), "");
    }

    #[test]
    fn test_sentence_case_lowers_all_caps() {
        assert_eq!(sentence_case("RED WIDGET DELUXE"), "Red widget deluxe");
        // mixed case is preserved beyond the first letter
        assert_eq!(sentence_case("iPhone charger"), "IPhone charger");
    }

    #[test]
    fn test_heuristic_fields_drops_blank() {
        let (title, description) = heuristic_fields("  ", "red widget");
        assert_eq!(title, None);
        assert_eq!(description.as_deref(), Some("Red widget"));
    }
}

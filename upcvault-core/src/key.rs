//! Validated product key.
//!
//! A [`ProductKey`] is the numeric identifier (UPC/EAN, 6-14 digits) that
//! addresses exactly one cache entry. The only way to obtain one is through
//! [`ProductKey::parse`], so every key held anywhere in the system has
//! already passed validation and no I/O path needs to re-check it.

use crate::error::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum number of digits in a valid key.
pub const MIN_KEY_LEN: usize = 6;
/// Maximum number of digits in a valid key.
pub const MAX_KEY_LEN: usize = 14;

/// Validated numeric product identifier (6-14 ASCII digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductKey(String);

impl ProductKey {
    /// Parse and validate a candidate key.
    ///
    /// Surrounding whitespace is tolerated; everything between must be
    /// 6-14 ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BadKey`] for anything else. No I/O is
    /// attempted on a malformed key.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let digits = trimmed.len() >= MIN_KEY_LEN
            && trimmed.len() <= MAX_KEY_LEN
            && trimmed.bytes().all(|b| b.is_ascii_digit());
        if digits {
            Ok(ProductKey(trimmed.to_string()))
        } else {
            Err(ValidationError::BadKey {
                input: input.to_string(),
            })
        }
    }

    /// The digit string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProductKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductKey::parse(s)
    }
}

impl AsRef<str> for ProductKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ProductKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ProductKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_valid_lengths() {
        assert!(ProductKey::parse("123456").is_ok());
        assert!(ProductKey::parse("012345678901").is_ok());
        assert!(ProductKey::parse("12345678901234").is_ok());
    }

    #[test]
    fn test_parse_rejects_short_and_long() {
        assert!(ProductKey::parse("12345").is_err());
        assert!(ProductKey::parse("123456789012345").is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(ProductKey::parse("abcdef").is_err());
        assert!(ProductKey::parse("12345a").is_err());
        assert!(ProductKey::parse("").is_err());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let key = ProductKey::parse(" 123456 ").unwrap();
        assert_eq!(key.as_str(), "123456");
    }

    #[test]
    fn test_display_is_digit_string() {
        let key = ProductKey::parse("0123456789").unwrap();
        assert_eq!(key.to_string(), "0123456789");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<ProductKey, _> = serde_json::from_str("\"123456\"");
        assert!(ok.is_ok());
        let bad: Result<ProductKey, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}

//! Error types for upcvault operations.
//!
//! Partial image-download failure is deliberately NOT represented here:
//! it is logged and the lookup proceeds with fewer images. Likewise a
//! cleanup-service failure never escapes the cleanup crate - it degrades
//! to heuristic output instead of surfacing as an error.

use thiserror::Error;

/// Key validation errors. Surfaced before any I/O is attempted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid product key {input:?}: expected 6-14 numeric digits")]
    BadKey { input: String },
}

/// Cache store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("No cached entry for key {key}")]
    NotFound { key: String },

    #[error("Corrupt document for key {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("I/O failure on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("No prompt template named {name:?}")]
    PromptNotFound { name: String },
}

impl StoreError {
    /// Build an [`StoreError::Io`] from a path and error.
    pub fn io(path: impl AsRef<std::path::Path>, err: &std::io::Error) -> Self {
        StoreError::Io {
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Lookup source API errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("No results found for key {key}")]
    NoResults { key: String },

    #[error("Lookup source unavailable (status {status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("Lookup source transport failure: {reason}")]
    Transport { reason: String },
}

/// Text cleanup service errors.
///
/// These are internal to the cleanup path: every public cleanup operation
/// catches them and substitutes the original or heuristic text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CleanupError {
    #[error("Cleanup request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Invalid cleanup response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Cleanup transport failure: {reason}")]
    Transport { reason: String },
}

/// Master error type for all upcvault operations.
#[derive(Debug, Clone, Error)]
pub enum VaultError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Cleanup error: {0}")]
    Cleanup(#[from] CleanupError),
}

/// Result type alias for upcvault operations.
pub type VaultResult<T> = Result<T, VaultError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::BadKey {
            input: "abc".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("abc"));
        assert!(msg.contains("6-14"));
    }

    #[test]
    fn test_store_error_display_not_found() {
        let err = StoreError::NotFound {
            key: "123456".to_string(),
        };
        assert!(format!("{}", err).contains("123456"));
    }

    #[test]
    fn test_source_error_display_unavailable() {
        let err = SourceError::Unavailable {
            status: 503,
            message: "down".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("503"));
        assert!(msg.contains("down"));
    }

    #[test]
    fn test_vault_error_from_variants() {
        let validation = VaultError::from(ValidationError::BadKey {
            input: "x".to_string(),
        });
        assert!(matches!(validation, VaultError::Validation(_)));

        let store = VaultError::from(StoreError::NotFound {
            key: "123456".to_string(),
        });
        assert!(matches!(store, VaultError::Store(_)));

        let source = VaultError::from(SourceError::NoResults {
            key: "123456".to_string(),
        });
        assert!(matches!(source, VaultError::Source(_)));

        let cleanup = VaultError::from(CleanupError::InvalidResponse {
            reason: "no content".to_string(),
        });
        assert!(matches!(cleanup, VaultError::Cleanup(_)));
    }
}

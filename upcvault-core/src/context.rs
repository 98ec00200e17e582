//! Runtime context.
//!
//! The original design reached for a process-wide config singleton
//! initialized lazily on first use. Here the context is an explicit value:
//! constructed once at startup, `init()` creates the directory tree, and
//! every component receives the context (or the piece of it they need)
//! at wiring time.

use crate::error::{StoreError, VaultResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// On-disk directory layout under one base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    pub base: PathBuf,
    /// Per-key JSON documents.
    pub docs: PathBuf,
    /// Downloaded image files.
    pub images: PathBuf,
    /// Saved completion responses.
    pub responses: PathBuf,
    /// Prompt templates.
    pub prompts: PathBuf,
}

impl VaultPaths {
    /// Standard layout under a base directory.
    pub fn under(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            docs: base.join("docs"),
            images: base.join("images"),
            responses: base.join("responses"),
            prompts: base.join("prompts"),
            base,
        }
    }

    /// Create every directory in the layout.
    pub fn init(&self) -> VaultResult<()> {
        for dir in [
            &self.base,
            &self.docs,
            &self.images,
            &self.responses,
            &self.prompts,
        ] {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, &e))?;
        }
        Ok(())
    }
}

/// Explicit runtime context passed to every component.
#[derive(Debug, Clone)]
pub struct VaultContext {
    pub paths: VaultPaths,
    /// Static fallback image returned when no validated image exists.
    pub placeholder: PathBuf,
    /// Lookup API endpoint; the key is appended as a query parameter.
    pub source_endpoint: String,
    /// Chat-completions base URL for the text cleanup service.
    pub cleanup_endpoint: String,
    /// Model name sent with cleanup requests.
    pub cleanup_model: String,
    /// Timeout for one lookup API call.
    pub fetch_timeout: Duration,
    /// Timeout for one cleanup/completion call. Local endpoints are slow,
    /// so this is deliberately generous.
    pub cleanup_timeout: Duration,
}

impl VaultContext {
    /// Context with default endpoints rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let paths = VaultPaths::under(base);
        let placeholder = paths.base.join("placeholder.png");
        Self {
            paths,
            placeholder,
            source_endpoint: "https://api.upcitemdb.com/prod/trial/lookup".to_string(),
            cleanup_endpoint: "http://localhost:1234/v1".to_string(),
            cleanup_model: "local-llm".to_string(),
            fetch_timeout: Duration::from_secs(15),
            cleanup_timeout: Duration::from_secs(60),
        }
    }

    /// Set the lookup API endpoint.
    pub fn with_source_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.source_endpoint = endpoint.into();
        self
    }

    /// Set the cleanup service endpoint.
    pub fn with_cleanup_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.cleanup_endpoint = endpoint.into();
        self
    }

    /// Set the cleanup model name.
    pub fn with_cleanup_model(mut self, model: impl Into<String>) -> Self {
        self.cleanup_model = model.into();
        self
    }

    /// Set the placeholder image path.
    pub fn with_placeholder(mut self, path: impl Into<PathBuf>) -> Self {
        self.placeholder = path.into();
        self
    }

    /// Set the lookup fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the cleanup call timeout.
    pub fn with_cleanup_timeout(mut self, timeout: Duration) -> Self {
        self.cleanup_timeout = timeout;
        self
    }

    /// Create the directory tree. Idempotent.
    pub fn init(&self) -> VaultResult<()> {
        self.paths.init()
    }

    /// Path of the persisted document for a key.
    pub fn doc_path(&self, key: &str) -> PathBuf {
        self.paths.docs.join(format!("{key}.json"))
    }

    /// Path of the legacy unsuffixed image for a key.
    pub fn legacy_image_path(&self, key: &str) -> PathBuf {
        self.paths.images.join(format!("{key}.jpg"))
    }

    /// Path of the n-th numbered image for a key.
    pub fn numbered_image_path(&self, key: &str, index: u32) -> PathBuf {
        self.paths.images.join(format!("{key}_{index}.jpg"))
    }
}

// =============================================================================
// TESTS
// =============================================================================

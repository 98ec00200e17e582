//! upcvault Store - Durable Per-Key Storage
//!
//! One pretty-printed JSON document per key, written with a
//! write-temp-then-rename discipline so a crash never leaves a truncated
//! document readable by a later listing. Legacy wrapped documents are
//! migrated lazily on read.
//!
//! The crate also owns the image asset resolver (content-sniffed
//! validation with a placeholder fallback) and the two flat-directory
//! repositories for prompt templates and saved responses.

pub mod assets;
pub mod prompts;
pub mod responses;
pub mod store;

pub use assets::{AssetResolver, DownloadReport};
pub use prompts::PromptStore;
pub use responses::ResponseStore;
pub use store::CacheStore;

//! upcvault Core - Data Types
//!
//! Pure data structures with no behavior beyond construction and access.
//! All other crates depend on this. This crate contains ONLY data types
//! and the error taxonomy - no merge logic, no I/O, no network code.

use chrono::{DateTime, Utc};

pub mod context;
pub mod error;
pub mod key;
pub mod prompt;
pub mod raw;
pub mod record;

pub use context::{VaultContext, VaultPaths};
pub use error::{
    CleanupError, SourceError, StoreError, ValidationError, VaultError, VaultResult,
};
pub use key::ProductKey;
pub use prompt::{PromptTemplate, ResponseRecord};
pub use raw::{RawItem, RawPayload};
pub use record::{fields, CacheSummary, CanonicalRecord, FieldValue, LookupOutcome};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

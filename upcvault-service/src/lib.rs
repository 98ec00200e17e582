//! upcvault Service - Lookup Orchestration
//!
//! Wires the source fetcher, normalizer, cleanup service, asset resolver,
//! and cache store into the lookup pipeline:
//!
//! ```text
//! hit:  store.get (migrate if legacy) → resolve assets → emit → return
//! miss: fetch → normalize → cleanup → download images → put → emit → return
//! ```
//!
//! Concurrent lookups for the same key coalesce on a per-key lock: the
//! second caller waits, re-checks the cache, and takes the hit path
//! instead of fetching again.

pub mod lookup;
pub mod source;

pub use lookup::LookupService;
pub use source::{HttpSourceFetcher, SourceFetcher};

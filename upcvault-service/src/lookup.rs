//! The lookup pipeline with per-key single-flight.

use crate::source::SourceFetcher;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use upcvault_core::record::fields;
use upcvault_core::{
    CacheSummary, CanonicalRecord, LookupOutcome, ProductKey, VaultResult,
};
use upcvault_events::{Notifier, VaultEvent};
use upcvault_llm::TextCleanup;
use upcvault_normalize::normalize;
use upcvault_store::CacheStore;

/// Orchestrates lookups against the store, source, and cleanup service.
pub struct LookupService<F, C>
where
    F: SourceFetcher,
    C: TextCleanup,
{
    store: CacheStore,
    fetcher: F,
    cleanup: C,
    notifier: Notifier,
    /// Per-key in-flight locks. Concurrent callers for the same uncached
    /// key serialize here and re-check the cache, so one pipeline run
    /// serves them all.
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<F, C> LookupService<F, C>
where
    F: SourceFetcher,
    C: TextCleanup,
{
    pub fn new(store: CacheStore, fetcher: F, cleanup: C, notifier: Notifier) -> Self {
        Self {
            store,
            fetcher,
            cleanup,
            notifier,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Look up a key: cache hit, or fetch/normalize/cleanup/persist.
    ///
    /// Key validation happens before any I/O. Image download failures are
    /// logged and non-fatal; a cleanup-service failure never surfaces.
    pub async fn lookup(&self, input: &str) -> VaultResult<LookupOutcome> {
        let key = ProductKey::parse(input)?;
        let guard = self.acquire_key(&key).await;
        let outcome = self.lookup_locked(&key).await;
        drop(guard);
        self.release_key(&key).await;
        outcome
    }

    async fn lookup_locked(&self, key: &ProductKey) -> VaultResult<LookupOutcome> {
        if self.store.contains(key) {
            let record = self.store.get(key)?;
            return Ok(self.finish(key, record));
        }

        let payload = self.fetcher.fetch(key).await?;
        let mut record = normalize(&payload, key);
        self.clean_text_fields(&mut record).await;

        if let Some(urls) = record.images().map(<[String]>::to_vec) {
            let report = self.store.assets().download_set(key, &urls).await;
            if report.saved < report.attempted {
                warn!(
                    key = %key,
                    attempted = report.attempted,
                    saved = report.saved,
                    "some image downloads failed"
                );
            }
        }

        self.store.put(key, &record)?;
        info!(key = %key, fields = record.len(), "cached new entry");
        Ok(self.finish(key, record))
    }

    /// Run title/description through the cleanup service and fold the
    /// result back into the record. Only the similarity rule removes the
    /// title; a reply without one leaves the original in place.
    async fn clean_text_fields(&self, record: &mut CanonicalRecord) {
        let title = record.text(fields::TITLE).unwrap_or_default().to_string();
        let description = record
            .text(fields::DESCRIPTION)
            .unwrap_or_default()
            .to_string();
        if title.is_empty() && description.is_empty() {
            return;
        }
        let cleaned = self.cleanup.normalize_fields(&title, &description).await;
        if cleaned.title_dropped {
            record.remove(fields::TITLE);
        } else if let Some(cleaned_title) = cleaned.title {
            record.insert(fields::TITLE, cleaned_title.into());
        }
        if let Some(cleaned_description) = cleaned.description {
            record.insert(fields::DESCRIPTION, cleaned_description.into());
        }
    }

    fn finish(&self, key: &ProductKey, record: CanonicalRecord) -> LookupOutcome {
        let assets = self.store.assets();
        let image = assets.resolve(key);
        let gallery = assets.gallery(key);
        self.notifier.emit(VaultEvent::EntryAdded {
            summary: CacheSummary::from_record(
                key,
                &record,
                image.clone(),
                self.store.modified(key),
            ),
        });
        LookupOutcome {
            key: key.clone(),
            record,
            image,
            gallery,
        }
    }

    /// Delete an entry and its dependent files. Idempotent.
    pub async fn delete(&self, input: &str) -> VaultResult<()> {
        let key = ProductKey::parse(input)?;
        let guard = self.acquire_key(&key).await;
        let result = self.store.delete(&key);
        drop(guard);
        self.release_key(&key).await;
        result?;
        self.notifier.emit(VaultEvent::EntryDeleted {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Listing passthrough.
    pub fn list(&self) -> VaultResult<Vec<CacheSummary>> {
        self.store.list()
    }

    async fn acquire_key(&self, key: &ProductKey) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inflight.lock().await;
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop the map entry once no other caller holds the lock. A racing
    /// newcomer simply creates a fresh entry and finds the cache warm.
    async fn release_key(&self, key: &ProductKey) {
        let mut map = self.inflight.lock().await;
        if let Some(lock) = map.get(key.as_str()) {
            if Arc::strong_count(lock) == 1 {
                map.remove(key.as_str());
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

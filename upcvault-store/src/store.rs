//! The per-key document store.

use crate::assets::AssetResolver;
use crate::responses::{file_mtime, ResponseStore};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use upcvault_core::{
    CacheSummary, CanonicalRecord, ProductKey, StoreError, Timestamp, VaultContext,
    VaultResult,
};
use upcvault_events::Notifier;
use upcvault_normalize::{flatten_legacy, is_legacy};

/// Old installs wrote up to five numbered images; the delete sweep covers
/// them all even though resolution only consults the first three.
const DELETE_IMAGE_SWEEP: u32 = 5;

/// Durable per-key JSON document storage with lazy legacy migration.
#[derive(Debug, Clone)]
pub struct CacheStore {
    docs_dir: PathBuf,
    assets: AssetResolver,
    responses: ResponseStore,
}

impl CacheStore {
    pub fn new(
        docs_dir: impl Into<PathBuf>,
        assets: AssetResolver,
        responses: ResponseStore,
    ) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            assets,
            responses,
        }
    }

    pub fn from_context(ctx: &VaultContext, notifier: Notifier) -> Self {
        Self::new(
            ctx.paths.docs.clone(),
            AssetResolver::from_context(ctx),
            ResponseStore::from_context(ctx, notifier),
        )
    }

    /// The asset resolver this store shares.
    pub fn assets(&self) -> &AssetResolver {
        &self.assets
    }

    pub fn doc_path(&self, key: &ProductKey) -> PathBuf {
        self.docs_dir.join(format!("{key}.json"))
    }

    pub fn contains(&self, key: &ProductKey) -> bool {
        self.doc_path(key).is_file()
    }

    /// Last-modified time of the persisted document, as listings report
    /// it.
    pub fn modified(&self, key: &ProductKey) -> Timestamp {
        file_mtime(&self.doc_path(key))
    }

    /// Read the record for a key.
    ///
    /// A legacy wrapped document is flattened through the normalizer and
    /// the flat form is rewritten in place before returning - migration
    /// happens lazily on read, there is no batch job.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] when no document exists
    /// - [`StoreError::Corrupt`] when the document does not parse
    pub fn get(&self, key: &ProductKey) -> VaultResult<CanonicalRecord> {
        let path = self.doc_path(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                }
                .into());
            }
            Err(e) => return Err(StoreError::io(&path, &e).into()),
        };
        let value: Value =
            serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        if is_legacy(&value) {
            let record = flatten_legacy(&value, key).ok_or_else(|| StoreError::Corrupt {
                key: key.to_string(),
                reason: "legacy wrapper without usable content".to_string(),
            })?;
            // Rewrite flat; a failed rewrite is retried on the next read.
            if let Err(err) = self.put(key, &record) {
                warn!(key = %key, error = %err, "legacy rewrite failed");
            } else {
                debug!(key = %key, "migrated legacy document");
            }
            return Ok(record);
        }

        serde_json::from_value(value).map_err(|e| {
            StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Overwrite the document for a key.
    ///
    /// Writes to a temporary file in the docs directory and renames it
    /// over the target, so a reader never observes a truncated document.
    pub fn put(&self, key: &ProductKey, record: &CanonicalRecord) -> VaultResult<()> {
        let path = self.doc_path(key);
        let pretty = serde_json::to_string_pretty(record).map_err(|e| {
            StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;
        let mut tmp = NamedTempFile::new_in(&self.docs_dir)
            .map_err(|e| StoreError::io(&self.docs_dir, &e))?;
        tmp.write_all(pretty.as_bytes())
            .map_err(|e| StoreError::io(tmp.path(), &e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io(&path, &e.error))?;
        Ok(())
    }

    /// Summaries of every entry, newest first.
    ///
    /// A corrupt or unparsable entry is skipped with a warning; one bad
    /// document never aborts the listing.
    pub fn list(&self) -> VaultResult<Vec<CacheSummary>> {
        let entries =
            fs::read_dir(&self.docs_dir).map_err(|e| StoreError::io(&self.docs_dir, &e))?;
        let mut summaries = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.docs_dir, &e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            let key = match ProductKey::parse(stem) {
                Ok(key) => key,
                Err(_) => {
                    warn!(file = name, "skipping document with non-key name");
                    continue;
                }
            };
            match self.read_for_listing(&key) {
                Ok(record) => {
                    let path = entry.path();
                    summaries.push(CacheSummary::from_record(
                        &key,
                        &record,
                        self.assets.resolve(&key),
                        file_mtime(&path),
                    ));
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "skipping corrupt entry");
                }
            }
        }
        summaries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(summaries)
    }

    /// Listing read: flattens legacy documents in memory without the
    /// rewrite side effect, so a read-only listing never mutates storage.
    fn read_for_listing(&self, key: &ProductKey) -> VaultResult<CanonicalRecord> {
        let path = self.doc_path(key);
        let text = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, &e))?;
        let value: Value =
            serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        if is_legacy(&value) {
            return flatten_legacy(&value, key).ok_or_else(|| {
                StoreError::Corrupt {
                    key: key.to_string(),
                    reason: "legacy wrapper without usable content".to_string(),
                }
                .into()
            });
        }
        serde_json::from_value(value).map_err(|e| {
            StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Remove the document, every image file, and every response record
    /// for a key. Idempotent: deleting a nonexistent key succeeds.
    pub fn delete(&self, key: &ProductKey) -> VaultResult<()> {
        remove_if_present(self.doc_path(key))?;
        for index in 1..=DELETE_IMAGE_SWEEP {
            remove_if_present(self.assets.numbered_path(key, index))?;
        }
        remove_if_present(self.assets.legacy_path(key))?;
        self.responses.delete_for_key(key)?;
        Ok(())
    }
}

fn remove_if_present(path: PathBuf) -> VaultResult<()> {
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(&path, &e).into()),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;
    use upcvault_core::record::fields;
    use upcvault_core::{FieldValue, VaultError};

    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0];

    struct Fixture {
        _dir: TempDir,
        store: CacheStore,
        images: PathBuf,
        docs: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        let images = dir.path().join("images");
        let responses = dir.path().join("responses");
        for d in [&docs, &images, &responses] {
            fs::create_dir_all(d).unwrap();
        }
        let notifier = Notifier::default();
        let store = CacheStore::new(
            &docs,
            AssetResolver::new(&images, dir.path().join("placeholder.png")),
            ResponseStore::new(&responses, notifier),
        );
        Fixture {
            _dir: dir,
            store,
            images,
            docs,
        }
    }

    fn key() -> ProductKey {
        ProductKey::parse("123456").unwrap()
    }

    fn record(title: &str) -> CanonicalRecord {
        let mut record = CanonicalRecord::new();
        record.insert(fields::TITLE, title.into());
        record.insert(fields::UPC, "123456".into());
        record
    }

    #[test]
    fn test_put_get_roundtrip() {
        let fx = fixture();
        fx.store.put(&key(), &record("Widget")).unwrap();
        let loaded = fx.store.get(&key()).unwrap();
        assert_eq!(loaded.text(fields::TITLE), Some("Widget"));
    }

    #[test]
    fn test_get_preserves_field_order() {
        let fx = fixture();
        let mut record = CanonicalRecord::new();
        record.insert(fields::TITLE, "Widget".into());
        record.insert(fields::BRAND, "Acme".into());
        record.insert(fields::IMAGES, FieldValue::List(vec!["u1".into()]));
        fx.store.put(&key(), &record).unwrap();
        let loaded = fx.store.get(&key()).unwrap();
        let names: Vec<_> = loaded.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["title", "brand", "images"]);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let fx = fixture();
        let err = fx.store.get(&key()).unwrap_err();
        assert!(matches!(
            err,
            VaultError::Store(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_put_leaves_no_temp_files() {
        let fx = fixture();
        fx.store.put(&key(), &record("A")).unwrap();
        fx.store.put(&key(), &record("B")).unwrap();
        let names: Vec<_> = fs::read_dir(&fx.docs)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["123456.json"]);
        assert_eq!(
            fx.store.get(&key()).unwrap().text(fields::TITLE),
            Some("B")
        );
    }

    #[test]
    fn test_get_migrates_legacy_and_rewrites_flat() {
        let fx = fixture();
        let legacy = json!({
            "upc": "123456",
            "raw": {"items": [{"title": "Old Widget", "images": ["u1"]}]},
            "product": {"title": "Old Widget", "offers": []}
        });
        fs::write(
            fx.store.doc_path(&key()),
            serde_json::to_string_pretty(&legacy).unwrap(),
        )
        .unwrap();

        let migrated = fx.store.get(&key()).unwrap();
        assert_eq!(migrated.text(fields::TITLE), Some("Old Widget"));

        // the wrapper is gone from disk after the first read
        let on_disk: Value =
            serde_json::from_str(&fs::read_to_string(fx.store.doc_path(&key())).unwrap())
                .unwrap();
        assert!(on_disk.get("raw").is_none());
        assert_eq!(on_disk["title"], "Old Widget");

        // and the second read takes the flat path
        let again = fx.store.get(&key()).unwrap();
        assert_eq!(again, migrated);
    }

    #[test]
    fn test_list_skips_corrupt_entries() {
        let fx = fixture();
        fx.store.put(&key(), &record("Good")).unwrap();
        fs::write(fx.docs.join("654321.json"), "{ not json").unwrap();
        let summaries = fx.store.list().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "Good");
    }

    #[test]
    fn test_list_newest_first_with_resolved_images() {
        let fx = fixture();
        let older = ProductKey::parse("111111").unwrap();
        fx.store.put(&older, &record("Older")).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        fx.store.put(&key(), &record("Newer")).unwrap();
        fs::write(fx.images.join("123456_2.jpg"), JPEG_HEADER).unwrap();

        let summaries = fx.store.list().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].key, "123456");
        assert_eq!(
            summaries[0].image,
            Some(fx.images.join("123456_2.jpg"))
        );
        assert_eq!(summaries[1].image, None);
    }

    #[test]
    fn test_delete_cascades_and_is_idempotent() {
        let fx = fixture();
        fx.store.put(&key(), &record("Widget")).unwrap();
        fs::write(fx.images.join("123456_1.jpg"), JPEG_HEADER).unwrap();
        fs::write(fx.images.join("123456_4.jpg"), JPEG_HEADER).unwrap();
        fs::write(fx.images.join("123456.jpg"), JPEG_HEADER).unwrap();
        fx.store
            .responses
            .save(&key(), "pitch", "copy")
            .unwrap();
        // another key's files must survive the cascade
        let other = ProductKey::parse("654321").unwrap();
        fs::write(fx.images.join("654321_1.jpg"), JPEG_HEADER).unwrap();

        fx.store.delete(&key()).unwrap();

        assert!(!fx.store.contains(&key()));
        assert!(!fx.images.join("123456_1.jpg").exists());
        assert!(!fx.images.join("123456_4.jpg").exists());
        assert!(!fx.images.join("123456.jpg").exists());
        assert!(fx.store.responses.list(Some(&key())).unwrap().is_empty());
        assert!(fx.images.join("654321_1.jpg").exists());

        // deleting again is not an error
        fx.store.delete(&key()).unwrap();
    }
}

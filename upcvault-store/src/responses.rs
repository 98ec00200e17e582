//! Saved completion responses: `{key}_{template}_{seq:03}.txt`.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use upcvault_core::{ProductKey, ResponseRecord, StoreError, VaultContext, VaultResult};
use upcvault_events::{Notifier, VaultEvent};

/// Template names may carry underscores, so the sequence is anchored at
/// the end: key first, 3-digit sequence last, template in between.
static RESPONSE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)_(.+)_(\d{3})\.txt$").unwrap());

static UNSAFE_TEMPLATE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]+").unwrap());

/// Flat-directory repository for saved responses.
#[derive(Debug, Clone)]
pub struct ResponseStore {
    dir: PathBuf,
    notifier: Notifier,
}

impl ResponseStore {
    pub fn new(dir: impl Into<PathBuf>, notifier: Notifier) -> Self {
        Self {
            dir: dir.into(),
            notifier,
        }
    }

    pub fn from_context(ctx: &VaultContext, notifier: Notifier) -> Self {
        Self::new(ctx.paths.responses.clone(), notifier)
    }

    /// All responses, newest first; `key` filters to one key's responses.
    /// Files that do not parse as response names are skipped.
    pub fn list(&self, key: Option<&ProductKey>) -> VaultResult<Vec<ResponseRecord>> {
        let mut records = Vec::new();
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, &e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, &e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(caps) = RESPONSE_NAME.captures(&name) else {
                continue;
            };
            let file_key = caps[1].to_string();
            if let Some(wanted) = key {
                if file_key != wanted.as_str() {
                    continue;
                }
            }
            let path = entry.path();
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable response");
                    continue;
                }
            };
            let sequence = caps[3].parse().unwrap_or(0);
            records.push(ResponseRecord {
                key: file_key,
                template: caps[2].to_string(),
                sequence,
                content,
                modified: file_mtime(&path),
                path,
            });
        }
        records.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(records)
    }

    /// Save a response under the lowest unused sequence for the
    /// key+template pair, starting at 001. Gaps left by deletions are
    /// reused.
    pub fn save(
        &self,
        key: &ProductKey,
        template: &str,
        content: &str,
    ) -> VaultResult<PathBuf> {
        let safe_template = UNSAFE_TEMPLATE_CHARS.replace_all(template, "_");
        let mut sequence: u32 = 1;
        let path = loop {
            let candidate = self
                .dir
                .join(format!("{key}_{safe_template}_{sequence:03}.txt"));
            if !candidate.exists() {
                break candidate;
            }
            sequence += 1;
        };
        fs::write(&path, content).map_err(|e| StoreError::io(&path, &e))?;
        self.notifier.emit(VaultEvent::ResponsesChanged {
            key: Some(key.to_string()),
        });
        Ok(path)
    }

    /// Delete one response file. Deleting a missing file is not an error.
    pub fn delete(&self, path: &Path) -> VaultResult<()> {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io(path, &e).into()),
        }
        let key = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.split('_').next())
            .map(str::to_string);
        self.notifier.emit(VaultEvent::ResponsesChanged { key });
        Ok(())
    }

    /// Remove every response for a key. Part of the delete cascade;
    /// idempotent.
    pub fn delete_for_key(&self, key: &ProductKey) -> VaultResult<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io(&self.dir, &e).into()),
        };
        let prefix = format!("{key}_");
        let mut removed = false;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, &e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".txt") {
                match fs::remove_file(entry.path()) {
                    Ok(()) => removed = true,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(StoreError::io(entry.path(), &e).into()),
                }
            }
        }
        if removed {
            self.notifier.emit(VaultEvent::ResponsesChanged {
                key: Some(key.to_string()),
            });
        }
        Ok(())
    }
}

pub(crate) fn file_mtime(path: &Path) -> DateTime<Utc> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key() -> ProductKey {
        ProductKey::parse("123456").unwrap()
    }

    fn store(dir: &TempDir) -> ResponseStore {
        ResponseStore::new(dir.path(), Notifier::default())
    }

    #[test]
    fn test_save_allocates_sequences_from_one() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let first = store.save(&key(), "sales_copy", "a").unwrap();
        let second = store.save(&key(), "sales_copy", "b").unwrap();
        assert!(first.ends_with("123456_sales_copy_001.txt"));
        assert!(second.ends_with("123456_sales_copy_002.txt"));
    }

    #[test]
    fn test_save_fills_sequence_gaps() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let first = store.save(&key(), "pitch", "a").unwrap();
        store.save(&key(), "pitch", "b").unwrap();
        store.delete(&first).unwrap();
        let refilled = store.save(&key(), "pitch", "c").unwrap();
        assert!(refilled.ends_with("123456_pitch_001.txt"));
    }

    #[test]
    fn test_save_sanitizes_template_name() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = store.save(&key(), "sales copy!", "x").unwrap();
        assert!(path.ends_with("123456_sales_copy__001.txt"));
    }

    #[test]
    fn test_list_parses_names_with_underscored_templates() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&key(), "sales_copy_v2", "content").unwrap();
        let records = store.list(Some(&key())).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].template, "sales_copy_v2");
        assert_eq!(records[0].sequence, 1);
        assert_eq!(records[0].content, "content");
    }

    #[test]
    fn test_list_filters_by_key_and_skips_foreign_files() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&key(), "pitch", "mine").unwrap();
        let other = ProductKey::parse("654321").unwrap();
        store.save(&other, "pitch", "theirs").unwrap();
        fs::write(dir.path().join("notes.txt"), "junk").unwrap();

        let mine = store.list(Some(&key())).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].key, "123456");

        let all = store.list(None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_delete_for_key_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&key(), "pitch", "a").unwrap();
        store.save(&key(), "other", "b").unwrap();
        store.delete_for_key(&key()).unwrap();
        assert!(store.list(Some(&key())).unwrap().is_empty());
        // second cascade pass finds nothing and still succeeds
        store.delete_for_key(&key()).unwrap();
    }

    #[test]
    fn test_delete_missing_file_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.delete(&dir.path().join("123456_pitch_001.txt")).unwrap();
    }
}

//! Prompt templates: one `.txt` file per template name.

use std::fs;
use std::path::PathBuf;
use upcvault_core::{PromptTemplate, StoreError, VaultContext, VaultResult};
use upcvault_events::{Notifier, VaultEvent};

const DEFAULT_TEMPLATE_NAME: &str = "sales_copy";
const DEFAULT_TEMPLATE: &str = "You are a product copywriter. Write a persuasive \
marketing description for this product, highlighting its main features and ending \
with a strong call-to-action.\n\nProduct details:\nTitle: {title}\nBrand: {brand}\n\
Category: {category}\nDescription: {description}\n";

/// Flat-directory repository for prompt templates.
#[derive(Debug, Clone)]
pub struct PromptStore {
    dir: PathBuf,
    notifier: Notifier,
}

impl PromptStore {
    pub fn new(dir: impl Into<PathBuf>, notifier: Notifier) -> Self {
        Self {
            dir: dir.into(),
            notifier,
        }
    }

    pub fn from_context(ctx: &VaultContext, notifier: Notifier) -> Self {
        Self::new(ctx.paths.prompts.clone(), notifier)
    }

    /// Template names, from `.txt` filenames, sorted.
    pub fn list(&self) -> VaultResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, &e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, &e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stem) = name.strip_suffix(".txt") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Load one template by name.
    pub fn get(&self, name: &str) -> VaultResult<PromptTemplate> {
        let path = self.dir.join(format!("{name}.txt"));
        match fs::read_to_string(&path) {
            Ok(content) => Ok(PromptTemplate::new(name, content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::PromptNotFound {
                    name: name.to_string(),
                }
                .into())
            }
            Err(e) => Err(StoreError::io(&path, &e).into()),
        }
    }

    /// Write or overwrite a template.
    pub fn put(&self, name: &str, content: &str) -> VaultResult<()> {
        let path = self.dir.join(format!("{name}.txt"));
        fs::write(&path, content).map_err(|e| StoreError::io(&path, &e))?;
        self.notifier.emit(VaultEvent::PromptsChanged);
        Ok(())
    }

    /// Seed the starter template when the directory holds no templates.
    pub fn seed_default(&self) -> VaultResult<()> {
        if self.list()?.is_empty() {
            self.put(DEFAULT_TEMPLATE_NAME, DEFAULT_TEMPLATE)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use upcvault_core::VaultError;

    fn store(dir: &TempDir) -> PromptStore {
        PromptStore::new(dir.path(), Notifier::default())
    }

    #[test]
    fn test_put_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.put("pitch", "Sell {title}").unwrap();
        let template = store.get("pitch").unwrap();
        assert_eq!(template.name, "pitch");
        assert_eq!(template.content, "Sell {title}");
    }

    #[test]
    fn test_get_missing_is_typed_error() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir).get("nope").unwrap_err();
        assert!(matches!(
            err,
            VaultError::Store(StoreError::PromptNotFound { .. })
        ));
    }

    #[test]
    fn test_list_is_sorted_names() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.put("zeta", "z").unwrap();
        store.put("alpha", "a").unwrap();
        fs::write(dir.path().join("ignore.md"), "x").unwrap();
        assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_seed_default_only_when_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.seed_default().unwrap();
        assert_eq!(store.list().unwrap(), vec!["sales_copy"]);

        store.put("custom", "c").unwrap();
        fs::remove_file(dir.path().join("sales_copy.txt")).unwrap();
        store.seed_default().unwrap();
        // a non-empty directory is left alone
        assert_eq!(store.list().unwrap(), vec!["custom"]);
    }
}

//! In-memory theme storage.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use super::ThemeStorage;
use crate::error::StorageError;
use crate::model::{Theme, ThemeMetadata};

/// [`ThemeStorage`] backed by a map. Can be switched into a failing mode to
/// exercise storage-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    themes: RwLock<BTreeMap<String, Theme>>,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `themes`.
    pub fn with_themes(themes: impl IntoIterator<Item = Theme>) -> Self {
        let storage = Self::new();
        {
            let mut map = storage.themes.write();
            for theme in themes {
                map.insert(theme.id.clone(), theme);
            }
        }
        storage
    }

    /// Make every subsequent operation fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.themes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.read().is_empty()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("storage unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ThemeStorage for MemoryStorage {
    async fn save(&self, theme: &Theme) -> Result<String, StorageError> {
        self.check()?;
        self.themes.write().insert(theme.id.clone(), theme.clone());
        debug!(theme.id = %theme.id, "Theme saved to memory storage");
        Ok(theme.id.clone())
    }

    async fn load(&self, id: &str) -> Result<Option<Theme>, StorageError> {
        self.check()?;
        Ok(self.themes.read().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        self.check()?;
        Ok(self.themes.write().remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<ThemeMetadata>, StorageError> {
        self.check()?;
        Ok(self
            .themes
            .read()
            .values()
            .map(|theme| theme.metadata.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let storage = MemoryStorage::new();
        let theme = Theme::extract();
        assert_eq!(storage.save(&theme).await.expect("save"), "default");
        assert_eq!(storage.save(&theme).await.expect("save"), "default");
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_load_is_none() {
        let storage = MemoryStorage::new();
        assert!(storage.load("nope").await.expect("load").is_none());
        assert!(!storage.delete("nope").await.expect("delete"));
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let storage = MemoryStorage::with_themes([Theme::extract()]);
        storage.set_failing(true);
        assert!(matches!(storage.load("default").await, Err(StorageError::Backend(_))));
        storage.set_failing(false);
        assert_eq!(storage.list().await.expect("list").len(), 1);
    }
}

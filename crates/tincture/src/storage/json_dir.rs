//! One pretty-printed JSON file per theme.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::ThemeStorage;
use crate::error::StorageError;
use crate::model::{Theme, ThemeMetadata};
use crate::validator::is_valid_theme_id;

/// [`ThemeStorage`] writing `<dir>/<id>.json`.
///
/// Ids are checked before touching the filesystem so a crafted id cannot
/// escape the directory.
#[derive(Debug, Clone)]
pub struct JsonDirStorage {
    dir: PathBuf,
}

impl JsonDirStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_theme_id(id) {
            return Err(StorageError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

#[async_trait::async_trait]
impl ThemeStorage for JsonDirStorage {
    async fn save(&self, theme: &Theme) -> Result<String, StorageError> {
        let path = self.path_for(&theme.id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(theme)?;
        tokio::fs::write(&path, json).await?;
        debug!(theme.id = %theme.id, path = %path.display(), "Theme written");
        Ok(theme.id.clone())
    }

    async fn load(&self, id: &str) -> Result<Option<Theme>, StorageError> {
        let path = self.path_for(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self) -> Result<Vec<ThemeMetadata>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut out = Vec::with_capacity(paths.len());
        for path in paths {
            let text = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<Theme>(&text) {
                Ok(theme) => out.push(theme.metadata),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Skipping unreadable theme file");
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = JsonDirStorage::new(dir.path().join("themes"));
        let theme = Theme::extract().renamed("ocean-blue", "Ocean Blue");

        let id = storage.save(&theme).await.expect("save");
        assert_eq!(id, "ocean-blue");
        assert!(dir.path().join("themes/ocean-blue.json").exists());

        let loaded = storage.load("ocean-blue").await.expect("load");
        assert_eq!(loaded, Some(theme));
        assert_eq!(storage.list().await.expect("list").len(), 1);

        assert!(storage.delete("ocean-blue").await.expect("delete"));
        assert!(storage.load("ocean-blue").await.expect("load").is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = JsonDirStorage::new(dir.path());
        assert!(matches!(
            storage.load("../etc/passwd").await,
            Err(StorageError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_dir_lists_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = JsonDirStorage::new(dir.path().join("absent"));
        assert!(storage.list().await.expect("list").is_empty());
    }
}

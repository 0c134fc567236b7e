//! Storage collaborators.
//!
//! The engine treats persistence as an external interface:
//!
//! - [`ThemeStorage`] is the authoritative async store behind
//!   `save`/`load`/`delete`/`list`. [`MemoryStorage`] and [`JsonDirStorage`]
//!   implement it.
//! - [`KeyValueStore`] is the synchronous string store the cache mirrors its
//!   entries into when persistence is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use tincture::storage::{JsonDirStorage, ThemeStorage};
//!
//! let storage = JsonDirStorage::new("./themes");
//! let id = storage.save(&theme).await?;
//! let loaded = storage.load(&id).await?;
//! ```

mod json_dir;
mod kv;
mod memory;

pub use json_dir::JsonDirStorage;
pub use kv::{KeyValueStore, MemoryKeyValueStore};
pub use memory::MemoryStorage;

use crate::error::StorageError;
use crate::model::{Theme, ThemeMetadata};

/// Authoritative theme persistence.
///
/// `save` must be idempotent for the same id, and `load` reports a missing
/// theme as `Ok(None)` rather than an error.
#[async_trait::async_trait]
pub trait ThemeStorage: Send + Sync {
    /// Persist a theme and return its id.
    async fn save(&self, theme: &Theme) -> Result<String, StorageError>;

    /// Load a theme by id.
    async fn load(&self, id: &str) -> Result<Option<Theme>, StorageError>;

    /// Delete a theme. Returns whether anything was removed.
    async fn delete(&self, id: &str) -> Result<bool, StorageError>;

    /// Metadata of every stored theme.
    async fn list(&self) -> Result<Vec<ThemeMetadata>, StorageError>;
}

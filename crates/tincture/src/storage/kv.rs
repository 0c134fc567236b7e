//! Synchronous key-value store used by the cache persistence side-channel.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::StorageError;

/// A string-to-string store. Keys are namespaced by the caller.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    /// Returns [`StorageError`] if the backend rejects the write.
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Returns whether the key existed.
    fn remove(&self, key: &str) -> bool;

    /// Every key starting with `prefix`, in order.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// In-process [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .read()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_scan() {
        let store = MemoryKeyValueStore::new();
        store.set("cache:a", "1".into()).expect("set");
        store.set("cache:b", "2".into()).expect("set");
        store.set("other:c", "3".into()).expect("set");
        assert_eq!(store.keys_with_prefix("cache:"), vec!["cache:a", "cache:b"]);
        assert!(store.remove("cache:a"));
        assert!(!store.remove("cache:a"));
        assert_eq!(store.len(), 2);
    }
}

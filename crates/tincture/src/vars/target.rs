//! Render targets: sinks for named custom properties.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::error::RenderError;

/// Anything that can hold named string properties.
///
/// The layer calls [`commit`](RenderTarget::commit) once after each flushed
/// batch, so a target can defer expensive work until then.
pub trait RenderTarget: Send + Sync {
    /// Set a property.
    ///
    /// # Errors
    /// Returns [`RenderError`] if the target refuses the value.
    fn set_property(&self, name: &str, value: &str) -> Result<(), RenderError>;

    /// Current value of a property.
    fn get_property(&self, name: &str) -> Option<String>;

    fn remove_property(&self, name: &str);

    /// Called after a batch of `set_property` calls.
    fn commit(&self) {}
}

/// Map-backed [`RenderTarget`] with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryTarget {
    properties: RwLock<BTreeMap<String, String>>,
    failing_properties: RwLock<BTreeSet<String>>,
    failing_values: RwLock<BTreeSet<String>>,
    commits: AtomicUsize,
}

impl InMemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every write to `name`.
    pub fn fail_property(&self, name: impl Into<String>) {
        self.failing_properties.write().insert(name.into());
    }

    /// Refuse every write of exactly `value`.
    pub fn fail_value(&self, value: impl Into<String>) {
        self.failing_values.write().insert(value.into());
    }

    pub fn clear_failures(&self) {
        self.failing_properties.write().clear();
        self.failing_values.write().clear();
    }

    /// Number of commits so far.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.properties.read().clone()
    }

    pub fn len(&self) -> usize {
        self.properties.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.read().is_empty()
    }
}

impl RenderTarget for InMemoryTarget {
    fn set_property(&self, name: &str, value: &str) -> Result<(), RenderError> {
        if self.failing_properties.read().contains(name) {
            return Err(RenderError::Unavailable(name.to_string()));
        }
        if self.failing_values.read().contains(value) {
            return Err(RenderError::Rejected(value.to_string()));
        }
        self.properties
            .write()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn get_property(&self, name: &str) -> Option<String> {
        self.properties.read().get(name).cloned()
    }

    fn remove_property(&self, name: &str) {
        self.properties.write().remove(name);
    }

    fn commit(&self) {
        self.commits.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_injection() {
        let target = InMemoryTarget::new();
        target.fail_property("--a");
        target.fail_value("bad");
        assert!(matches!(target.set_property("--a", "x"), Err(RenderError::Unavailable(_))));
        assert!(matches!(target.set_property("--b", "bad"), Err(RenderError::Rejected(_))));
        target.set_property("--b", "good").expect("set");
        assert_eq!(target.get_property("--b").as_deref(), Some("good"));

        target.clear_failures();
        target.set_property("--a", "x").expect("set");
        assert_eq!(target.len(), 2);
    }
}

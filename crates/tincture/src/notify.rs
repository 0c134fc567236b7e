//! Change notifications for presentation layers.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::model::Theme;

/// Something that happened to a theme.
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeEvent {
    /// Variables for the theme were committed to the render target.
    Applied { id: String, theme: Box<Theme> },
    /// The theme was persisted.
    Saved { id: String },
    /// The theme was loaded, from the cache or from storage.
    Loaded { id: String, from_cache: bool },
    /// Recovery produced the theme. `strategies` lists the fallback actions taken.
    Recovered { id: String, strategies: Vec<String> },
}

impl ThemeEvent {
    pub fn id(&self) -> &str {
        match self {
            Self::Applied { id, .. }
            | Self::Saved { id }
            | Self::Loaded { id, .. }
            | Self::Recovered { id, .. } => id,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Saved { .. } => "saved",
            Self::Loaded { .. } => "loaded",
            Self::Recovered { .. } => "recovered",
        }
    }
}

/// Identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Listener callback for theme events.
pub trait ThemeListener: Send + Sync {
    fn on_event(&self, event: &ThemeEvent);
}

impl<F> ThemeListener for F
where
    F: Fn(&ThemeEvent) + Send + Sync,
{
    fn on_event(&self, event: &ThemeEvent) {
        self(event);
    }
}

/// Explicit observer list. Emission is synchronous and fire-and-forget.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: RwLock<BTreeMap<ListenerId, Arc<dyn ThemeListener>>>,
    next_id: AtomicU64,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.read().len())
            .finish_non_exhaustive()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners run in registration order.
    pub fn on_change<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&ThemeEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().insert(id, Arc::new(callback));
        debug!(listener.id = id.0, "Theme listener registered");
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = self.listeners.write().remove(&id).is_some();
        if removed {
            debug!(listener.id = id.0, "Theme listener removed");
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Deliver `event` to every listener. A panicking listener is logged and
    /// skipped.
    pub fn emit(&self, event: &ThemeEvent) {
        let listeners: Vec<(ListenerId, Arc<dyn ThemeListener>)> = self
            .listeners
            .read()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        for (id, listener) in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if result.is_err() {
                warn!(
                    listener.id = id.0,
                    theme.id = %event.id(),
                    event = event.kind(),
                    "Theme listener panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_listeners_receive_events() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        notifier.on_change(move |event| sink.lock().push(event.id().to_string()));

        notifier.emit(&ThemeEvent::Saved { id: "ocean".into() });
        notifier.emit(&ThemeEvent::Loaded {
            id: "forest".into(),
            from_cache: true,
        });
        assert_eq!(*seen.lock(), vec!["ocean", "forest"]);
    }

    #[test]
    fn test_removed_listener_is_silent() {
        let notifier = ChangeNotifier::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let id = notifier.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(notifier.remove_listener(id));
        assert!(!notifier.remove_listener(id));
        notifier.emit(&ThemeEvent::Saved { id: "ocean".into() });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let notifier = ChangeNotifier::new();
        let count = Arc::new(AtomicUsize::new(0));
        notifier.on_change(|_| panic!("listener failure"));
        let counter = Arc::clone(&count);
        notifier.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        notifier.emit(&ThemeEvent::Saved { id: "ocean".into() });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

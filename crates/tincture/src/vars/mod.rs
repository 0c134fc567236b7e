//! Variable application layer.
//!
//! A [`Theme`] is flattened into `--theme-*` custom properties and committed
//! to a [`RenderTarget`]. Writes are queued and coalesced: every
//! [`flush`](VariableLayer::flush) drains the queue, keeps the last value per
//! property, and commits once.
//!
//! Values are validated again at this layer because callers may hand it maps
//! that never went through the validator. Invalid entries are dropped from a
//! batch while valid ones still go through, unless a fallback can stand in.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tincture::vars::{InMemoryTarget, VariableConfig, VariableLayer};
//! use tincture::Theme;
//!
//! let target = Arc::new(InMemoryTarget::new());
//! let layer = VariableLayer::new(target.clone(), VariableConfig::default());
//! let report = layer.apply(&Theme::extract());
//! assert!(report.is_clean());
//! assert_eq!(
//!     target.snapshot().get("--theme-colors-primary-500").map(String::as_str),
//!     Some("#10b981"),
//! );
//! ```

mod target;

pub use target::{InMemoryTarget, RenderTarget};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};
use std::time::Duration;

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::css::{PropertyKind, first_stop_color, render_gradient};
use crate::error::{ErrorCode, Severity, ThemeError};
use crate::model::{EffectKind, FontFamilyKind, ScaleName, SemanticRole, Theme};
use crate::notify::{ChangeNotifier, ThemeEvent};

/// Variable layer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableConfig {
    /// Prefix of every generated property name.
    pub prefix: String,
    /// Capacity of the `(property, value)` validation memo.
    pub validation_cache_size: usize,
    /// Tick of the frame driver, in milliseconds.
    pub frame_interval_ms: u64,
}

impl Default for VariableConfig {
    fn default() -> Self {
        Self {
            prefix: "--theme".to_string(),
            validation_cache_size: 512,
            frame_interval_ms: 16,
        }
    }
}

/// Outcome of [`VariableLayer::batch_update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// No entry was dropped.
    pub success: bool,
    /// Entries queued with their own value.
    pub accepted: usize,
    /// Entries queued with a fallback value instead of their own.
    pub substituted: usize,
    /// One record per invalid entry, dropped or substituted.
    pub errors: Vec<ThemeError>,
}

/// Outcome of [`VariableLayer::flush`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    /// Properties written to the target.
    pub committed: usize,
    /// Properties whose own value was refused and a fallback was written.
    pub fallbacks_used: Vec<String>,
    /// Properties that could not be written at all.
    pub failures: Vec<ThemeError>,
}

/// Outcome of [`VariableLayer::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub batch: BatchReport,
    pub flush: FlushReport,
}

impl ApplyReport {
    /// Every property was valid and written.
    pub fn is_clean(&self) -> bool {
        self.batch.success && self.batch.substituted == 0 && self.flush.failures.is_empty()
    }

    /// Validation and application errors together.
    pub fn errors(&self) -> Vec<ThemeError> {
        self.batch
            .errors
            .iter()
            .chain(&self.flush.failures)
            .cloned()
            .collect()
    }
}

/// Flattens themes into custom properties and commits them to a target.
pub struct VariableLayer {
    target: Arc<dyn RenderTarget>,
    config: VariableConfig,
    queue: Mutex<Vec<(String, String)>>,
    memo: Mutex<LruCache<(String, String), bool>>,
    fallbacks: RwLock<HashMap<String, Vec<String>>>,
    known_good: RwLock<HashMap<String, String>>,
    applied: Mutex<BTreeSet<String>>,
    notifier: Option<Arc<ChangeNotifier>>,
    frame_driver: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for VariableLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableLayer")
            .field("config", &self.config)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl VariableLayer {
    pub fn new(target: Arc<dyn RenderTarget>, config: VariableConfig) -> Self {
        let capacity = NonZeroUsize::new(config.validation_cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            target,
            config,
            queue: Mutex::new(Vec::new()),
            memo: Mutex::new(LruCache::new(capacity)),
            fallbacks: RwLock::new(HashMap::new()),
            known_good: RwLock::new(HashMap::new()),
            applied: Mutex::new(BTreeSet::new()),
            notifier: None,
            frame_driver: Mutex::new(None),
        }
    }

    /// Emit [`ThemeEvent::Applied`] through `notifier` after clean applications.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub const fn config(&self) -> &VariableConfig {
        &self.config
    }

    pub fn target(&self) -> &Arc<dyn RenderTarget> {
        &self.target
    }

    fn name(&self, parts: &[&str]) -> String {
        let mut name = self.config.prefix.clone();
        for part in parts {
            name.push('-');
            name.push_str(part);
        }
        name
    }

    /// Flatten the properties a theme contributes.
    ///
    /// Color shades, semantic colors, rendered gradients, effect tokens and
    /// font family lists are included. Font sizes, weights and line heights
    /// are not.
    pub fn flatten(&self, theme: &Theme) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();

        for scale in ScaleName::ALL {
            for (shade, value) in theme.colors.scale(scale).iter() {
                vars.insert(
                    self.name(&["colors", scale.as_str(), shade.to_string().as_str()]),
                    value.to_string(),
                );
            }
        }
        for role in SemanticRole::ALL {
            vars.insert(
                self.name(&["colors", "semantic", role.as_str()]),
                theme.colors.semantic.get(role).to_string(),
            );
        }
        for (name, gradient) in theme.gradients.iter() {
            vars.insert(self.name(&["gradients", name.as_str()]), render_gradient(gradient));
        }
        for kind in EffectKind::ALL {
            for (token, value) in theme.effects.get(kind) {
                vars.insert(self.name(&["effects", kind.as_str(), token.as_str()]), value.clone());
            }
        }
        for kind in FontFamilyKind::ALL {
            vars.insert(
                self.name(&["typography", "fontFamily", kind.as_str()]),
                font_list(theme.typography.font_family.get(kind)),
            );
        }
        vars
    }

    /// Check a property/value pair, memoized.
    pub fn is_valid(&self, property: &str, value: &str) -> bool {
        let key = (property.to_string(), value.to_string());
        if let Some(valid) = self.memo.lock().get(&key) {
            return *valid;
        }
        let valid = property.starts_with("--")
            && property.len() > 2
            && PropertyKind::infer(property).accepts(value);
        self.memo.lock().put(key, valid);
        valid
    }

    /// Number of memoized validation results.
    pub fn validation_cache_len(&self) -> usize {
        self.memo.lock().len()
    }

    /// Register fallback properties for `property`, tried in order.
    pub fn register_fallback(&self, property: impl Into<String>, fallbacks: Vec<String>) {
        let property = property.into();
        debug!(vars.property = %property, vars.fallbacks = ?fallbacks, "Fallback chain registered");
        self.fallbacks.write().insert(property, fallbacks);
    }

    /// Last value successfully written for `property`.
    pub fn known_good(&self, property: &str) -> Option<String> {
        self.known_good.read().get(property).cloned()
    }

    /// A value to use instead of `value` for `property`.
    ///
    /// The first fallback property with a known-good value wins. Gradients
    /// then fall back to the color of their first stop.
    fn substitute(&self, property: &str, value: &str) -> Option<(String, String)> {
        if let Some(chain) = self.fallbacks.read().get(property) {
            let known_good = self.known_good.read();
            for fallback in chain {
                if let Some(good) = known_good.get(fallback) {
                    return Some((good.clone(), format!("fallback:{fallback}")));
                }
            }
        }
        if PropertyKind::infer(property) == PropertyKind::Gradient {
            if let Some(color) = first_stop_color(value) {
                return Some((color, "gradient-first-stop".to_string()));
            }
        }
        None
    }

    /// Validate and queue variables for the next flush.
    ///
    /// Invalid entries are replaced by a fallback when one exists, otherwise
    /// dropped. Valid entries are queued either way.
    pub fn batch_update<I, K, V>(&self, variables: I) -> BatchReport
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut report = BatchReport {
            success: true,
            ..BatchReport::default()
        };
        let mut queued = Vec::new();

        for (property, value) in variables {
            let property = property.into();
            let value = value.into();
            if self.is_valid(&property, &value) {
                queued.push((property, value));
                report.accepted += 1;
                continue;
            }

            let mut error = ThemeError::new(
                ErrorCode::CssValue,
                format!("invalid value '{value}' for {property}"),
                Severity::Medium,
            )
            .with_field(property.clone());

            if let Some((replacement, action)) = self.substitute(&property, &value) {
                trace!(
                    vars.property = %property,
                    vars.fallback = %action,
                    "Substituted invalid value"
                );
                error.fallback_action = Some(action);
                queued.push((property, replacement));
                report.substituted += 1;
            } else {
                warn!(vars.property = %property, vars.value = %value, "Dropped invalid variable");
                report.success = false;
            }
            report.errors.push(error);
        }

        self.queue.lock().extend(queued);
        report
    }

    /// Number of queued writes.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Write every queued property to the target and commit once.
    ///
    /// When several writes target the same property, the last one wins.
    /// Writes queued while this runs are left for the next flush.
    pub fn flush(&self) -> FlushReport {
        let drained = std::mem::take(&mut *self.queue.lock());
        let mut report = FlushReport::default();
        if drained.is_empty() {
            return report;
        }

        let coalesced: BTreeMap<String, String> = drained.into_iter().collect();
        let mut written = Vec::with_capacity(coalesced.len());

        for (property, value) in coalesced {
            match self.target.set_property(&property, &value) {
                Ok(()) => {
                    self.known_good.write().insert(property.clone(), value);
                    written.push(property);
                    report.committed += 1;
                }
                Err(err) => {
                    let fallback = self
                        .substitute(&property, &value)
                        .filter(|(replacement, _)| {
                            self.target.set_property(&property, replacement).is_ok()
                        });
                    if let Some((_, action)) = fallback {
                        debug!(
                            vars.property = %property,
                            vars.fallback = %action,
                            "Applied fallback value"
                        );
                        written.push(property.clone());
                        report.fallbacks_used.push(property);
                        report.committed += 1;
                    } else {
                        warn!(vars.property = %property, error = %err, "Could not apply variable");
                        report
                            .failures
                            .push(ThemeError::application_failure(&property, &err.to_string()));
                    }
                }
            }
        }

        self.target.commit();
        self.applied.lock().extend(written);
        debug!(
            vars.committed = report.committed,
            vars.fallbacks = report.fallbacks_used.len(),
            vars.failures = report.failures.len(),
            "Flushed theme variables"
        );
        report
    }

    /// Flatten, queue and flush a theme.
    ///
    /// Emits [`ThemeEvent::Applied`] when every property went through clean.
    pub fn apply(&self, theme: &Theme) -> ApplyReport {
        let batch = self.batch_update(self.flatten(theme));
        let flush = self.flush();
        let report = ApplyReport { batch, flush };

        if report.is_clean() {
            if let Some(notifier) = &self.notifier {
                notifier.emit(&ThemeEvent::Applied {
                    id: theme.id.clone(),
                    theme: Box::new(theme.clone()),
                });
            }
        }
        report
    }

    /// Remove every property this layer has written and forget queued writes
    /// and known-good values. Returns how many properties were removed.
    pub fn clear(&self) -> usize {
        let applied = std::mem::take(&mut *self.applied.lock());
        for property in &applied {
            self.target.remove_property(property);
        }
        self.queue.lock().clear();
        self.known_good.write().clear();
        self.target.commit();
        debug!(vars.removed = applied.len(), "Cleared theme variables");
        applied.len()
    }

    /// Flush queued writes on a fixed tick.
    ///
    /// Does nothing outside a tokio runtime. The task ends when the layer is
    /// dropped.
    pub fn start_frame_driver(self: &Arc<Self>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime available, frame driver not started");
            return;
        };
        let layer: Weak<Self> = Arc::downgrade(self);
        let period = Duration::from_millis(self.config.frame_interval_ms.max(1));

        let handle = runtime.spawn(async move {
            let mut timer = tokio::time::interval(period);
            loop {
                timer.tick().await;
                let Some(layer) = layer.upgrade() else {
                    break;
                };
                if layer.pending() > 0 {
                    layer.flush();
                }
            }
        });

        if let Some(previous) = self.frame_driver.lock().replace(handle) {
            previous.abort();
        }
        debug!(vars.frame_interval_ms = self.config.frame_interval_ms, "Frame driver started");
    }

    pub fn stop_frame_driver(&self) {
        if let Some(handle) = self.frame_driver.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for VariableLayer {
    fn drop(&mut self) {
        self.stop_frame_driver();
    }
}

/// Join family names, quoting those with spaces.
fn font_list(families: &[String]) -> String {
    families
        .iter()
        .map(|family| {
            if family.contains(' ') && !family.starts_with(['"', '\'']) {
                format!("\"{family}\"")
            } else {
                family.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> (Arc<InMemoryTarget>, VariableLayer) {
        let target = Arc::new(InMemoryTarget::new());
        let layer = VariableLayer::new(target.clone(), VariableConfig::default());
        (target, layer)
    }

    #[test]
    fn test_flatten_property_names() {
        let (_, layer) = layer();
        let theme = Theme::extract();
        let vars = layer.flatten(&theme);
        assert_eq!(vars["--theme-colors-primary-500"], "#10b981");
        assert_eq!(vars["--theme-colors-semantic-success"], theme.colors.semantic.success);
        assert!(vars["--theme-gradients-hero"].starts_with("linear-gradient(135deg"));
        assert_eq!(vars["--theme-effects-borderRadius-full"], "9999px");
        assert_eq!(
            vars["--theme-typography-fontFamily-mono"],
            "\"JetBrains Mono\", Menlo, monospace"
        );
        assert!(vars.keys().all(|k| k.starts_with("--theme-")));
    }

    #[test]
    fn test_default_theme_applies_clean() {
        let (target, layer) = layer();
        let theme = Theme::extract();
        let expected = layer.flatten(&theme).len();
        let report = layer.apply(&theme);
        assert!(report.is_clean(), "{:?}", report.errors());
        assert_eq!(report.flush.committed, expected);
        assert_eq!(target.len(), expected);
        assert_eq!(target.commits(), 1);
    }

    #[test]
    fn test_batch_is_partial_success() {
        let (target, layer) = layer();
        let report = layer.batch_update([
            ("--theme-colors-primary-500", "#ffffff"),
            ("--theme-colors-primary-600", "not-a-color"),
        ]);
        assert!(!report.success);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field_path(), "--theme-colors-primary-600");
        assert_eq!(layer.pending(), 1);

        layer.flush();
        assert_eq!(target.get_property("--theme-colors-primary-500").as_deref(), Some("#ffffff"));
        assert!(target.get_property("--theme-colors-primary-600").is_none());
    }

    #[test]
    fn test_rejects_non_custom_property_names() {
        let (_, layer) = layer();
        assert!(!layer.is_valid("color", "#fff"));
        assert!(!layer.is_valid("--", "#fff"));
        assert!(layer.is_valid("--brand", "#fff"));
    }

    #[test]
    fn test_writes_coalesce_last_wins() {
        let (target, layer) = layer();
        layer.batch_update([("--theme-colors-accent-500", "#111111")]);
        layer.batch_update([("--theme-colors-accent-500", "#222222")]);
        assert_eq!(layer.pending(), 2);

        let report = layer.flush();
        assert_eq!(report.committed, 1);
        assert_eq!(target.commits(), 1);
        assert_eq!(target.get_property("--theme-colors-accent-500").as_deref(), Some("#222222"));
        assert_eq!(layer.pending(), 0);
        assert_eq!(layer.flush(), FlushReport::default());
    }

    #[test]
    fn test_fallback_chain_substitutes_known_good() {
        let (target, layer) = layer();
        layer.register_fallback(
            "--theme-colors-primary-500",
            vec!["--theme-colors-primary-600".to_string()],
        );
        layer.batch_update([("--theme-colors-primary-600", "#059669")]);
        layer.flush();

        let report = layer.batch_update([("--theme-colors-primary-500", "nope")]);
        assert!(report.success);
        assert_eq!(report.substituted, 1);
        assert_eq!(
            report.errors[0].fallback_action.as_deref(),
            Some("fallback:--theme-colors-primary-600")
        );
        layer.flush();
        assert_eq!(target.get_property("--theme-colors-primary-500").as_deref(), Some("#059669"));
    }

    #[test]
    fn test_invalid_gradient_falls_back_to_first_stop() {
        let (target, layer) = layer();
        let report = layer.batch_update([(
            "--theme-gradients-hero",
            "linear-gradient(to right, #abcdef 0%)",
        )]);
        assert_eq!(report.substituted, 1);
        layer.flush();
        assert_eq!(target.get_property("--theme-gradients-hero").as_deref(), Some("#abcdef"));
    }

    #[test]
    fn test_refused_write_uses_fallback() {
        let (target, layer) = layer();
        let gradient = "linear-gradient(to right, #047857 0%, #065f46 100%)";
        target.fail_value(gradient);
        layer.batch_update([("--theme-gradients-button", gradient)]);
        let report = layer.flush();
        assert_eq!(report.fallbacks_used, vec!["--theme-gradients-button"]);
        assert!(report.failures.is_empty());
        assert_eq!(target.get_property("--theme-gradients-button").as_deref(), Some("#047857"));
    }

    #[test]
    fn test_refused_write_without_fallback_fails() {
        let (target, layer) = layer();
        target.fail_property("--theme-colors-neutral-50");
        let report = layer.apply(&Theme::extract());
        assert!(!report.is_clean());
        assert_eq!(report.flush.failures.len(), 1);
        assert_eq!(report.flush.failures[0].code, ErrorCode::ApplicationFailure);
        assert_eq!(report.flush.failures[0].field_path(), "--theme-colors-neutral-50");
    }

    #[test]
    fn test_validation_is_memoized() {
        let (_, layer) = layer();
        assert!(layer.is_valid("--theme-colors-primary-500", "#fff"));
        assert!(layer.is_valid("--theme-colors-primary-500", "#fff"));
        assert_eq!(layer.validation_cache_len(), 1);
    }

    #[test]
    fn test_clear_removes_applied_properties() {
        let (target, layer) = layer();
        layer.apply(&Theme::extract());
        assert!(layer.known_good("--theme-colors-primary-500").is_some());
        let removed = layer.clear();
        assert!(removed > 0);
        assert!(target.is_empty());
        assert!(layer.known_good("--theme-colors-primary-500").is_none());
    }

    #[test]
    fn test_apply_notifies_listeners() {
        let notifier = Arc::new(ChangeNotifier::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        notifier.on_change(move |event| sink.lock().push(event.clone()));

        let layer = VariableLayer::new(Arc::new(InMemoryTarget::new()), VariableConfig::default())
            .with_notifier(notifier);
        layer.apply(&Theme::extract());

        let events = seen.lock();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ThemeEvent::Applied { id, .. } if id == "default"));
    }

    #[tokio::test]
    async fn test_frame_driver_flushes_queue() {
        let target = Arc::new(InMemoryTarget::new());
        let layer = Arc::new(VariableLayer::new(target.clone(), VariableConfig::default()));
        layer.start_frame_driver();
        layer.batch_update([("--theme-colors-primary-500", "#123456")]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(layer.pending(), 0);
        assert_eq!(target.get_property("--theme-colors-primary-500").as_deref(), Some("#123456"));
        layer.stop_frame_driver();
    }
}

//! The theme engine: validation, recovery, application, caching and storage
//! behind one handle.
//!
//! # Example
//!
//! ```rust
//! use tincture::ThemeEngine;
//! use serde_json::json;
//!
//! let engine = ThemeEngine::builder().build();
//! let outcome = engine.apply_theme(&json!({
//!     "id": "ocean",
//!     "name": "Ocean",
//!     "colors": { "primary": { "50": "not-a-color" } }
//! }));
//! assert!(outcome.recovered);
//! assert_eq!(outcome.theme.colors.primary.s50, tincture::Theme::extract().colors.primary.s50);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ThemeCache};
use crate::config::EngineConfig;
use crate::error::{EngineError, ThemeError};
use crate::merge::{merge_document, theme_from_merged};
use crate::model::{Theme, ThemeMetadata};
use crate::notify::{ChangeNotifier, ListenerId, ThemeEvent};
use crate::recovery::{RecoveryContext, RecoveryEngine, RecoveryOutcome, RecoveryStrategy};
use crate::storage::{KeyValueStore, MemoryStorage, ThemeStorage};
use crate::validator::{
    ValidationIssue, ValidationOptions, ValidationResult, validate, validate_document,
};
use crate::vars::{InMemoryTarget, RenderTarget, VariableLayer};

/// Cache priority of explicitly applied themes.
pub const APPLIED_PRIORITY: f64 = 10.0;

/// Cache priority of loaded and saved themes.
pub const DEFAULT_PRIORITY: f64 = 1.0;

/// Lifecycle of a theme id within the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Applied,
    Failed,
}

/// Result of [`ThemeEngine::apply_theme`] and [`ThemeEngine::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    /// The theme that was applied.
    pub theme: Theme,
    /// Recovery replaced some or all of the input.
    pub recovered: bool,
    /// Errors found along the way, with the fallback action taken for each.
    pub errors: Vec<ThemeError>,
    /// Validation warnings on the input. They never block application.
    pub warnings: Vec<ValidationIssue>,
}

/// Builder for [`ThemeEngine`].
#[derive(Default)]
pub struct ThemeEngineBuilder {
    config: EngineConfig,
    storage: Option<Arc<dyn ThemeStorage>>,
    target: Option<Arc<dyn RenderTarget>>,
    cache_store: Option<Arc<dyn KeyValueStore>>,
    notifier: Option<Arc<ChangeNotifier>>,
    default_theme: Option<Theme>,
    strategies: Vec<Box<dyn RecoveryStrategy>>,
}

impl ThemeEngineBuilder {
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Authoritative storage. Defaults to [`MemoryStorage`].
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn ThemeStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Where variables are committed. Defaults to [`InMemoryTarget`].
    #[must_use]
    pub fn target(mut self, target: Arc<dyn RenderTarget>) -> Self {
        self.target = Some(target);
        self
    }

    /// Key-value store for the cache persistence side-channel.
    #[must_use]
    pub fn cache_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    /// Share a notifier with other components.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Theme that partial documents are completed from and recovery restores
    /// from. Defaults to [`Theme::extract`].
    #[must_use]
    pub fn default_theme(mut self, theme: Theme) -> Self {
        self.default_theme = Some(theme);
        self
    }

    /// Extra recovery strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: Box<dyn RecoveryStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn build(self) -> ThemeEngine {
        let config = self.config;
        let notifier = self.notifier.unwrap_or_default();
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let target = self
            .target
            .unwrap_or_else(|| Arc::new(InMemoryTarget::new()));
        let cache = match self.cache_store {
            Some(store) => ThemeCache::with_store(config.cache.clone(), store),
            None => ThemeCache::new(config.cache.clone()),
        };
        let variables = VariableLayer::new(target, config.variables.clone())
            .with_notifier(Arc::clone(&notifier));

        let mut recovery = RecoveryEngine::new(config.recovery);
        for strategy in self.strategies {
            recovery.register(strategy);
        }

        info!(
            cache.max_size = config.cache.max_size,
            cache.strategy = ?config.cache.strategy,
            validation.strict = config.validation.strict,
            "Theme engine initialized"
        );

        ThemeEngine {
            default_theme: self.default_theme.unwrap_or_else(Theme::extract),
            emergency: Theme::emergency(),
            cache: Arc::new(cache),
            recovery: RwLock::new(recovery),
            variables: Arc::new(variables),
            storage,
            notifier,
            states: RwLock::new(HashMap::new()),
            config,
        }
    }
}

/// Validates, recovers, applies, caches and stores themes.
pub struct ThemeEngine {
    config: EngineConfig,
    default_theme: Theme,
    emergency: Theme,
    cache: Arc<ThemeCache>,
    recovery: RwLock<RecoveryEngine>,
    variables: Arc<VariableLayer>,
    storage: Arc<dyn ThemeStorage>,
    notifier: Arc<ChangeNotifier>,
    states: RwLock<HashMap<String, ThemeState>>,
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("recovery", &*self.recovery.read())
            .finish_non_exhaustive()
    }
}

impl ThemeEngine {
    pub fn builder() -> ThemeEngineBuilder {
        ThemeEngineBuilder::default()
    }

    pub fn new(
        config: EngineConfig,
        storage: Arc<dyn ThemeStorage>,
        target: Arc<dyn RenderTarget>,
    ) -> Self {
        Self::builder()
            .config(config)
            .storage(storage)
            .target(target)
            .build()
    }

    /// Start the cache sweeper and the variable frame driver.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_background_tasks(&self) {
        self.cache.start_sweeper();
        self.variables.start_frame_driver();
    }

    pub fn stop_background_tasks(&self) {
        self.cache.stop_sweeper();
        self.variables.stop_frame_driver();
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn default_theme(&self) -> &Theme {
        &self.default_theme
    }

    pub fn cache(&self) -> &Arc<ThemeCache> {
        &self.cache
    }

    pub fn variables(&self) -> &Arc<VariableLayer> {
        &self.variables
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    /// Current lifecycle state of `id`.
    pub fn state(&self, id: &str) -> ThemeState {
        self.states.read().get(id).copied().unwrap_or_default()
    }

    fn set_state(&self, id: &str, state: ThemeState) {
        self.states.write().insert(id.to_string(), state);
    }

    /// Validate a typed theme, with the engine's options unless overridden.
    pub fn validate_theme(
        &self,
        theme: &Theme,
        options: Option<&ValidationOptions>,
    ) -> ValidationResult {
        validate(theme, options.unwrap_or(&self.config.validation))
    }

    /// Validate an untyped document as-is, without completing it from the
    /// default.
    pub fn validate_document(
        &self,
        document: &Value,
        options: Option<&ValidationOptions>,
    ) -> ValidationResult {
        validate_document(document, options.unwrap_or(&self.config.validation))
    }

    fn recover(&self, theme: &Theme, errors: Vec<ThemeError>) -> RecoveryOutcome {
        let ctx = RecoveryContext::new(&self.default_theme, &self.emergency)
            .with_cache(&self.cache)
            .with_variables(&self.variables);
        let outcome = self.recovery.read().handle(theme, errors, &ctx);
        if outcome.recovered {
            self.notifier.emit(&ThemeEvent::Recovered {
                id: theme.id.clone(),
                strategies: outcome.actions(),
            });
        }
        outcome
    }

    /// Apply a theme document, completing missing sections from the default.
    ///
    /// Never fails: invalid input is recovered, and in the worst case the
    /// emergency theme is applied.
    pub fn apply_theme(&self, document: &Value) -> ApplyOutcome {
        let requested = document.get("id").and_then(Value::as_str).map(str::to_string);
        if let Some(id) = &requested {
            self.set_state(id, ThemeState::Loading);
        }

        let merged = merge_document(document, &self.default_theme);
        let result = validate_document(&merged, &self.config.validation);
        let theme = if merged.is_object() {
            theme_from_merged(&merged, &self.default_theme)
        } else {
            self.default_theme.clone()
        };

        self.finish_apply(requested.as_deref(), theme, result)
    }

    /// Apply a typed theme. Never fails.
    pub fn apply(&self, theme: &Theme) -> ApplyOutcome {
        self.set_state(&theme.id, ThemeState::Loading);
        let result = validate(theme, &self.config.validation);
        self.finish_apply(Some(theme.id.as_str()), theme.clone(), result)
    }

    /// Recover, push variables, cache and settle states.
    ///
    /// `requested` is the id the caller asked for. Its state is settled too
    /// when recovery applies a different theme.
    fn finish_apply(
        &self,
        requested: Option<&str>,
        theme: Theme,
        result: ValidationResult,
    ) -> ApplyOutcome {
        let mut theme = theme;
        let mut errors = Vec::new();
        let mut recovered = false;

        if !result.is_valid {
            let outcome = self.recover(&theme, ThemeError::from_result(&result));
            theme = outcome.theme;
            recovered = outcome.recovered;
            errors = outcome.errors;
        }

        let report = self.variables.apply(&theme);
        errors.extend(report.batch.errors.iter().cloned());
        let mut state = ThemeState::Applied;

        if !report.flush.failures.is_empty() {
            let outcome = self.recover(&theme, report.flush.failures.clone());
            errors.extend(outcome.errors);
            if outcome.recovered {
                theme = outcome.theme;
                recovered = true;
                let retry = self.variables.apply(&theme);
                if !retry.flush.failures.is_empty() {
                    warn!(
                        theme.id = %theme.id,
                        vars.failures = retry.flush.failures.len(),
                        "Theme variables could not be fully applied"
                    );
                    errors.extend(retry.flush.failures);
                    state = ThemeState::Failed;
                }
            } else {
                state = ThemeState::Failed;
            }
        }

        if state == ThemeState::Applied {
            self.cache.set(&theme.id, &theme, APPLIED_PRIORITY);
        }
        self.set_state(&theme.id, state);
        if let Some(id) = requested.filter(|id| *id != theme.id) {
            let requested_state = if theme.is_emergency() {
                ThemeState::Failed
            } else {
                state
            };
            self.set_state(id, requested_state);
        }
        info!(
            theme.id = %theme.id,
            theme.recovered = recovered,
            theme.errors = errors.len(),
            theme.warnings = result.warnings.len(),
            "Theme applied"
        );

        ApplyOutcome {
            theme,
            recovered,
            errors,
            warnings: result.warnings,
        }
    }

    /// Load a theme by id: cache first, then storage.
    ///
    /// Never fails. A missing theme goes through recovery with a
    /// `THEME_LOAD_FAILED` error and the result is cached under `id`. A
    /// storage failure is recovered but not cached.
    pub async fn load_theme(&self, id: &str) -> Theme {
        if let Some(theme) = self.cache.get(id) {
            debug!(theme.id = %id, "Theme served from cache");
            self.set_state(id, ThemeState::Loaded);
            self.notifier.emit(&ThemeEvent::Loaded {
                id: id.to_string(),
                from_cache: true,
            });
            return theme;
        }

        self.set_state(id, ThemeState::Loading);
        let base = self.default_theme.clone().renamed(id, id);

        match self.storage.load(id).await {
            Ok(Some(theme)) => {
                let result = validate(&theme, &self.config.validation);
                let theme = if result.is_valid {
                    theme
                } else {
                    self.recover(&theme, ThemeError::from_result(&result)).theme
                };
                self.cache.set(id, &theme, DEFAULT_PRIORITY);
                self.set_state(id, ThemeState::Loaded);
                self.notifier.emit(&ThemeEvent::Loaded {
                    id: id.to_string(),
                    from_cache: false,
                });
                theme
            }
            Ok(None) => {
                warn!(theme.id = %id, "Theme not found in storage");
                let outcome = self.recover(&base, vec![ThemeError::load_failed(id)]);
                self.cache.set(id, &outcome.theme, DEFAULT_PRIORITY);
                self.set_state(id, ThemeState::Failed);
                outcome.theme
            }
            Err(err) => {
                warn!(theme.id = %id, error = %err, "Storage failed to load theme");
                let outcome = self.recover(&base, vec![ThemeError::storage_failure(&err)]);
                self.set_state(id, ThemeState::Failed);
                outcome.theme
            }
        }
    }

    /// Validate and persist a theme.
    ///
    /// # Errors
    /// Returns [`EngineError::Validation`] if the theme is invalid. Nothing is
    /// recovered: the caller must fix it and resubmit. Returns
    /// [`EngineError::Storage`] if storage rejects the write.
    pub async fn save_theme(&self, theme: &Theme) -> Result<String, EngineError> {
        let result = validate(theme, &self.config.validation);
        if !result.is_valid {
            warn!(
                theme.id = %theme.id,
                validation.errors = result.errors.len(),
                "Refusing to save invalid theme"
            );
            return Err(EngineError::Validation(Box::new(result)));
        }

        let id = self.storage.save(theme).await.inspect_err(|err| {
            warn!(theme.id = %theme.id, error = %err, "Storage failed to save theme");
        })?;
        self.cache.set(&id, theme, DEFAULT_PRIORITY);
        self.notifier.emit(&ThemeEvent::Saved { id: id.clone() });
        info!(theme.id = %id, "Theme saved");
        Ok(id)
    }

    /// Delete a theme from storage and the cache.
    ///
    /// # Errors
    /// Returns [`EngineError::Storage`] if storage fails.
    pub async fn delete_theme(&self, id: &str) -> Result<bool, EngineError> {
        let deleted = self.storage.delete(id).await?;
        self.cache.remove(id);
        self.states.write().remove(id);
        debug!(theme.id = %id, deleted, "Theme deleted");
        Ok(deleted)
    }

    /// Metadata of every stored theme.
    ///
    /// # Errors
    /// Returns [`EngineError::Storage`] if storage fails.
    pub async fn list_themes(&self) -> Result<Vec<ThemeMetadata>, EngineError> {
        Ok(self.storage.list().await?)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn on_change<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&ThemeEvent) + Send + Sync + 'static,
    {
        self.notifier.on_change(callback)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    pub fn register_strategy(&self, strategy: Box<dyn RecoveryStrategy>) {
        self.recovery.write().register(strategy);
    }

    pub fn register_fallback(&self, id: impl Into<String>, theme: Theme) {
        self.recovery.read().register_fallback(id, theme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_document_is_completed() {
        let engine = ThemeEngine::builder().build();
        let outcome = engine.apply_theme(&json!({
            "id": "t1",
            "name": "T",
            "colors": { "primary": { "500": "#10b981", "100": "#ecfdf5", "800": "#000000" } }
        }));
        assert_eq!(outcome.theme.id, "t1-theme");
        assert_eq!(outcome.theme.colors.primary.s500, "#10b981");
        assert_eq!(outcome.theme.gradients.hero, Theme::extract().gradients.hero);
        assert_eq!(outcome.errors[0].fallback_action.as_deref(), Some("fix-identity"));
        assert_eq!(engine.state("t1"), ThemeState::Applied);
        assert_eq!(engine.state("t1-theme"), ThemeState::Applied);
        assert!(engine.cache().peek("t1-theme").is_some());
    }

    #[test]
    fn test_requested_id_settles_when_another_theme_is_applied() {
        let target = Arc::new(InMemoryTarget::new());
        target.fail_value("#f0f9ff");
        let engine = ThemeEngine::builder()
            .target(Arc::clone(&target) as Arc<dyn RenderTarget>)
            .build();
        let mut ocean = Theme::extract().renamed("ocean", "Ocean");
        ocean.colors.neutral.s50 = "#f0f9ff".to_string();

        let outcome = engine.apply(&ocean);
        assert!(outcome.recovered);
        assert_eq!(outcome.theme.id, "default");
        assert_eq!(engine.state("ocean"), ThemeState::Applied);
        assert_eq!(engine.state("default"), ThemeState::Applied);
    }

    #[test]
    fn test_failed_apply_is_not_cached() {
        let target = Arc::new(InMemoryTarget::new());
        target.fail_property("--theme-colors-neutral-50");
        let engine = ThemeEngine::builder()
            .target(Arc::clone(&target) as Arc<dyn RenderTarget>)
            .build();

        let outcome = engine.apply(&Theme::extract());
        assert!(!outcome.errors.is_empty());
        assert_eq!(engine.state("default"), ThemeState::Failed);
        assert!(engine.cache().peek("default").is_none());
    }

    #[test]
    fn test_non_object_document_applies_emergency() {
        let engine = ThemeEngine::builder().build();
        let outcome = engine.apply_theme(&json!("not a theme"));
        assert!(outcome.recovered);
        assert!(outcome.theme.is_emergency());
        assert_eq!(outcome.errors[0].fallback_action.as_deref(), Some("emergency-fallback"));
    }

    #[test]
    fn test_applied_themes_get_boosted_priority() {
        let engine = ThemeEngine::builder().build();
        engine.apply(&Theme::extract());
        let entry = engine.cache().entry("default").expect("cached");
        assert!((entry.priority - APPLIED_PRIORITY).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_id_state_is_unloaded() {
        let engine = ThemeEngine::builder().build();
        assert_eq!(engine.state("nope"), ThemeState::Unloaded);
    }
}

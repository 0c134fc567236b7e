//! Error recovery: turning a failed theme into a usable one.
//!
//! A [`RecoveryEngine`] walks a priority-ordered list of
//! [`RecoveryStrategy`]s for each error, most severe error first. Every
//! successful step feeds its output into the next, so strategies must only
//! touch the part of the theme their error is about.
//!
//! Built-in strategies, highest priority first:
//!
//! | Strategy | Handles |
//! |---|---|
//! | `fix-identity` | bad id or name: normalize it in place, padding a short id |
//! | `fix-colors`, `fix-gradients` | invalid field in that section: copy it from the default |
//! | `fix-effects`, `fix-typography`, `fix-metadata` | the same, for those sections |
//! | `cache-lookup` | load, storage and application failures: last cached copy |
//! | `fallback-theme` | registered per-id fallback, or the emergency theme for a missing theme |
//! | `theme-regeneration` | any structural or value error: the default, keeping id and name |
//! | `css-reset` | application failures: clear runtime variables, then the default |
//! | `storage-recovery` | storage failures: purge the persisted cache entry, then the default |
//!
//! Recovery never fails. If the result still does not validate, the
//! emergency theme is returned.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::ThemeCache;
use crate::error::{ErrorCode, ThemeError};
use crate::model::Theme;
use crate::path::ThemePath;
use crate::validator::{MAX_NAME_LEN, ValidationOptions, is_valid_theme_id, validate};
use crate::vars::VariableLayer;

/// Recovery behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryOptions {
    /// Return the emergency theme as soon as a non-recoverable error is seen.
    pub use_default_theme: bool,
    /// Keep the partially repaired theme when no strategy handles an error.
    /// When off, the default theme is substituted.
    pub preserve_partial_theme: bool,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self {
            use_default_theme: true,
            preserve_partial_theme: true,
        }
    }
}

/// Collaborators available to strategies.
#[derive(Clone, Copy)]
pub struct RecoveryContext<'a> {
    pub default_theme: &'a Theme,
    pub emergency: &'a Theme,
    pub cache: Option<&'a ThemeCache>,
    pub variables: Option<&'a VariableLayer>,
}

impl<'a> RecoveryContext<'a> {
    pub const fn new(default_theme: &'a Theme, emergency: &'a Theme) -> Self {
        Self {
            default_theme,
            emergency,
            cache: None,
            variables: None,
        }
    }

    #[must_use]
    pub const fn with_cache(mut self, cache: &'a ThemeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub const fn with_variables(mut self, variables: &'a VariableLayer) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// One way of repairing or replacing a theme.
///
/// `recover` returns `None` when it cannot help after all; the engine then
/// tries the next strategy.
pub trait RecoveryStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Higher runs first.
    fn priority(&self) -> i32;

    fn can_recover(&self, error: &ThemeError) -> bool;

    fn recover(
        &self,
        theme: &Theme,
        error: &ThemeError,
        ctx: &RecoveryContext<'_>,
    ) -> Option<Theme>;
}

const fn is_content_error(code: ErrorCode) -> bool {
    matches!(
        code,
        ErrorCode::Structural | ErrorCode::CssValue | ErrorCode::Accessibility
    )
}

/// Restores the offending part of one section from the default theme.
#[derive(Debug, Clone, Copy)]
pub struct SectionRepair {
    name: &'static str,
    section: &'static str,
    priority: i32,
}

impl SectionRepair {
    pub const fn colors() -> Self {
        Self {
            name: "fix-colors",
            section: "colors",
            priority: 110,
        }
    }

    pub const fn gradients() -> Self {
        Self {
            name: "fix-gradients",
            section: "gradients",
            priority: 105,
        }
    }

    pub const fn effects() -> Self {
        Self {
            name: "fix-effects",
            section: "effects",
            priority: 100,
        }
    }

    pub const fn typography() -> Self {
        Self {
            name: "fix-typography",
            section: "typography",
            priority: 95,
        }
    }

    pub const fn metadata() -> Self {
        Self {
            name: "fix-metadata",
            section: "metadata",
            priority: 92,
        }
    }
}

impl RecoveryStrategy for SectionRepair {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_recover(&self, error: &ThemeError) -> bool {
        is_content_error(error.code)
            && ThemePath::resolve(error.field_path())
                .is_some_and(|path| path.section() == self.section)
    }

    fn recover(
        &self,
        theme: &Theme,
        error: &ThemeError,
        ctx: &RecoveryContext<'_>,
    ) -> Option<Theme> {
        let path = ThemePath::resolve(error.field_path())?;
        let mut fixed = theme.clone();
        path.copy_from(&mut fixed, ctx.default_theme);
        debug!(theme.id = %theme.id, recovery.path = %path, "Restored field from default");
        Some(fixed)
    }
}

/// Normalizes an id to the allowed characters, padding it when too short.
/// Only an id with no usable characters is replaced.
fn normalize_id(id: &str) -> String {
    let mut cleaned: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    if cleaned.is_empty() {
        return "recovered-theme".to_string();
    }
    if !is_valid_theme_id(&cleaned) {
        cleaned.push_str("-theme");
    }
    cleaned
}

fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        "Recovered Theme".to_string()
    } else {
        trimmed.chars().take(MAX_NAME_LEN).collect()
    }
}

/// Repairs a bad `id` or `name` in place, leaving the rest of the theme alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRepair;

impl RecoveryStrategy for IdentityRepair {
    fn name(&self) -> &str {
        "fix-identity"
    }

    fn priority(&self) -> i32 {
        115
    }

    fn can_recover(&self, error: &ThemeError) -> bool {
        error.code == ErrorCode::Structural
            && matches!(
                ThemePath::resolve(error.field_path()),
                Some(ThemePath::Id | ThemePath::Name)
            )
    }

    fn recover(
        &self,
        theme: &Theme,
        error: &ThemeError,
        _ctx: &RecoveryContext<'_>,
    ) -> Option<Theme> {
        let mut fixed = theme.clone();
        match ThemePath::resolve(error.field_path())? {
            ThemePath::Id => fixed.id = normalize_id(&theme.id),
            ThemePath::Name => fixed.name = normalize_name(&theme.name),
            _ => return None,
        }
        debug!(
            theme.id = %theme.id,
            recovery.id = %fixed.id,
            recovery.name = %fixed.name,
            "Normalized theme identity"
        );
        Some(fixed)
    }
}

/// Reuses the last cached copy of the same theme.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheLookup;

impl RecoveryStrategy for CacheLookup {
    fn name(&self) -> &str {
        "cache-lookup"
    }

    fn priority(&self) -> i32 {
        90
    }

    fn can_recover(&self, error: &ThemeError) -> bool {
        matches!(
            error.code,
            ErrorCode::ThemeLoadFailed | ErrorCode::StorageFailure | ErrorCode::ApplicationFailure
        )
    }

    fn recover(
        &self,
        theme: &Theme,
        _error: &ThemeError,
        ctx: &RecoveryContext<'_>,
    ) -> Option<Theme> {
        ctx.cache?.peek(&theme.id)
    }
}

/// Per-id fallback themes, shared with the [`RecoveryEngine`] that
/// registers them.
#[derive(Debug, Clone, Default)]
pub struct FallbackTheme {
    fallbacks: Arc<RwLock<HashMap<String, Theme>>>,
}

impl RecoveryStrategy for FallbackTheme {
    fn name(&self) -> &str {
        "fallback-theme"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn can_recover(&self, error: &ThemeError) -> bool {
        matches!(
            error.code,
            ErrorCode::ThemeLoadFailed | ErrorCode::StorageFailure | ErrorCode::ApplicationFailure
        )
    }

    fn recover(
        &self,
        theme: &Theme,
        error: &ThemeError,
        ctx: &RecoveryContext<'_>,
    ) -> Option<Theme> {
        if let Some(fallback) = self.fallbacks.read().get(&theme.id) {
            return Some(fallback.clone());
        }
        (error.code == ErrorCode::ThemeLoadFailed).then(|| ctx.emergency.clone())
    }
}

/// Rebuilds the theme from the default, keeping its id and name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThemeRegeneration;

impl RecoveryStrategy for ThemeRegeneration {
    fn name(&self) -> &str {
        "theme-regeneration"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn can_recover(&self, error: &ThemeError) -> bool {
        matches!(error.code, ErrorCode::Structural | ErrorCode::CssValue)
    }

    fn recover(
        &self,
        theme: &Theme,
        _error: &ThemeError,
        ctx: &RecoveryContext<'_>,
    ) -> Option<Theme> {
        Some(
            ctx.default_theme
                .clone()
                .renamed(normalize_id(&theme.id), normalize_name(&theme.name)),
        )
    }
}

/// Clears every runtime variable, then falls back to the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssReset;

impl RecoveryStrategy for CssReset {
    fn name(&self) -> &str {
        "css-reset"
    }

    fn priority(&self) -> i32 {
        60
    }

    fn can_recover(&self, error: &ThemeError) -> bool {
        error.code == ErrorCode::ApplicationFailure
    }

    fn recover(
        &self,
        _theme: &Theme,
        _error: &ThemeError,
        ctx: &RecoveryContext<'_>,
    ) -> Option<Theme> {
        if let Some(variables) = ctx.variables {
            variables.clear();
        }
        Some(ctx.default_theme.clone())
    }
}

/// Purges the persisted cache entry for the theme, then falls back to the
/// default.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageRecovery;

impl RecoveryStrategy for StorageRecovery {
    fn name(&self) -> &str {
        "storage-recovery"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn can_recover(&self, error: &ThemeError) -> bool {
        error.code == ErrorCode::StorageFailure
    }

    fn recover(
        &self,
        theme: &Theme,
        _error: &ThemeError,
        ctx: &RecoveryContext<'_>,
    ) -> Option<Theme> {
        if let Some(cache) = ctx.cache {
            cache.purge_persisted(&theme.id);
        }
        Some(ctx.default_theme.clone())
    }
}

/// Result of [`RecoveryEngine::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryOutcome {
    pub theme: Theme,
    /// Whether the returned theme differs from the input because of recovery.
    pub recovered: bool,
    /// The input errors, most severe first, with `fallback_action` filled in
    /// for those that were handled.
    pub errors: Vec<ThemeError>,
}

impl RecoveryOutcome {
    /// Names of the fallback actions taken, in order.
    pub fn actions(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter_map(|error| error.fallback_action.clone())
            .collect()
    }
}

/// Priority-ordered strategy chain.
pub struct RecoveryEngine {
    strategies: Vec<Box<dyn RecoveryStrategy>>,
    fallbacks: Arc<RwLock<HashMap<String, Theme>>>,
    options: RecoveryOptions,
}

impl std::fmt::Debug for RecoveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryEngine")
            .field("strategies", &self.strategy_names())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for RecoveryEngine {
    fn default() -> Self {
        Self::new(RecoveryOptions::default())
    }
}

impl RecoveryEngine {
    /// Engine with the built-in strategies.
    pub fn new(options: RecoveryOptions) -> Self {
        let fallbacks = Arc::new(RwLock::new(HashMap::new()));
        let mut engine = Self {
            strategies: Vec::new(),
            fallbacks: Arc::clone(&fallbacks),
            options,
        };
        engine.register(Box::new(IdentityRepair));
        engine.register(Box::new(SectionRepair::colors()));
        engine.register(Box::new(SectionRepair::gradients()));
        engine.register(Box::new(SectionRepair::effects()));
        engine.register(Box::new(SectionRepair::metadata()));
        engine.register(Box::new(SectionRepair::typography()));
        engine.register(Box::new(CacheLookup));
        engine.register(Box::new(FallbackTheme { fallbacks }));
        engine.register(Box::new(ThemeRegeneration));
        engine.register(Box::new(CssReset));
        engine.register(Box::new(StorageRecovery));
        engine
    }

    pub const fn options(&self) -> RecoveryOptions {
        self.options
    }

    /// Add a strategy. Strategies stay sorted by descending priority; equal
    /// priorities keep registration order.
    pub fn register(&mut self, strategy: Box<dyn RecoveryStrategy>) {
        debug!(
            recovery.strategy = strategy.name(),
            recovery.priority = strategy.priority(),
            "Recovery strategy registered"
        );
        self.strategies.push(strategy);
        self.strategies
            .sort_by_key(|strategy| std::cmp::Reverse(strategy.priority()));
    }

    /// Theme to use when `id` cannot be loaded or applied.
    pub fn register_fallback(&self, id: impl Into<String>, theme: Theme) {
        self.fallbacks.write().insert(id.into(), theme);
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Repair `theme` for every error in `errors`.
    pub fn handle(
        &self,
        theme: &Theme,
        mut errors: Vec<ThemeError>,
        ctx: &RecoveryContext<'_>,
    ) -> RecoveryOutcome {
        errors.sort_by(|a, b| b.severity.cmp(&a.severity));
        let mut current = theme.clone();
        let mut recovered = false;

        for error in &mut errors {
            if !error.recoverable && self.options.use_default_theme {
                warn!(
                    theme.id = %theme.id,
                    error.code = %error.code,
                    error.field = error.field_path(),
                    "Non-recoverable theme error, using emergency theme"
                );
                error.fallback_action = Some("emergency-fallback".to_string());
                return RecoveryOutcome {
                    theme: ctx.emergency.clone(),
                    recovered: true,
                    errors,
                };
            }

            let handled = self.strategies.iter().find_map(|strategy| {
                if !strategy.can_recover(error) {
                    return None;
                }
                strategy
                    .recover(&current, error, ctx)
                    .map(|fixed| (strategy.name().to_string(), fixed))
            });

            match handled {
                Some((name, fixed)) => {
                    info!(
                        theme.id = %theme.id,
                        error.code = %error.code,
                        error.field = error.field_path(),
                        recovery.strategy = %name,
                        "Recovered from theme error"
                    );
                    error.fallback_action = Some(name);
                    current = fixed;
                    recovered = true;
                }
                None if !self.options.preserve_partial_theme => {
                    warn!(
                        theme.id = %theme.id,
                        error.code = %error.code,
                        "No strategy handled theme error, using default theme"
                    );
                    error.fallback_action = Some("default-theme".to_string());
                    current = ctx.default_theme.clone();
                    recovered = true;
                }
                None => {
                    warn!(
                        theme.id = %theme.id,
                        error.code = %error.code,
                        error.field = error.field_path(),
                        "No strategy handled theme error"
                    );
                }
            }
        }

        if !validate(&current, &ValidationOptions::default()).is_valid {
            warn!(
                theme.id = %theme.id,
                "Recovered theme is still invalid, using emergency theme"
            );
            current = ctx.emergency.clone();
            recovered = true;
        }

        RecoveryOutcome {
            theme: current,
            recovered,
            errors,
        }
    }
}

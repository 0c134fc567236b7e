#![forbid(unsafe_code)]
// Allow these clippy lints for API ergonomics
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::use_self)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::new_without_default)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::if_not_else)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::significant_drop_tightening)]

//! # Tincture
//!
//! A theme engine: validates, caches, repairs and applies theme documents
//! (colors, gradients, typography, effects) as CSS custom properties.
//!
//! The pipeline behind [`ThemeEngine::apply_theme`]:
//!
//! 1. **Merge**: missing sections are completed from the built-in default.
//! 2. **Validate**: structural, CSS-value, accessibility (WCAG contrast) and
//!    color-harmony checks.
//! 3. **Recover**: invalid themes go through a priority-ordered chain of
//!    recovery strategies. The worst case is the emergency theme, never an
//!    error.
//! 4. **Apply**: the theme is flattened into `--theme-*` variables and
//!    committed to a render target in one batch.
//! 5. **Cache**: the result lands in a bounded, eviction-aware cache.
//!
//! ## Quick Start
//!
//! ```rust
//! use tincture::{Theme, ThemeEngine, validate, ValidationOptions};
//! use serde_json::json;
//!
//! let engine = ThemeEngine::builder().build();
//!
//! // Partial documents are completed from the default theme.
//! let outcome = engine.apply_theme(&json!({
//!     "id": "sunset",
//!     "name": "Sunset",
//!     "colors": { "accent": { "500": "#f97316" } }
//! }));
//! assert_eq!(outcome.theme.id, "sunset");
//! assert!(!outcome.recovered);
//!
//! // Validation is a pure function.
//! let result = validate(&Theme::extract(), &ValidationOptions::default());
//! assert!(result.is_valid);
//! ```
//!
//! ## Loading and saving
//!
//! Storage is an async collaborator ([`storage::ThemeStorage`]).
//! `load_theme` never fails; `save_theme` refuses invalid themes.
//!
//! ```rust,ignore
//! let engine = ThemeEngine::builder()
//!     .storage(Arc::new(JsonDirStorage::new("./themes")))
//!     .build();
//! engine.save_theme(&theme).await?;
//! let theme = engine.load_theme("sunset").await;
//! ```

pub mod accessibility;
pub mod builtin;
pub mod cache;
pub mod color;
pub mod compress;
pub mod config;
pub mod css;
pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod notify;
pub mod path;
pub mod recovery;
pub mod storage;
pub mod validator;
pub mod vars;

// Re-exports
pub use accessibility::{
    AccessibilityReport, ContrastCheck, HealthGrade, ThemeHealth, WcagLevel, accessibility_score,
    contrast_ratio, contrast_ratio_str, relative_luminance, theme_health,
};
pub use builtin::{DEFAULT_THEME_ID, EMERGENCY_THEME_ID};
pub use cache::{CacheConfig, CacheStats, EvictionStrategy, ThemeCache};
pub use color::{Rgba, is_valid_color, parse_color};
pub use compress::{compress, compress_str, decompress, decompress_str};
pub use config::{EngineConfig, Format, read_document};
pub use engine::{ApplyOutcome, ThemeEngine, ThemeEngineBuilder, ThemeState};
pub use error::{
    CompressError, ConfigError, EngineError, ErrorCode, LoadError, PathError, RenderError,
    Severity, StorageError, ThemeError,
};
pub use merge::{deep_merge, merge_with_defaults};
pub use model::{
    ColorScale, Effects, Gradient, GradientStop, ScaleName, Theme, ThemeColors, ThemeGradients,
    ThemeMetadata, Typography,
};
pub use notify::{ChangeNotifier, ListenerId, ThemeEvent};
pub use path::ThemePath;
pub use recovery::{
    RecoveryContext, RecoveryEngine, RecoveryOptions, RecoveryOutcome, RecoveryStrategy,
};
pub use storage::{JsonDirStorage, KeyValueStore, MemoryStorage, ThemeStorage};
pub use validator::{ValidationIssue, ValidationOptions, ValidationResult, validate};
pub use vars::{InMemoryTarget, RenderTarget, VariableConfig, VariableLayer};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::engine::{ApplyOutcome, ThemeEngine, ThemeState};
    pub use crate::error::{EngineError, ErrorCode, Severity, ThemeError};
    pub use crate::model::Theme;
    pub use crate::notify::ThemeEvent;
    pub use crate::storage::ThemeStorage;
    pub use crate::validator::{ValidationOptions, ValidationResult, validate};
    pub use crate::vars::RenderTarget;
}

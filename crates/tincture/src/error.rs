//! Error taxonomy for the theme pipeline.
//!
//! Two kinds of errors live here:
//!
//! - [`ThemeError`] records are *data*. Validation and application produce
//!   them, and the [`RecoveryEngine`](crate::recovery::RecoveryEngine) consumes
//!   them. They are never propagated with `?`.
//! - The `thiserror` enums ([`StorageError`], [`EngineError`], [`LoadError`],
//!   [`ConfigError`], [`CompressError`], [`RenderError`], [`PathError`]) are
//!   ordinary Rust errors returned from fallible operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validator::{IssueKind, ValidationIssue, ValidationResult};

/// How serious a validation issue or theme error is.
///
/// Ordered so that `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Machine-readable category of a [`ThemeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or mistyped required field.
    Structural,
    /// A leaf value failed its CSS syntax check.
    CssValue,
    /// Contrast below a WCAG threshold.
    Accessibility,
    /// Advisory color-harmony finding.
    Harmony,
    /// Committing variables to the render target failed.
    ApplicationFailure,
    /// The storage collaborator rejected an operation.
    StorageFailure,
    /// The requested theme does not exist in storage.
    ThemeLoadFailed,
}

impl ErrorCode {
    /// Wire name of the code (`"THEME_LOAD_FAILED"` and friends).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "STRUCTURAL_ERROR",
            Self::CssValue => "CSS_VALUE_ERROR",
            Self::Accessibility => "ACCESSIBILITY_ERROR",
            Self::Harmony => "HARMONY_WARNING",
            Self::ApplicationFailure => "APPLICATION_FAILURE",
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::ThemeLoadFailed => "THEME_LOAD_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<IssueKind> for ErrorCode {
    fn from(kind: IssueKind) -> Self {
        match kind {
            IssueKind::Structural => Self::Structural,
            IssueKind::CssValue => Self::CssValue,
            IssueKind::Accessibility => Self::Accessibility,
            IssueKind::Harmony => Self::Harmony,
        }
    }
}

/// A problem found at a validation or application boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeError {
    pub code: ErrorCode,
    /// Dotted path of the offending field, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub severity: Severity,
    pub recoverable: bool,
    /// Name of the recovery strategy that handled this error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_action: Option<String>,
}

impl ThemeError {
    /// Create an error. Critical errors are never recoverable.
    pub fn new(code: ErrorCode, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            code,
            field: None,
            message: message.into(),
            severity,
            recoverable: severity != Severity::Critical,
            fallback_action: None,
        }
    }

    /// Attach the dotted field path.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Convert a validation issue into an error record.
    pub fn from_issue(issue: &ValidationIssue) -> Self {
        let field = (!issue.field.is_empty()).then(|| issue.field.clone());
        Self {
            code: issue.kind.into(),
            field,
            message: issue.message.clone(),
            severity: issue.severity,
            recoverable: issue.severity != Severity::Critical,
            fallback_action: None,
        }
    }

    /// Convert every error of a validation result.
    pub fn from_result(result: &ValidationResult) -> Vec<Self> {
        result.errors.iter().map(Self::from_issue).collect()
    }

    /// Synthetic error raised when storage has no theme under `id`.
    pub fn load_failed(id: &str) -> Self {
        Self::new(
            ErrorCode::ThemeLoadFailed,
            format!("theme '{id}' was not found in storage"),
            Severity::High,
        )
        .with_field("id")
    }

    /// Error raised when the storage collaborator rejects an operation.
    pub fn storage_failure(err: &StorageError) -> Self {
        Self::new(ErrorCode::StorageFailure, err.to_string(), Severity::High)
    }

    /// Error raised when a variable commit could not be completed.
    pub fn application_failure(property: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::ApplicationFailure,
            format!("failed to apply {property}: {reason}"),
            Severity::High,
        )
        .with_field(property)
    }

    /// The dotted field path, or `""` when absent.
    pub fn field_path(&self) -> &str {
        self.field.as_deref().unwrap_or("")
    }
}

impl fmt::Display for ThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{}] {field}: {}", self.code, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Error returned by a storage collaborator.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid theme id '{0}'")]
    InvalidId(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Error surfaced by [`ThemeEngine`](crate::engine::ThemeEngine) operations
/// that are allowed to fail outward.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Theme failed validation with {} error(s)", .0.errors.len())]
    Validation(Box<ValidationResult>),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Error reading a theme document or configuration file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[cfg(feature = "yaml")]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Error loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Error expanding a compressed theme.
#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Unknown key '{key}' in compressed {context}")]
    UnknownKey { context: &'static str, key: String },
    #[error("Expected an object for compressed {0}")]
    ExpectedObject(&'static str),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error reported by a [`RenderTarget`](crate::vars::RenderTarget).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Value '{0}' was rejected by the render target")]
    Rejected(String),
    #[error("Render target unavailable: {0}")]
    Unavailable(String),
}

/// Error resolving a dotted theme path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Unknown theme path '{0}'")]
    Unknown(String),
    #[error("Theme path '{0}' does not address a string value")]
    NotALeaf(String),
}

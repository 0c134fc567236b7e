//! Engine configuration and document loading.
//!
//! Configuration and theme documents may be JSON, TOML or YAML; the format
//! is chosen by file extension.
//!
//! ```toml
//! [cache]
//! max_size = 50
//! ttl_ms = 3600000
//! strategy = "lfu"
//!
//! [validation]
//! strict = true
//!
//! [recovery]
//! preserve_partial_theme = false
//!
//! [variables]
//! prefix = "--app"
//! ```

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cache::CacheConfig;
use crate::error::{ConfigError, LoadError};
use crate::recovery::RecoveryOptions;
use crate::validator::ValidationOptions;
use crate::vars::VariableConfig;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
    Yaml,
}

impl Format {
    /// Infer the format from a file extension.
    ///
    /// # Errors
    /// Returns [`LoadError::UnsupportedFormat`] for unknown or missing
    /// extensions.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some(ext) => Err(LoadError::UnsupportedFormat(ext.into())),
            None => Err(LoadError::UnsupportedFormat("unknown".into())),
        }
    }

    /// Deserialize `content` in this format.
    ///
    /// # Errors
    /// Returns [`LoadError`] if parsing fails.
    pub fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, LoadError> {
        match self {
            Self::Json => Ok(serde_json::from_str(content)?),
            Self::Toml => Ok(toml::from_str(content)?),
            Self::Yaml => {
                #[cfg(feature = "yaml")]
                {
                    Ok(serde_yaml::from_str(content)?)
                }
                #[cfg(not(feature = "yaml"))]
                {
                    Err(LoadError::UnsupportedFormat("yaml".into()))
                }
            }
        }
    }
}

/// Read a theme document as untyped JSON, whatever its on-disk format.
///
/// The document is not validated; partial documents are expected.
///
/// # Errors
/// Returns [`LoadError`] if the file cannot be read or parsed.
pub fn read_document(path: impl AsRef<Path>) -> Result<Value, LoadError> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path)?;
    let document = format.parse(&content)?;
    debug!(path = %path.display(), format = ?format, "Theme document read");
    Ok(document)
}

/// Configuration of a [`ThemeEngine`](crate::engine::ThemeEngine).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub validation: ValidationOptions,
    pub recovery: RecoveryOptions,
    pub variables: VariableConfig,
}

impl EngineConfig {
    /// Parse JSON configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if parsing or validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::parse(Format::Json, json)
    }

    /// Parse TOML configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if parsing or validation fails.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::parse(Format::Toml, toml)
    }

    /// Parse YAML configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if parsing or validation fails.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(Format::Yaml, yaml)
    }

    /// Load configuration from a file (format inferred by extension).
    ///
    /// # Errors
    /// Returns [`ConfigError`] if reading, parsing, or validation fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let content = fs::read_to_string(path).map_err(LoadError::from)?;
        let config = Self::parse(format, &content)?;
        debug!(path = %path.display(), "Engine configuration loaded");
        Ok(config)
    }

    fn parse(format: Format, content: &str) -> Result<Self, ConfigError> {
        let config: Self = format.parse(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.sweep_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "cache.sweep_interval_ms must be greater than zero".into(),
            ));
        }
        if self.cache.namespace.is_empty() {
            return Err(ConfigError::Invalid("cache.namespace must not be empty".into()));
        }
        if !self.variables.prefix.starts_with("--") {
            return Err(ConfigError::Invalid(format!(
                "variables.prefix must start with \"--\", got {:?}",
                self.variables.prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EvictionStrategy;

    #[test]
    fn test_defaults_when_empty() {
        let config = EngineConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_toml_sections() {
        let config = EngineConfig::from_toml_str(
            r#"
            [cache]
            max_size = 5
            strategy = "lfu"

            [validation]
            strict = true
            check_accessibility = false

            [recovery]
            preserve_partial_theme = false

            [variables]
            prefix = "--app"
            "#,
        )
        .expect("config");
        assert_eq!(config.cache.max_size, 5);
        assert_eq!(config.cache.strategy, EvictionStrategy::Lfu);
        assert_eq!(config.cache.ttl_ms, CacheConfig::default().ttl_ms);
        assert!(config.validation.strict);
        assert!(!config.validation.check_accessibility);
        assert!(!config.recovery.preserve_partial_theme);
        assert!(config.recovery.use_default_theme);
        assert_eq!(config.variables.prefix, "--app");
    }

    #[test]
    fn test_json_accepts_camel_case_validation_options() {
        let config = EngineConfig::from_json_str(
            r#"{ "validation": { "validateCSS": false, "requireAllFields": true } }"#,
        )
        .expect("config");
        assert!(!config.validation.validate_css);
        assert!(config.validation.require_all_fields);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_yaml_config() {
        let config = EngineConfig::from_yaml_str("cache:\n  persist: true\n").expect("config");
        assert!(config.cache.persist);
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let err = EngineConfig::from_toml_str("[cache]\nsweep_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_prefix_rejected() {
        let err =
            EngineConfig::from_json_str(r#"{ "variables": { "prefix": "theme" } }"#).unwrap_err();
        assert!(err.to_string().contains("variables.prefix"));
    }

    #[test]
    fn test_read_document_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let toml_path = dir.path().join("theme.toml");
        fs::write(&toml_path, "id = \"t1\"\nname = \"T\"\n[colors.primary]\n500 = \"#10b981\"\n")
            .expect("write");
        let doc = read_document(&toml_path).expect("toml document");
        assert_eq!(doc["colors"]["primary"]["500"], "#10b981");

        let txt_path = dir.path().join("theme.txt");
        fs::write(&txt_path, "{}").expect("write");
        assert!(matches!(
            read_document(&txt_path),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "txt"
        ));
    }
}

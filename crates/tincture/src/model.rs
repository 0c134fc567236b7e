//! Theme document model.
//!
//! A [`Theme`] is the complete styling document: four ten-shade color scales
//! plus semantic colors, five named gradients, typography, effects, and
//! metadata. It serializes to camelCase JSON and `Clone` is its structural
//! deep copy.
//!
//! # Example
//!
//! ```rust
//! use tincture::model::{ScaleName, Theme};
//! use tincture::path::ThemePath;
//!
//! let theme = Theme::extract();
//! let custom = theme
//!     .customize(&[(ThemePath::Shade(ScaleName::Primary, 500), "#0ea5e9".to_string())])
//!     .expect("known path");
//! assert_eq!(custom.colors.primary.shade(500), Some("#0ea5e9"));
//! assert_eq!(theme.colors.primary.shade(500), Some("#10b981"));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::path::ThemePath;

/// A complete theme document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub colors: ThemeColors,
    pub gradients: ThemeGradients,
    pub typography: Typography,
    pub effects: Effects,
    #[serde(default)]
    pub metadata: ThemeMetadata,
}

impl Theme {
    /// Deep clone with field overrides applied in order.
    ///
    /// # Errors
    /// Returns [`PathError`] if a path does not address a string leaf.
    pub fn customize(&self, overrides: &[(ThemePath, String)]) -> Result<Self, PathError> {
        let mut theme = self.clone();
        for (path, value) in overrides {
            path.set(&mut theme, value)?;
        }
        theme.metadata.updated_at = Utc::now();
        Ok(theme)
    }

    /// Same theme under a different id and name.
    pub fn renamed(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.id = id.into();
        self.name = name.into();
        self
    }
}

/// The four named color scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScaleName {
    Primary,
    Secondary,
    Accent,
    Neutral,
}

impl ScaleName {
    pub const ALL: [Self; 4] = [Self::Primary, Self::Secondary, Self::Accent, Self::Neutral];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Accent => "accent",
            Self::Neutral => "neutral",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.as_str() == s)
    }
}

impl fmt::Display for ScaleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic status colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticRole {
    Success,
    Warning,
    Error,
    Info,
}

impl SemanticRole {
    pub const ALL: [Self; 4] = [Self::Success, Self::Warning, Self::Error, Self::Info];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Info => "info",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }
}

/// The five named gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GradientName {
    Hero,
    Card,
    Button,
    Background,
    Accent,
}

impl GradientName {
    pub const ALL: [Self; 5] = [
        Self::Hero,
        Self::Card,
        Self::Button,
        Self::Background,
        Self::Accent,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Card => "card",
            Self::Button => "button",
            Self::Background => "background",
            Self::Accent => "accent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.as_str() == s)
    }
}

/// A ten-shade color scale (`50`, `100`..`900`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScale {
    #[serde(rename = "50")]
    pub s50: String,
    #[serde(rename = "100")]
    pub s100: String,
    #[serde(rename = "200")]
    pub s200: String,
    #[serde(rename = "300")]
    pub s300: String,
    #[serde(rename = "400")]
    pub s400: String,
    #[serde(rename = "500")]
    pub s500: String,
    #[serde(rename = "600")]
    pub s600: String,
    #[serde(rename = "700")]
    pub s700: String,
    #[serde(rename = "800")]
    pub s800: String,
    #[serde(rename = "900")]
    pub s900: String,
}

impl ColorScale {
    /// Shade keys in ascending order.
    pub const SHADES: [u16; 10] = [50, 100, 200, 300, 400, 500, 600, 700, 800, 900];

    /// Build a scale from ten shades, lightest first.
    pub fn from_shades(shades: [&str; 10]) -> Self {
        let [s50, s100, s200, s300, s400, s500, s600, s700, s800, s900] =
            shades.map(str::to_string);
        Self {
            s50,
            s100,
            s200,
            s300,
            s400,
            s500,
            s600,
            s700,
            s800,
            s900,
        }
    }

    pub fn shade(&self, shade: u16) -> Option<&str> {
        let value = match shade {
            50 => &self.s50,
            100 => &self.s100,
            200 => &self.s200,
            300 => &self.s300,
            400 => &self.s400,
            500 => &self.s500,
            600 => &self.s600,
            700 => &self.s700,
            800 => &self.s800,
            900 => &self.s900,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn shade_mut(&mut self, shade: u16) -> Option<&mut String> {
        match shade {
            50 => Some(&mut self.s50),
            100 => Some(&mut self.s100),
            200 => Some(&mut self.s200),
            300 => Some(&mut self.s300),
            400 => Some(&mut self.s400),
            500 => Some(&mut self.s500),
            600 => Some(&mut self.s600),
            700 => Some(&mut self.s700),
            800 => Some(&mut self.s800),
            900 => Some(&mut self.s900),
            _ => None,
        }
    }

    /// `(shade, value)` pairs, lightest first.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        Self::SHADES
            .into_iter()
            .filter_map(move |shade| self.shade(shade).map(|value| (shade, value)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticColors {
    pub success: String,
    pub warning: String,
    pub error: String,
    pub info: String,
}

impl SemanticColors {
    pub fn get(&self, role: SemanticRole) -> &str {
        match role {
            SemanticRole::Success => &self.success,
            SemanticRole::Warning => &self.warning,
            SemanticRole::Error => &self.error,
            SemanticRole::Info => &self.info,
        }
    }

    pub fn get_mut(&mut self, role: SemanticRole) -> &mut String {
        match role {
            SemanticRole::Success => &mut self.success,
            SemanticRole::Warning => &mut self.warning,
            SemanticRole::Error => &mut self.error,
            SemanticRole::Info => &mut self.info,
        }
    }
}

/// Color section of a theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub primary: ColorScale,
    pub secondary: ColorScale,
    pub accent: ColorScale,
    pub neutral: ColorScale,
    pub semantic: SemanticColors,
}

impl ThemeColors {
    pub fn scale(&self, name: ScaleName) -> &ColorScale {
        match name {
            ScaleName::Primary => &self.primary,
            ScaleName::Secondary => &self.secondary,
            ScaleName::Accent => &self.accent,
            ScaleName::Neutral => &self.neutral,
        }
    }

    pub fn scale_mut(&mut self, name: ScaleName) -> &mut ColorScale {
        match name {
            ScaleName::Primary => &mut self.primary,
            ScaleName::Secondary => &mut self.secondary,
            ScaleName::Accent => &mut self.accent,
            ScaleName::Neutral => &mut self.neutral,
        }
    }
}

/// One color stop of a gradient. `position` is a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub color: String,
    pub position: f64,
}

impl GradientStop {
    pub fn new(color: impl Into<String>, position: f64) -> Self {
        Self {
            color: color.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub direction: String,
    pub stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn linear(direction: impl Into<String>, stops: Vec<GradientStop>) -> Self {
        Self {
            direction: direction.into(),
            stops,
        }
    }

    /// Color of the first stop, used as a solid fallback.
    pub fn first_color(&self) -> Option<&str> {
        self.stops.first().map(|stop| stop.color.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeGradients {
    pub hero: Gradient,
    pub card: Gradient,
    pub button: Gradient,
    pub background: Gradient,
    pub accent: Gradient,
}

impl ThemeGradients {
    pub fn get(&self, name: GradientName) -> &Gradient {
        match name {
            GradientName::Hero => &self.hero,
            GradientName::Card => &self.card,
            GradientName::Button => &self.button,
            GradientName::Background => &self.background,
            GradientName::Accent => &self.accent,
        }
    }

    pub fn get_mut(&mut self, name: GradientName) -> &mut Gradient {
        match name {
            GradientName::Hero => &mut self.hero,
            GradientName::Card => &mut self.card,
            GradientName::Button => &mut self.button,
            GradientName::Background => &mut self.background,
            GradientName::Accent => &mut self.accent,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (GradientName, &Gradient)> {
        GradientName::ALL
            .into_iter()
            .map(move |name| (name, self.get(name)))
    }
}

/// Font family slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontFamilyKind {
    Sans,
    Serif,
    Mono,
}

impl FontFamilyKind {
    pub const ALL: [Self; 3] = [Self::Sans, Self::Serif, Self::Mono];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sans => "sans",
            Self::Serif => "serif",
            Self::Mono => "mono",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFamilies {
    pub sans: Vec<String>,
    pub serif: Vec<String>,
    pub mono: Vec<String>,
}

impl FontFamilies {
    pub fn get(&self, kind: FontFamilyKind) -> &[String] {
        match kind {
            FontFamilyKind::Sans => &self.sans,
            FontFamilyKind::Serif => &self.serif,
            FontFamilyKind::Mono => &self.mono,
        }
    }

    pub fn get_mut(&mut self, kind: FontFamilyKind) -> &mut Vec<String> {
        match kind {
            FontFamilyKind::Sans => &mut self.sans,
            FontFamilyKind::Serif => &mut self.serif,
            FontFamilyKind::Mono => &mut self.mono,
        }
    }
}

/// Token scales under `typography`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypographyScale {
    FontSize,
    FontWeight,
    LineHeight,
}

impl TypographyScale {
    pub const ALL: [Self; 3] = [Self::FontSize, Self::FontWeight, Self::LineHeight];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FontSize => "fontSize",
            Self::FontWeight => "fontWeight",
            Self::LineHeight => "lineHeight",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scale| scale.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub font_family: FontFamilies,
    pub font_size: BTreeMap<String, String>,
    pub font_weight: BTreeMap<String, String>,
    pub line_height: BTreeMap<String, String>,
}

impl Typography {
    pub fn scale(&self, scale: TypographyScale) -> &BTreeMap<String, String> {
        match scale {
            TypographyScale::FontSize => &self.font_size,
            TypographyScale::FontWeight => &self.font_weight,
            TypographyScale::LineHeight => &self.line_height,
        }
    }

    pub fn scale_mut(&mut self, scale: TypographyScale) -> &mut BTreeMap<String, String> {
        match scale {
            TypographyScale::FontSize => &mut self.font_size,
            TypographyScale::FontWeight => &mut self.font_weight,
            TypographyScale::LineHeight => &mut self.line_height,
        }
    }
}

/// Token scales under `effects`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKind {
    Blur,
    Shadow,
    BorderRadius,
}

impl EffectKind {
    pub const ALL: [Self; 3] = [Self::Blur, Self::Shadow, Self::BorderRadius];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blur => "blur",
            Self::Shadow => "shadow",
            Self::BorderRadius => "borderRadius",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    pub blur: BTreeMap<String, String>,
    pub shadow: BTreeMap<String, String>,
    pub border_radius: BTreeMap<String, String>,
}

impl Effects {
    pub fn get(&self, kind: EffectKind) -> &BTreeMap<String, String> {
        match kind {
            EffectKind::Blur => &self.blur,
            EffectKind::Shadow => &self.shadow,
            EffectKind::BorderRadius => &self.border_radius,
        }
    }

    pub fn get_mut(&mut self, kind: EffectKind) -> &mut BTreeMap<String, String> {
        match kind {
            EffectKind::Blur => &mut self.blur,
            EffectKind::Shadow => &mut self.shadow,
            EffectKind::BorderRadius => &mut self.border_radius,
        }
    }
}

/// Descriptive metadata. `version` is expected to be semver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeMetadata {
    pub name: String,
    pub description: String,
    pub author: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
}

impl Default for ThemeMetadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            author: String::new(),
            version: "1.0.0".to_string(),
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
            tags: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_scale_serializes_numeric_keys() {
        let scale = ColorScale::from_shades([
            "#000", "#111", "#222", "#333", "#444", "#555", "#666", "#777", "#888", "#999",
        ]);
        let json = serde_json::to_value(&scale).expect("serialize");
        assert_eq!(json["50"], "#000");
        assert_eq!(json["900"], "#999");
    }

    #[test]
    fn test_color_scale_iter_is_ordered() {
        let theme = Theme::extract();
        let shades: Vec<u16> = theme.colors.primary.iter().map(|(s, _)| s).collect();
        assert_eq!(shades, ColorScale::SHADES.to_vec());
        assert_eq!(theme.colors.primary.shade(450), None);
    }

    #[test]
    fn test_theme_json_uses_camel_case() {
        let json = serde_json::to_value(Theme::extract()).expect("serialize");
        assert!(json["typography"]["fontFamily"].is_object());
        assert!(json["effects"]["borderRadius"].is_object());
        assert!(json["metadata"]["createdAt"].is_string());
    }

    #[test]
    fn test_customize_leaves_original_untouched() {
        let base = Theme::extract();
        let custom = base
            .customize(&[(
                ThemePath::Shade(ScaleName::Accent, 300),
                "rgb(1, 2, 3)".to_string(),
            )])
            .expect("customize");
        assert_eq!(custom.colors.accent.s300, "rgb(1, 2, 3)");
        assert_ne!(base.colors.accent.s300, custom.colors.accent.s300);
    }

    #[test]
    fn test_enum_parse_round_trips() {
        for name in GradientName::ALL {
            assert_eq!(GradientName::parse(name.as_str()), Some(name));
        }
        assert_eq!(EffectKind::parse("borderRadius"), Some(EffectKind::BorderRadius));
        assert_eq!(ScaleName::parse("tertiary"), None);
    }
}

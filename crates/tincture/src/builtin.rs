//! Built-in themes derived from the design tokens.
//!
//! [`Theme::extract`] is the default every partial document is merged over,
//! and [`Theme::emergency`] is the hard-coded theme recovery falls back to
//! when nothing else works. Both pass validation with default options.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{
    ColorScale, Effects, FontFamilies, Gradient, GradientStop, SemanticColors, Theme, ThemeColors,
    ThemeGradients, ThemeMetadata, Typography,
};

/// Id of the default theme.
pub const DEFAULT_THEME_ID: &str = "default";

/// Id of the emergency fallback theme.
pub const EMERGENCY_THEME_ID: &str = "emergency-fallback";

// ========================
// Palette tokens
// ========================

const EMERALD: [&str; 10] = [
    "#ecfdf5", "#d1fae5", "#a7f3d0", "#6ee7b7", "#34d399", "#10b981", "#059669", "#047857",
    "#065f46", "#064e3b",
];

const INDIGO: [&str; 10] = [
    "#eef2ff", "#e0e7ff", "#c7d2fe", "#a5b4fc", "#818cf8", "#6366f1", "#463cd0", "#4338ca",
    "#3730a3", "#312e81",
];

const AMBER: [&str; 10] = [
    "#fffbeb", "#fef3c7", "#fde68a", "#fcd34d", "#fbbf24", "#f59e0b", "#d97706", "#b45309",
    "#92400e", "#78350f",
];

const SLATE: [&str; 10] = [
    "#f8fafc", "#f1f5f9", "#e2e8f0", "#cbd5e1", "#94a3b8", "#6b7a90", "#475569", "#334155",
    "#1e293b", "#0f172a",
];

static DEFAULT_THEME: LazyLock<Theme> = LazyLock::new(|| {
    build_theme(
        DEFAULT_THEME_ID,
        "Default",
        "Built-in theme extracted from the design tokens",
        ["builtin", "default"],
    )
});

impl Theme {
    /// The built-in default theme.
    pub fn extract() -> Self {
        DEFAULT_THEME.clone()
    }

    /// The emergency fallback theme. Always structurally valid.
    pub fn emergency() -> Self {
        build_theme(
            EMERGENCY_THEME_ID,
            "Emergency Fallback",
            "Hard-coded theme used when every other recovery path fails",
            ["builtin", "emergency"],
        )
    }

    /// Whether this is the emergency fallback theme.
    pub fn is_emergency(&self) -> bool {
        self.id == EMERGENCY_THEME_ID
    }
}

fn tokens_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn build_theme(id: &str, name: &str, description: &str, tags: [&str; 2]) -> Theme {
    Theme {
        id: id.to_string(),
        name: name.to_string(),
        colors: ThemeColors {
            primary: ColorScale::from_shades(EMERALD),
            secondary: ColorScale::from_shades(INDIGO),
            accent: ColorScale::from_shades(AMBER),
            neutral: ColorScale::from_shades(SLATE),
            semantic: SemanticColors {
                success: "#16a34a".to_string(),
                warning: "#f59e0b".to_string(),
                error: "#dc2626".to_string(),
                info: "#2563eb".to_string(),
            },
        },
        gradients: ThemeGradients {
            hero: two_stop("135deg", EMERALD[6], INDIGO[7]),
            card: two_stop("180deg", SLATE[8], SLATE[9]),
            button: two_stop("to right", EMERALD[7], EMERALD[8]),
            background: two_stop("to bottom", SLATE[9], INDIGO[9]),
            accent: two_stop("90deg", AMBER[7], AMBER[8]),
        },
        typography: Typography {
            font_family: FontFamilies {
                sans: strings(&["Inter", "system-ui", "sans-serif"]),
                serif: strings(&["Georgia", "Cambria", "serif"]),
                mono: strings(&["JetBrains Mono", "Menlo", "monospace"]),
            },
            font_size: tokens(&[
                ("xs", "0.75rem"),
                ("sm", "0.875rem"),
                ("base", "1rem"),
                ("lg", "1.125rem"),
                ("xl", "1.25rem"),
                ("2xl", "1.5rem"),
                ("3xl", "1.875rem"),
                ("4xl", "2.25rem"),
            ]),
            font_weight: tokens(&[
                ("light", "300"),
                ("normal", "400"),
                ("medium", "500"),
                ("semibold", "600"),
                ("bold", "700"),
            ]),
            line_height: tokens(&[
                ("tight", "1.25"),
                ("snug", "1.375"),
                ("normal", "1.5"),
                ("relaxed", "1.625"),
            ]),
        },
        effects: Effects {
            blur: tokens(&[("sm", "blur(4px)"), ("md", "blur(8px)"), ("lg", "blur(16px)")]),
            shadow: tokens(&[
                ("sm", "0 1px 2px rgba(0, 0, 0, 0.05)"),
                (
                    "md",
                    "0 4px 6px -1px rgba(0, 0, 0, 0.1), 0 2px 4px -2px rgba(0, 0, 0, 0.1)",
                ),
                ("lg", "0 10px 15px -3px rgba(0, 0, 0, 0.1)"),
                ("inner", "inset 0 2px 4px rgba(0, 0, 0, 0.06)"),
            ]),
            border_radius: tokens(&[
                ("none", "0"),
                ("sm", "0.125rem"),
                ("md", "0.375rem"),
                ("lg", "0.5rem"),
                ("xl", "0.75rem"),
                ("full", "9999px"),
            ]),
        },
        metadata: ThemeMetadata {
            name: name.to_string(),
            description: description.to_string(),
            author: "tincture".to_string(),
            version: "1.0.0".to_string(),
            created_at: tokens_epoch(),
            updated_at: tokens_epoch(),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect::<BTreeSet<_>>(),
        },
    }
}

fn two_stop(direction: &str, from: &str, to: &str) -> Gradient {
    Gradient::linear(
        direction,
        vec![GradientStop::new(from, 0.0), GradientStop::new(to, 100.0)],
    )
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn tokens(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{ValidationOptions, validate};

    #[test]
    fn test_default_theme_is_valid() {
        let result = validate(&Theme::extract(), &ValidationOptions::default());
        assert!(result.is_valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_default_theme_is_valid_with_all_fields_required() {
        let options = ValidationOptions {
            require_all_fields: true,
            ..Default::default()
        };
        let result = validate(&Theme::extract(), &options);
        assert!(result.is_valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_default_theme_passes_strict() {
        let options = ValidationOptions {
            strict: true,
            ..Default::default()
        };
        let result = validate(&Theme::extract(), &options);
        assert!(result.is_valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_emergency_theme_is_valid() {
        let theme = Theme::emergency();
        assert!(theme.is_emergency());
        let result = validate(&theme, &ValidationOptions::default());
        assert!(result.is_valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_extract_returns_independent_copies() {
        let mut a = Theme::extract();
        a.colors.primary.s500 = "#000000".to_string();
        assert_eq!(Theme::extract().colors.primary.s500, "#10b981");
    }
}

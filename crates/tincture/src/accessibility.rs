//! WCAG contrast math and theme-level accessibility scoring.

use serde::Serialize;
use tracing::debug;

use crate::color::{Rgba, parse_color};
use crate::model::{ScaleName, Theme};
use crate::validator::{ValidationOptions, validate};

/// Minimum contrast for normal text (WCAG AA).
pub const AA_NORMAL: f64 = 4.5;
/// Minimum contrast for large text (WCAG AA).
pub const AA_LARGE: f64 = 3.0;
/// Enhanced contrast (WCAG AAA).
pub const AAA_NORMAL: f64 = 7.0;

/// WCAG relative luminance of an sRGB color. Alpha is ignored.
#[allow(clippy::suboptimal_flops)]
pub fn relative_luminance(color: Rgba) -> f64 {
    fn channel(c: u8) -> f64 {
        let c = f64::from(c) / 255.0;
        if c <= 0.039_28 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * channel(color.r) + 0.7152 * channel(color.g) + 0.0722 * channel(color.b)
}

/// Contrast ratio between two colors, in `1.0..=21.0`. Symmetric.
pub fn contrast_ratio(a: Rgba, b: Rgba) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let lighter = la.max(lb);
    let darker = la.min(lb);
    (lighter + 0.05) / (darker + 0.05)
}

/// Contrast ratio between two CSS color strings, if both parse.
pub fn contrast_ratio_str(a: &str, b: &str) -> Option<f64> {
    Some(contrast_ratio(parse_color(a)?, parse_color(b)?))
}

/// Conformance level reached by a contrast ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WcagLevel {
    Fail,
    AaLarge,
    Aa,
    Aaa,
}

impl WcagLevel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= AAA_NORMAL {
            Self::Aaa
        } else if ratio >= AA_NORMAL {
            Self::Aa
        } else if ratio >= AA_LARGE {
            Self::AaLarge
        } else {
            Self::Fail
        }
    }
}

/// One checked foreground/background pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContrastCheck {
    pub label: String,
    pub foreground: String,
    pub background: String,
    pub ratio: f64,
    pub level: WcagLevel,
}

/// Accessibility report for a whole theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessibilityReport {
    /// Share of checked pairs meeting AA, `0..=100`.
    pub score: u8,
    pub checks: Vec<ContrastCheck>,
}

impl AccessibilityReport {
    pub fn failing(&self) -> impl Iterator<Item = &ContrastCheck> {
        self.checks.iter().filter(|c| c.level < WcagLevel::Aa)
    }
}

/// Score the text pairs a theme is expected to support.
///
/// Checks each scale's `100`/`800` pair and white text on shades `700..900`.
/// Pairs whose colors cannot be parsed are skipped.
pub fn accessibility_score(theme: &Theme) -> AccessibilityReport {
    let mut checks = Vec::new();
    let mut push = |label: String, fg: &str, bg: &str| {
        if let Some(ratio) = contrast_ratio_str(fg, bg) {
            checks.push(ContrastCheck {
                label,
                foreground: fg.to_string(),
                background: bg.to_string(),
                ratio,
                level: WcagLevel::from_ratio(ratio),
            });
        }
    };

    for name in ScaleName::ALL {
        let scale = theme.colors.scale(name);
        push(format!("{name}.100 on {name}.800"), &scale.s100, &scale.s800);
        for shade in [700, 800, 900] {
            if let Some(bg) = scale.shade(shade) {
                push(format!("white on {name}.{shade}"), "#ffffff", bg);
            }
        }
    }

    let passing = checks.iter().filter(|c| c.level >= WcagLevel::Aa).count();
    let score = if checks.is_empty() {
        0
    } else {
        ((passing * 100) / checks.len()) as u8
    };
    debug!(
        theme.id = %theme.id,
        accessibility.score = score,
        accessibility.checks = checks.len(),
        "Scored theme"
    );
    AccessibilityReport { score, checks }
}

/// Overall quality grade of a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Summary of validation and accessibility for one theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeHealth {
    pub score: u8,
    pub grade: HealthGrade,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Combine the accessibility score with validation findings.
///
/// Each validation error costs 10 points and each warning 2, floored at zero.
pub fn theme_health(theme: &Theme, options: &ValidationOptions) -> ThemeHealth {
    let report = accessibility_score(theme);
    let result = validate(theme, options);
    let penalty = result.errors.len() * 10 + result.warnings.len() * 2;
    let score = usize::from(report.score).saturating_sub(penalty) as u8;
    let grade = match score {
        90.. => HealthGrade::Excellent,
        75..=89 => HealthGrade::Good,
        50..=74 => HealthGrade::Fair,
        _ => HealthGrade::Poor,
    };
    ThemeHealth {
        score,
        grade,
        error_count: result.errors.len(),
        warning_count: result.warnings.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_on_white_is_21() {
        let ratio = contrast_ratio(Rgba::BLACK, Rgba::WHITE);
        assert!((ratio - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_contrast_with_self_is_one() {
        let c = Rgba::opaque(16, 185, 129);
        assert!((contrast_ratio(c, c) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_pair() {
        let ratio = contrast_ratio_str("#ffffff", "#047857").expect("parse");
        assert!((ratio - 5.48).abs() < 0.01, "ratio {ratio}");
    }

    #[test]
    fn test_levels() {
        assert_eq!(WcagLevel::from_ratio(2.0), WcagLevel::Fail);
        assert_eq!(WcagLevel::from_ratio(3.5), WcagLevel::AaLarge);
        assert_eq!(WcagLevel::from_ratio(5.0), WcagLevel::Aa);
        assert_eq!(WcagLevel::from_ratio(7.0), WcagLevel::Aaa);
    }

    #[test]
    fn test_default_theme_scores_full_marks() {
        let report = accessibility_score(&Theme::extract());
        assert_eq!(report.score, 100);
        assert_eq!(report.checks.len(), 16);
        assert_eq!(report.failing().count(), 0);
    }

    #[test]
    fn test_low_contrast_theme_loses_points() {
        let mut theme = Theme::extract();
        theme.colors.primary.s800 = "#d1fae5".to_string();
        let report = accessibility_score(&theme);
        assert!(report.score < 100);
        let health = theme_health(&theme, &ValidationOptions::default());
        assert!(health.error_count >= 1);
        assert_ne!(health.grade, HealthGrade::Excellent);
    }
}

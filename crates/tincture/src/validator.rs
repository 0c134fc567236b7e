//! Multi-stage theme validation.
//!
//! Validation works on the JSON form of a theme so that missing and mistyped
//! fields can be reported, which a typed [`Theme`] cannot express. Four
//! stages run in order and all of them always run:
//!
//! 1. **Structural**: required fields, `id`/`name` format, metadata presence,
//!    semver shape of `metadata.version`.
//! 2. **CSS value**: every color, gradient, shadow, blur, and radius leaf.
//! 3. **Accessibility**: WCAG contrast between shade pairs, text colors, and
//!    gradient endpoints.
//! 4. **Harmony**: advisory findings only.
//!
//! Errors and warnings accumulate into one [`ValidationResult`]. Their order
//! is not part of the contract.
//!
//! # Example
//!
//! ```rust
//! use tincture::model::Theme;
//! use tincture::validator::{ValidationOptions, validate};
//!
//! let mut theme = Theme::extract();
//! theme.colors.primary.s50 = "not-a-color".to_string();
//!
//! let result = validate(&theme, &ValidationOptions::default());
//! assert!(!result.is_valid);
//! assert_eq!(result.errors[0].field, "colors.primary.50");
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::accessibility::{AA_LARGE, AA_NORMAL, AAA_NORMAL, contrast_ratio};
use crate::color::{Rgba, is_valid_color, parse_color};
use crate::css::{
    is_valid_blur, is_valid_direction, is_valid_gradient, is_valid_radius, is_valid_shadow,
    render_gradient,
};
use crate::error::Severity;
use crate::model::{
    ColorScale, EffectKind, FontFamilyKind, Gradient, GradientName, GradientStop, ScaleName,
    SemanticRole, Theme, TypographyScale,
};

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("theme id regex"));

/// Whether `id` is a well-formed theme id: at least [`MIN_ID_LEN`]
/// characters of ASCII letters, digits, `_` or `-`.
pub fn is_valid_theme_id(id: &str) -> bool {
    id.len() >= MIN_ID_LEN && ID_RE.is_match(id)
}

/// Longest accepted theme name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Shortest accepted theme id, in characters.
pub const MIN_ID_LEN: usize = 3;

const REQUIRED_SECTIONS: [&str; 4] = ["colors", "gradients", "typography", "effects"];

const METADATA_FIELDS: [&str; 7] = [
    "name",
    "description",
    "author",
    "version",
    "createdAt",
    "updatedAt",
    "tags",
];

/// Options recognized by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationOptions {
    /// Promote every non-harmony warning to an error.
    pub strict: bool,
    #[serde(alias = "check_accessibility")]
    pub check_accessibility: bool,
    #[serde(rename = "validateCSS", alias = "validateCss", alias = "validate_css")]
    pub validate_css: bool,
    /// Missing metadata fields become errors instead of warnings.
    #[serde(alias = "require_all_fields")]
    pub require_all_fields: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict: false,
            check_accessibility: true,
            validate_css: true,
            require_all_fields: false,
        }
    }
}

/// Stage that produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Structural,
    CssValue,
    Accessibility,
    Harmony,
}

/// One error or warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path of the field, `""` for the whole document.
    pub field: String,
    pub message: String,
    pub severity: Severity,
    pub kind: IssueKind,
}

impl ValidationIssue {
    fn new(
        kind: IssueKind,
        severity: Severity,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity,
            kind,
        }
    }
}

/// Outcome of validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    /// Append another result's findings.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.is_valid = self.errors.is_empty();
    }

    fn error(
        &mut self,
        kind: IssueKind,
        severity: Severity,
        field: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(ValidationIssue::new(kind, severity, field, message));
    }

    fn warning(&mut self, kind: IssueKind, field: impl Into<String>, message: impl Into<String>) {
        self.warnings
            .push(ValidationIssue::new(kind, Severity::Low, field, message));
    }

    /// Errors reported for one field.
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.errors.iter().filter(move |issue| issue.field == field)
    }
}

/// Validate a typed theme.
pub fn validate(theme: &Theme, options: &ValidationOptions) -> ValidationResult {
    match serde_json::to_value(theme) {
        Ok(doc) => validate_document(&doc, options),
        Err(err) => {
            let mut result = ValidationResult::default();
            result.error(
                IssueKind::Structural,
                Severity::Critical,
                "",
                format!("theme could not be serialized: {err}"),
            );
            result.is_valid = false;
            result
        }
    }
}

/// Validate an untyped theme document.
pub fn validate_document(doc: &Value, options: &ValidationOptions) -> ValidationResult {
    let mut result = ValidationResult::default();
    let Some(root) = doc.as_object() else {
        result.error(
            IssueKind::Structural,
            Severity::Critical,
            "",
            "theme must be a JSON object",
        );
        result.is_valid = false;
        return result;
    };

    check_structure(root, options, &mut result);
    if options.validate_css {
        check_css(root, &mut result);
    }
    if options.check_accessibility {
        check_accessibility(root, &mut result);
    }
    check_harmony(root, &mut result);

    if options.strict {
        let (promote, keep): (Vec<_>, Vec<_>) = result
            .warnings
            .drain(..)
            .partition(|issue| issue.kind != IssueKind::Harmony);
        result.warnings = keep;
        result
            .errors
            .extend(promote.into_iter().map(|issue| ValidationIssue {
                severity: Severity::Medium,
                ..issue
            }));
    }

    result.is_valid = result.errors.is_empty();
    let id = root.get("id").and_then(Value::as_str).unwrap_or("");
    debug!(
        theme.id = id,
        validation.valid = result.is_valid,
        validation.errors = result.errors.len(),
        validation.warnings = result.warnings.len(),
        "Validated theme"
    );
    result
}

// -----------------------------------------------------------------------------
// Structural
// -----------------------------------------------------------------------------

fn check_structure(
    root: &Map<String, Value>,
    options: &ValidationOptions,
    result: &mut ValidationResult,
) {
    match root.get("id") {
        None | Some(Value::Null) => missing(result, "id"),
        Some(Value::String(id)) => {
            if id.chars().count() < MIN_ID_LEN {
                result.error(
                    IssueKind::Structural,
                    Severity::Medium,
                    "id",
                    format!("id must be at least {MIN_ID_LEN} characters"),
                );
            } else if !ID_RE.is_match(id) {
                result.error(
                    IssueKind::Structural,
                    Severity::Medium,
                    "id",
                    "id may only contain letters, digits, '-' and '_'",
                );
            }
        }
        Some(_) => mistyped(result, "id", "a string"),
    }

    match root.get("name") {
        None | Some(Value::Null) => missing(result, "name"),
        Some(Value::String(name)) => {
            let len = name.chars().count();
            if len == 0 || len > MAX_NAME_LEN {
                result.error(
                    IssueKind::Structural,
                    Severity::Medium,
                    "name",
                    format!("name must be between 1 and {MAX_NAME_LEN} characters"),
                );
            }
        }
        Some(_) => mistyped(result, "name", "a string"),
    }

    for section in REQUIRED_SECTIONS {
        match root.get(section) {
            None | Some(Value::Null) => missing(result, section),
            Some(Value::Object(map)) => match section {
                "colors" => check_colors_shape(map, result),
                "gradients" => check_gradients_shape(map, result),
                "typography" => check_typography_shape(map, result),
                _ => check_effects_shape(map, result),
            },
            Some(_) => mistyped(result, section, "an object"),
        }
    }

    check_metadata(root.get("metadata"), options, result);
}

fn missing(result: &mut ValidationResult, field: &str) {
    result.error(
        IssueKind::Structural,
        Severity::High,
        field,
        format!("{field} is required"),
    );
}

fn mistyped(result: &mut ValidationResult, field: &str, expected: &str) {
    result.error(
        IssueKind::Structural,
        Severity::High,
        field,
        format!("{field} must be {expected}"),
    );
}

fn check_colors_shape(colors: &Map<String, Value>, result: &mut ValidationResult) {
    for scale in ScaleName::ALL {
        let field = format!("colors.{scale}");
        match colors.get(scale.as_str()) {
            None | Some(Value::Null) => missing(result, &field),
            Some(Value::Object(shades)) => {
                for shade in ColorScale::SHADES {
                    let shade_field = format!("{field}.{shade}");
                    match shades.get(&shade.to_string()) {
                        None | Some(Value::Null) => missing(result, &shade_field),
                        Some(Value::String(_)) => {}
                        Some(_) => mistyped(result, &shade_field, "a string"),
                    }
                }
            }
            Some(_) => mistyped(result, &field, "an object"),
        }
    }

    match colors.get("semantic") {
        None | Some(Value::Null) => missing(result, "colors.semantic"),
        Some(Value::Object(semantic)) => {
            for role in SemanticRole::ALL {
                let field = format!("colors.semantic.{}", role.as_str());
                match semantic.get(role.as_str()) {
                    None | Some(Value::Null) => missing(result, &field),
                    Some(Value::String(_)) => {}
                    Some(_) => mistyped(result, &field, "a string"),
                }
            }
        }
        Some(_) => mistyped(result, "colors.semantic", "an object"),
    }
}

fn check_gradients_shape(gradients: &Map<String, Value>, result: &mut ValidationResult) {
    for name in GradientName::ALL {
        let field = format!("gradients.{}", name.as_str());
        match gradients.get(name.as_str()) {
            None | Some(Value::Null) => missing(result, &field),
            Some(Value::Object(gradient)) => {
                match gradient.get("direction") {
                    None | Some(Value::Null) => missing(result, &format!("{field}.direction")),
                    Some(Value::String(_)) => {}
                    Some(_) => mistyped(result, &format!("{field}.direction"), "a string"),
                }
                match gradient.get("stops") {
                    None | Some(Value::Null) => missing(result, &format!("{field}.stops")),
                    Some(Value::Array(_)) => {}
                    Some(_) => mistyped(result, &format!("{field}.stops"), "an array"),
                }
            }
            Some(_) => mistyped(result, &field, "an object"),
        }
    }
}

fn check_typography_shape(typography: &Map<String, Value>, result: &mut ValidationResult) {
    match typography.get("fontFamily") {
        None | Some(Value::Null) => missing(result, "typography.fontFamily"),
        Some(Value::Object(families)) => {
            for kind in FontFamilyKind::ALL {
                let field = format!("typography.fontFamily.{}", kind.as_str());
                match families.get(kind.as_str()) {
                    None | Some(Value::Null) => missing(result, &field),
                    Some(Value::Array(names)) if names.iter().all(Value::is_string) => {}
                    Some(_) => mistyped(result, &field, "a list of font names"),
                }
            }
        }
        Some(_) => mistyped(result, "typography.fontFamily", "an object"),
    }
    for scale in TypographyScale::ALL {
        check_token_map(
            typography.get(scale.as_str()),
            &format!("typography.{}", scale.as_str()),
            result,
        );
    }
}

fn check_effects_shape(effects: &Map<String, Value>, result: &mut ValidationResult) {
    for kind in EffectKind::ALL {
        check_token_map(effects.get(kind.as_str()), &format!("effects.{}", kind.as_str()), result);
    }
}

fn check_token_map(value: Option<&Value>, field: &str, result: &mut ValidationResult) {
    match value {
        None | Some(Value::Null) => missing(result, field),
        Some(Value::Object(tokens)) => {
            for (token, value) in tokens {
                if !value.is_string() {
                    mistyped(result, &format!("{field}.{token}"), "a string");
                }
            }
        }
        Some(_) => mistyped(result, field, "an object"),
    }
}

fn check_metadata(
    metadata: Option<&Value>,
    options: &ValidationOptions,
    result: &mut ValidationResult,
) {
    let report_missing = |result: &mut ValidationResult, field: &str| {
        let message = format!("{field} is missing");
        if options.require_all_fields {
            result.error(IssueKind::Structural, Severity::Medium, field, message);
        } else {
            result.warning(IssueKind::Structural, field, message);
        }
    };

    let Some(Value::Object(metadata)) = metadata else {
        report_missing(result, "metadata");
        return;
    };

    for key in METADATA_FIELDS {
        let field = format!("metadata.{key}");
        match metadata.get(key) {
            None | Some(Value::Null) => report_missing(result, &field),
            Some(Value::String(text)) if text.is_empty() && key != "description" => {
                report_missing(result, &field);
            }
            _ => {}
        }
    }

    match metadata.get("version") {
        Some(Value::String(version)) if !version.is_empty() => {
            if semver::Version::parse(version).is_err() {
                result.warning(
                    IssueKind::Structural,
                    "metadata.version",
                    format!("version '{version}' is not a semantic version"),
                );
            }
        }
        Some(Value::String(_)) | None | Some(Value::Null) => {}
        Some(_) => result.warning(
            IssueKind::Structural,
            "metadata.version",
            "version must be a string",
        ),
    }

    for key in ["createdAt", "updatedAt"] {
        if let Some(Value::String(stamp)) = metadata.get(key) {
            if chrono::DateTime::parse_from_rfc3339(stamp).is_err() {
                result.warning(
                    IssueKind::Structural,
                    format!("metadata.{key}"),
                    format!("'{stamp}' is not an RFC 3339 timestamp"),
                );
            }
        }
    }
}

// -----------------------------------------------------------------------------
// CSS values
// -----------------------------------------------------------------------------

fn css_error(result: &mut ValidationResult, field: impl Into<String>, message: impl Into<String>) {
    result.error(IssueKind::CssValue, Severity::Medium, field, message);
}

fn check_css(root: &Map<String, Value>, result: &mut ValidationResult) {
    if let Some(Value::Object(colors)) = root.get("colors") {
        for scale in ScaleName::ALL {
            let Some(Value::Object(shades)) = colors.get(scale.as_str()) else {
                continue;
            };
            for shade in ColorScale::SHADES {
                if let Some(Value::String(color)) = shades.get(&shade.to_string()) {
                    if !is_valid_color(color) {
                        css_error(
                            result,
                            format!("colors.{scale}.{shade}"),
                            format!("'{color}' is not a valid color"),
                        );
                    }
                }
            }
        }
        if let Some(Value::Object(semantic)) = colors.get("semantic") {
            for role in SemanticRole::ALL {
                if let Some(Value::String(color)) = semantic.get(role.as_str()) {
                    if !is_valid_color(color) {
                        css_error(
                            result,
                            format!("colors.semantic.{}", role.as_str()),
                            format!("'{color}' is not a valid color"),
                        );
                    }
                }
            }
        }
    }

    if let Some(Value::Object(gradients)) = root.get("gradients") {
        for name in GradientName::ALL {
            if let Some(Value::Object(gradient)) = gradients.get(name.as_str()) {
                check_gradient(name, gradient, result);
            }
        }
    }

    if let Some(Value::Object(effects)) = root.get("effects") {
        for kind in EffectKind::ALL {
            let Some(Value::Object(tokens)) = effects.get(kind.as_str()) else {
                continue;
            };
            let accepts: fn(&str) -> bool = match kind {
                EffectKind::Blur => is_valid_blur,
                EffectKind::Shadow => is_valid_shadow,
                EffectKind::BorderRadius => is_valid_radius,
            };
            for (token, value) in tokens {
                if let Value::String(value) = value {
                    if !accepts(value) {
                        css_error(
                            result,
                            format!("effects.{}.{token}", kind.as_str()),
                            format!("'{value}' is not a valid {} value", kind.as_str()),
                        );
                    }
                }
            }
        }
    }

    let families = root.get("typography").and_then(|t| t.get("fontFamily"));
    if let Some(Value::Object(families)) = families {
        for kind in FontFamilyKind::ALL {
            if let Some(Value::Array(names)) = families.get(kind.as_str()) {
                let empty_name = names
                    .iter()
                    .any(|n| n.as_str().is_some_and(|s| s.trim().is_empty()));
                if names.is_empty() || empty_name {
                    css_error(
                        result,
                        format!("typography.fontFamily.{}", kind.as_str()),
                        "font family list must contain at least one non-empty name",
                    );
                }
            }
        }
    }
}

/// Check one gradient. The reconstructed gradient string is only checked
/// once every part passed on its own, so each defect is reported once.
fn check_gradient(
    name: GradientName,
    gradient: &Map<String, Value>,
    result: &mut ValidationResult,
) {
    let field = format!("gradients.{}", name.as_str());
    let errors_before = result.errors.len();

    let direction = gradient.get("direction").and_then(Value::as_str);
    if let Some(direction) = direction {
        if !is_valid_direction(direction) {
            css_error(
                result,
                format!("{field}.direction"),
                format!("'{direction}' is not a valid gradient direction"),
            );
        }
    }

    let Some(Value::Array(stops)) = gradient.get("stops") else {
        return;
    };
    if stops.len() < 2 {
        css_error(
            result,
            format!("{field}.stops"),
            "gradient requires at least 2 color stops",
        );
    }

    let mut parsed = Vec::with_capacity(stops.len());
    for (i, stop) in stops.iter().enumerate() {
        let stop_field = format!("{field}.stops[{i}]");
        let color = stop.get("color").and_then(Value::as_str);
        match color {
            Some(color) if is_valid_color(color) => {}
            Some(color) => css_error(
                result,
                format!("{stop_field}.color"),
                format!("'{color}' is not a valid color"),
            ),
            None => css_error(result, format!("{stop_field}.color"), "stop color must be a string"),
        }
        let position = stop.get("position").and_then(Value::as_f64);
        match position {
            Some(p) if (0.0..=100.0).contains(&p) => {}
            Some(p) => css_error(
                result,
                format!("{stop_field}.position"),
                format!("position {p} must be between 0 and 100"),
            ),
            None => css_error(
                result,
                format!("{stop_field}.position"),
                "position must be a number between 0 and 100",
            ),
        }
        if let (Some(color), Some(position)) = (color, position) {
            parsed.push(GradientStop::new(color, position));
        }
    }

    if result.errors.len() == errors_before {
        if let Some(direction) = direction {
            let rendered = render_gradient(&Gradient::linear(direction, parsed));
            if !is_valid_gradient(&rendered) {
                css_error(
                    result,
                    field,
                    format!("reconstructed gradient '{rendered}' is not valid"),
                );
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Accessibility
// -----------------------------------------------------------------------------

fn color_at(root: &Map<String, Value>, scale: ScaleName, shade: u16) -> Option<Rgba> {
    let value = root
        .get("colors")?
        .get(scale.as_str())?
        .get(shade.to_string())?
        .as_str()?;
    parse_color(value)
}

fn check_accessibility(root: &Map<String, Value>, result: &mut ValidationResult) {
    for scale in ScaleName::ALL {
        let pair = (color_at(root, scale, 100), color_at(root, scale, 800));
        if let (Some(light), Some(dark)) = pair {
            let ratio = contrast_ratio(light, dark);
            if ratio < AA_NORMAL {
                result.error(
                    IssueKind::Accessibility,
                    Severity::Medium,
                    format!("colors.{scale}"),
                    format!(
                        "contrast between {scale}.100 and {scale}.800 is {ratio:.2}:1, \
                         below WCAG AA {AA_NORMAL}:1"
                    ),
                );
            } else if ratio >= AAA_NORMAL {
                trace!(scale = %scale, contrast = ratio, "Shade pair exceeds WCAG AAA");
            }
        }

        for shade in [700, 800, 900] {
            let Some(background) = color_at(root, scale, shade) else {
                continue;
            };
            let ratio = contrast_ratio(Rgba::WHITE, background);
            if ratio < AA_NORMAL {
                result.error(
                    IssueKind::Accessibility,
                    Severity::Medium,
                    format!("colors.{scale}.{shade}"),
                    format!(
                        "white text on {scale}.{shade} has contrast {ratio:.2}:1, \
                         below WCAG AA {AA_NORMAL}:1"
                    ),
                );
            }
        }

        for shade in [500, 600] {
            let Some(background) = color_at(root, scale, shade) else {
                continue;
            };
            let black = contrast_ratio(Rgba::BLACK, background);
            if (AA_LARGE..AA_NORMAL).contains(&black) {
                result.warning(
                    IssueKind::Accessibility,
                    format!("colors.{scale}.{shade}"),
                    format!(
                        "black text on {scale}.{shade} is marginal at {black:.2}:1; \
                         use it for large text only"
                    ),
                );
            }
        }
    }

    if let Some(Value::Object(gradients)) = root.get("gradients") {
        for name in GradientName::ALL {
            let stops = gradients.get(name.as_str()).and_then(|g| g.get("stops"));
            let Some(Value::Array(stops)) = stops else {
                continue;
            };
            let endpoint = |stop: Option<&Value>| {
                stop.and_then(|s| s.get("color"))
                    .and_then(Value::as_str)
                    .and_then(parse_color)
            };
            let endpoints = [
                ("start", endpoint(stops.first())),
                ("end", endpoint(stops.last())),
            ];
            for (label, color) in endpoints {
                let Some(color) = color else { continue };
                let ratio = contrast_ratio(Rgba::WHITE, color);
                if ratio < AA_LARGE {
                    result.warning(
                        IssueKind::Accessibility,
                        format!("gradients.{}", name.as_str()),
                        format!(
                            "white text on the gradient {label} has contrast {ratio:.2}:1, \
                             below {AA_LARGE}:1"
                        ),
                    );
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Harmony
// -----------------------------------------------------------------------------

/// Below this contrast two scales read as the same color.
const NEAR_DUPLICATE_CONTRAST: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temperature {
    Warm,
    Cool,
    Neutral,
}

fn temperature(color: Rgba) -> Temperature {
    let (hue, saturation, _) = color.to_hsl();
    if saturation < 0.15 {
        Temperature::Neutral
    } else if !(75.0..330.0).contains(&hue) {
        Temperature::Warm
    } else if (150.0..300.0).contains(&hue) {
        Temperature::Cool
    } else {
        Temperature::Neutral
    }
}

fn check_harmony(root: &Map<String, Value>, result: &mut ValidationResult) {
    let primary = color_at(root, ScaleName::Primary, 500);
    let secondary = color_at(root, ScaleName::Secondary, 500);
    let accent = color_at(root, ScaleName::Accent, 500);

    if let (Some(p), Some(s)) = (primary, secondary) {
        let ratio = contrast_ratio(p, s);
        if ratio < NEAR_DUPLICATE_CONTRAST {
            result.warning(
                IssueKind::Harmony,
                "colors.secondary",
                format!(
                    "primary and secondary are nearly indistinguishable ({ratio:.2}:1); \
                     consider a more distinct secondary hue"
                ),
            );
        }
    }

    let temperatures: Vec<Temperature> = [primary, secondary, accent]
        .into_iter()
        .flatten()
        .map(temperature)
        .collect();
    if temperatures.contains(&Temperature::Warm) && temperatures.contains(&Temperature::Cool) {
        result.warning(
            IssueKind::Harmony,
            "colors",
            "primary, secondary and accent mix warm and cool hues; \
             consider aligning their temperature",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn default_doc() -> Value {
        serde_json::to_value(Theme::extract()).expect("serialize")
    }

    #[test]
    fn test_default_theme_passes() {
        let result = validate(&Theme::extract(), &ValidationOptions::default());
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_non_object_is_critical() {
        let result = validate_document(&json!([1, 2, 3]), &ValidationOptions::default());
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].severity, Severity::Critical);
    }

    #[test]
    fn test_one_error_per_missing_top_level_field() {
        let doc = json!({ "id": "partial", "name": "Partial" });
        let result = validate_document(&doc, &ValidationOptions::default());
        assert!(!result.is_valid);
        let structural: Vec<&str> = result
            .errors
            .iter()
            .filter(|e| e.kind == IssueKind::Structural)
            .map(|e| e.field.as_str())
            .collect();
        assert_eq!(structural, vec!["colors", "gradients", "typography", "effects"]);
    }

    #[test]
    fn test_missing_shade_is_reported() {
        let mut doc = default_doc();
        doc["colors"]["accent"]
            .as_object_mut()
            .expect("object")
            .remove("300");
        let result = validate_document(&doc, &ValidationOptions::default());
        assert_eq!(result.errors_for("colors.accent.300").count(), 1);
    }

    #[test]
    fn test_id_and_name_rules() {
        let mut doc = default_doc();
        doc["id"] = json!("ab");
        doc["name"] = json!("");
        let result = validate_document(&doc, &ValidationOptions::default());
        assert_eq!(result.errors_for("id").count(), 1);
        assert_eq!(result.errors_for("name").count(), 1);

        doc["id"] = json!("has spaces");
        doc["name"] = json!("x".repeat(101));
        let result = validate_document(&doc, &ValidationOptions::default());
        assert_eq!(result.errors_for("id").count(), 1);
        assert_eq!(result.errors_for("name").count(), 1);
    }

    #[test]
    fn test_metadata_presence_respects_require_all_fields() {
        let mut doc = default_doc();
        doc.as_object_mut().expect("object").remove("metadata");

        let relaxed = validate_document(&doc, &ValidationOptions::default());
        assert!(relaxed.is_valid);
        assert!(relaxed.warnings.iter().any(|w| w.field == "metadata"));

        let strict_fields = ValidationOptions {
            require_all_fields: true,
            ..Default::default()
        };
        let result = validate_document(&doc, &strict_fields);
        assert!(!result.is_valid);
        assert_eq!(result.errors_for("metadata").count(), 1);
    }

    #[test]
    fn test_bad_semver_is_only_a_warning() {
        let mut doc = default_doc();
        doc["metadata"]["version"] = json!("v1");
        let result = validate_document(&doc, &ValidationOptions::default());
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.field == "metadata.version"));
    }

    #[test]
    fn test_invalid_color_is_css_error() {
        let mut doc = default_doc();
        doc["colors"]["primary"]["50"] = json!("not-a-color");
        let result = validate_document(&doc, &ValidationOptions::default());
        assert!(!result.is_valid);
        let issue = result.errors_for("colors.primary.50").next().expect("error");
        assert_eq!(issue.kind, IssueKind::CssValue);
    }

    #[test]
    fn test_out_of_range_stop_positions() {
        let mut doc = default_doc();
        doc["gradients"]["hero"]["stops"] = json!([
            { "color": "#059669", "position": 150 },
            { "color": "#4338ca", "position": -10 }
        ]);
        let result = validate_document(&doc, &ValidationOptions::default());
        let css: Vec<&ValidationIssue> = result
            .errors
            .iter()
            .filter(|e| e.kind == IssueKind::CssValue)
            .collect();
        assert_eq!(css.iter().filter(|e| e.field.ends_with(".position")).count(), 2);
        assert_eq!(css.iter().filter(|e| e.field.ends_with(".color")).count(), 0);
        assert_eq!(css.len(), 2);
    }

    #[test]
    fn test_single_stop_gradient() {
        let mut doc = default_doc();
        doc["gradients"]["card"]["stops"] = json!([{ "color": "#000", "position": 0 }]);
        let result = validate_document(&doc, &ValidationOptions::default());
        assert_eq!(result.errors_for("gradients.card.stops").count(), 1);
    }

    #[test]
    fn test_bad_direction() {
        let mut doc = default_doc();
        doc["gradients"]["button"]["direction"] = json!("diagonal");
        let result = validate_document(&doc, &ValidationOptions::default());
        assert_eq!(result.errors_for("gradients.button.direction").count(), 1);
    }

    #[test]
    fn test_effect_syntax() {
        let mut doc = default_doc();
        doc["effects"]["shadow"]["md"] = json!("huge");
        doc["effects"]["blur"]["sm"] = json!("blur(-1px)");
        doc["effects"]["borderRadius"]["lg"] = json!("round");
        let result = validate_document(&doc, &ValidationOptions::default());
        assert_eq!(result.errors_for("effects.shadow.md").count(), 1);
        assert_eq!(result.errors_for("effects.blur.sm").count(), 1);
        assert_eq!(result.errors_for("effects.borderRadius.lg").count(), 1);
    }

    #[test]
    fn test_css_stage_can_be_disabled() {
        let mut doc = default_doc();
        doc["colors"]["primary"]["50"] = json!("not-a-color");
        let options = ValidationOptions {
            validate_css: false,
            ..Default::default()
        };
        assert!(validate_document(&doc, &options).is_valid);
    }

    #[test]
    fn test_low_shade_contrast_is_error() {
        let mut doc = default_doc();
        doc["colors"]["neutral"]["800"] = json!("#cbd5e1");
        let result = validate_document(&doc, &ValidationOptions::default());
        let issue = result.errors_for("colors.neutral").next().expect("error");
        assert_eq!(issue.kind, IssueKind::Accessibility);
        assert_eq!(result.errors_for("colors.neutral.800").count(), 1);
    }

    #[test]
    fn test_accessibility_stage_can_be_disabled() {
        let mut doc = default_doc();
        doc["colors"]["neutral"]["800"] = json!("#cbd5e1");
        let options = ValidationOptions {
            check_accessibility: false,
            ..Default::default()
        };
        assert!(validate_document(&doc, &options).is_valid);
    }

    #[test]
    fn test_light_gradient_endpoint_warns() {
        let mut doc = default_doc();
        doc["gradients"]["hero"]["stops"][0]["color"] = json!("#fef3c7");
        let result = validate_document(&doc, &ValidationOptions::default());
        assert!(result.is_valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.field == "gradients.hero" && w.kind == IssueKind::Accessibility));
    }

    #[test]
    fn test_marginal_midtone_warns() {
        let mut doc = default_doc();
        let result = validate_document(&doc, &ValidationOptions::default());
        assert!(!result.warnings.iter().any(|w| w.field == "colors.neutral.500"));

        doc["colors"]["neutral"]["500"] = json!("#64748b");
        let result = validate_document(&doc, &ValidationOptions::default());
        assert!(result.warnings.iter().any(|w| w.field == "colors.neutral.500"));

        doc["colors"]["neutral"]["500"] = json!("#34d399");
        let result = validate_document(&doc, &ValidationOptions::default());
        assert!(!result.warnings.iter().any(|w| w.field == "colors.neutral.500"));
    }

    #[test]
    fn test_near_duplicate_hues_warn() {
        let mut doc = default_doc();
        doc["colors"]["secondary"]["500"] = json!("#10b981");
        let result = validate_document(&doc, &ValidationOptions::default());
        assert!(result.is_valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.field == "colors.secondary" && w.kind == IssueKind::Harmony));
    }

    #[test]
    fn test_strict_promotes_all_but_harmony() {
        let mut doc = default_doc();
        doc["metadata"]["version"] = json!("latest");
        let options = ValidationOptions {
            strict: true,
            ..Default::default()
        };
        let result = validate_document(&doc, &options);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "metadata.version"));
        assert!(result.errors.iter().all(|e| e.kind != IssueKind::Harmony));
        assert!(result.warnings.iter().all(|w| w.kind == IssueKind::Harmony));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ValidationOptions =
            serde_json::from_value(json!({ "strict": true, "validateCSS": false }))
                .expect("options");
        assert!(options.strict);
        assert!(!options.validate_css);
        assert!(options.check_accessibility);
    }

    #[test]
    fn test_merge_recomputes_validity() {
        let mut a = ValidationResult::default();
        let mut b = ValidationResult::default();
        b.error(IssueKind::Structural, Severity::High, "id", "id is required");
        a.merge(b);
        assert!(!a.is_valid);
        assert_eq!(a.errors.len(), 1);
    }
}

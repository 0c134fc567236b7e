//! Syntax checks for the CSS values a theme may carry.
//!
//! This is not a CSS parser. Each check accepts the narrow grammar themes
//! use: gradient directions, `linear-gradient(...)` strings, box shadows,
//! `blur(...)` filters, and border radii.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::color::is_valid_color;
use crate::model::Gradient;

static ANGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?\d*\.?\d+(deg|turn|rad|grad)$").expect("angle regex")
});

static LENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d*\.?\d+(px|rem|em)?$").expect("length regex"));

static BLUR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^blur\(\s*\d*\.?\d+(px|rem|em)?\s*\)$").expect("blur regex")
});

static RADIUS_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d*\.?\d+(px|rem|em|%)?$").expect("radius regex"));

static POSITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d*\.?\d+%$").expect("stop position regex"));

static GRADIENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:linear|radial)-gradient\((.+)\)$").expect("gradient regex")
});

const SIDES: [&str; 4] = ["top", "bottom", "left", "right"];

/// What kind of value a named property carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Color,
    Gradient,
    Shadow,
    Blur,
    Radius,
    FontFamily,
}

impl PropertyKind {
    /// Infer the kind from a property name such as `--theme-effects-shadow-md`.
    pub fn infer(property: &str) -> Self {
        let name = property.to_ascii_lowercase();
        if name.contains("gradient") {
            Self::Gradient
        } else if name.contains("shadow") {
            Self::Shadow
        } else if name.contains("blur") {
            Self::Blur
        } else if name.contains("radius") {
            Self::Radius
        } else if name.contains("font") {
            Self::FontFamily
        } else {
            Self::Color
        }
    }

    /// Check `value` against this kind's syntax.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::Color => is_valid_color(value),
            Self::Gradient => is_valid_gradient(value),
            Self::Shadow => is_valid_shadow(value),
            Self::Blur => is_valid_blur(value),
            Self::Radius => is_valid_radius(value),
            Self::FontFamily => is_valid_font_list(value),
        }
    }
}

/// Keyword directions (`to right`, `to top left`) or an angle.
pub fn is_valid_direction(direction: &str) -> bool {
    let direction = direction.trim();
    if ANGLE_RE.is_match(direction) {
        return true;
    }
    let mut words = direction.split_whitespace();
    if words.next() != Some("to") {
        return false;
    }
    let sides: Vec<&str> = words.collect();
    match sides.as_slice() {
        [side] => SIDES.contains(side),
        [vertical, horizontal] => {
            let is_vertical = |s: &str| s == "top" || s == "bottom";
            let is_horizontal = |s: &str| s == "left" || s == "right";
            (is_vertical(vertical) && is_horizontal(horizontal))
                || (is_horizontal(vertical) && is_vertical(horizontal))
        }
        _ => false,
    }
}

/// Render a gradient as a `linear-gradient(...)` function string.
pub fn render_gradient(gradient: &Gradient) -> String {
    let mut out = format!("linear-gradient({}", gradient.direction.trim());
    for stop in &gradient.stops {
        let _ = write!(out, ", {} {}%", stop.color.trim(), stop.position);
    }
    out.push(')');
    out
}

/// Validate a full gradient function string.
///
/// Requires at least two stops. Each stop is a color optionally followed by
/// a percentage in `[0, 100]`.
pub fn is_valid_gradient(value: &str) -> bool {
    let Some(args) = GRADIENT_RE
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    else {
        return false;
    };
    let parts = split_top_level(args, ',');
    let stops = match parts.first() {
        Some(first) if is_valid_direction(first) => &parts[1..],
        Some(first) if first.starts_with("to ") || ANGLE_LIKE.is_match(first) => return false,
        _ => &parts[..],
    };
    stops.len() >= 2 && stops.iter().all(|stop| is_valid_stop(stop))
}

static ANGLE_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d*\.?\d+[a-z]*$").expect("angle-like regex"));

fn is_valid_stop(stop: &str) -> bool {
    let stop = stop.trim();
    let tokens = split_top_level(stop, ' ');
    match tokens.as_slice() {
        [color] => is_valid_color(color),
        [color, position] if POSITION_RE.is_match(position) => {
            let percent: Option<f64> = position.trim_end_matches('%').parse().ok();
            is_valid_color(color) && percent.is_some_and(|p| (0.0..=100.0).contains(&p))
        }
        _ => false,
    }
}

/// Color of the first stop of a gradient string, if it has one.
pub fn first_stop_color(value: &str) -> Option<String> {
    let args = GRADIENT_RE.captures(value.trim())?.get(1)?.as_str();
    split_top_level(args, ',')
        .into_iter()
        .filter(|part| !is_valid_direction(part))
        .find_map(|stop| {
            let color = split_top_level(&stop, ' ').into_iter().next()?;
            is_valid_color(&color).then_some(color)
        })
}

/// Box shadow: optional `inset`, two to four lengths, then a color.
/// Multiple layers are comma-separated.
pub fn is_valid_shadow(value: &str) -> bool {
    let value = value.trim();
    if value == "none" {
        return true;
    }
    let layers = split_top_level(value, ',');
    !layers.is_empty() && layers.iter().all(|layer| is_valid_shadow_layer(layer))
}

fn is_valid_shadow_layer(layer: &str) -> bool {
    let mut tokens = split_top_level(layer, ' ');
    if tokens.first().is_some_and(|t| t == "inset") {
        tokens.remove(0);
    }
    let Some((color, lengths)) = tokens.split_last() else {
        return false;
    };
    (2..=4).contains(&lengths.len())
        && lengths.iter().all(|len| LENGTH_RE.is_match(len))
        && is_valid_color(color)
}

/// `blur(<non-negative length>)`.
pub fn is_valid_blur(value: &str) -> bool {
    BLUR_RE.is_match(value.trim())
}

/// One to four non-negative lengths or percentages, or `full` / `9999px`.
pub fn is_valid_radius(value: &str) -> bool {
    let value = value.trim();
    if value == "full" || value == "9999px" {
        return true;
    }
    let tokens: Vec<&str> = value.split_whitespace().collect();
    (1..=4).contains(&tokens.len()) && tokens.iter().all(|t| RADIUS_TOKEN_RE.is_match(t))
}

/// A non-empty comma-separated list of non-empty family names.
pub fn is_valid_font_list(value: &str) -> bool {
    let names: Vec<&str> = value.split(',').map(str::trim).collect();
    !value.trim().is_empty()
        && names.iter().all(|name| !name.is_empty())
        && !value.contains([';', '{', '}'])
}

/// Split on `sep` outside parentheses, trimming and dropping empty parts.
fn split_top_level(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in input.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if c == sep && depth == 0 => {
                let part = current.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                current.clear();
            }
            c => current.push(c),
        }
    }
    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
    parts
}

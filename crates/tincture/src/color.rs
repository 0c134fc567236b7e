//! CSS color parsing.
//!
//! Accepts the syntaxes themes are allowed to use: hex (`#rgb`, `#rrggbb`,
//! `#rrggbbaa`), `rgb()`/`rgba()`, `hsl()`/`hsla()`, `oklch()`, and a fixed
//! set of keywords. Conversion to sRGB is approximate; it only needs to be
//! good enough for contrast scoring.

use std::sync::LazyLock;

use regex::Regex;

/// An sRGB color with alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Lowercase `#rrggbb` form, alpha dropped.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Hue in degrees, saturation and lightness in `0.0..=1.0`.
    pub fn to_hsl(self) -> (f64, f64, f64) {
        rgb_to_hsl(self.r, self.g, self.b)
    }
}

/// Keywords accepted as colors. `currentcolor` has no fixed value.
const KEYWORDS: &[(&str, Option<(u8, u8, u8, f64)>)] = &[
    ("black", Some((0, 0, 0, 1.0))),
    ("white", Some((255, 255, 255, 1.0))),
    ("red", Some((255, 0, 0, 1.0))),
    ("green", Some((0, 128, 0, 1.0))),
    ("blue", Some((0, 0, 255, 1.0))),
    ("yellow", Some((255, 255, 0, 1.0))),
    ("orange", Some((255, 165, 0, 1.0))),
    ("purple", Some((128, 0, 128, 1.0))),
    ("pink", Some((255, 192, 203, 1.0))),
    ("brown", Some((165, 42, 42, 1.0))),
    ("gray", Some((128, 128, 128, 1.0))),
    ("grey", Some((128, 128, 128, 1.0))),
    ("cyan", Some((0, 255, 255, 1.0))),
    ("magenta", Some((255, 0, 255, 1.0))),
    ("navy", Some((0, 0, 128, 1.0))),
    ("teal", Some((0, 128, 128, 1.0))),
    ("silver", Some((192, 192, 192, 1.0))),
    ("maroon", Some((128, 0, 0, 1.0))),
    ("olive", Some((128, 128, 0, 1.0))),
    ("lime", Some((0, 255, 0, 1.0))),
    ("aqua", Some((0, 255, 255, 1.0))),
    ("fuchsia", Some((255, 0, 255, 1.0))),
    ("transparent", Some((0, 0, 0, 0.0))),
    ("currentcolor", None),
];

static HEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-f]{3}|[0-9a-f]{6}|[0-9a-f]{8})$").expect("hex color regex")
});

static RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*(\d*\.?\d+)\s*)?\)$",
    )
    .expect("rgb color regex")
});

static HSL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^hsla?\(\s*(\d*\.?\d+)(?:deg)?\s*,\s*(\d*\.?\d+)%\s*,\s*(\d*\.?\d+)%\s*",
        r"(?:,\s*(\d*\.?\d+)\s*)?\)$",
    ))
    .expect("hsl color regex")
});

static OKLCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^oklch\(\s*(\d*\.?\d+)(%?)\s+(\d*\.?\d+)\s+(\d*\.?\d+)(?:deg)?\s*",
        r"(?:/\s*(\d*\.?\d+)(%?)\s*)?\)$",
    ))
    .expect("oklch color regex")
});

/// Whether `value` uses one of the accepted color syntaxes.
pub fn is_valid_color(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    if KEYWORDS.iter().any(|(name, _)| *name == value) {
        return true;
    }
    parse_functional(&value).is_some()
}

/// Parse a color into sRGB. Returns `None` for invalid input and for
/// keywords without a fixed value.
pub fn parse_color(value: &str) -> Option<Rgba> {
    let value = value.trim().to_ascii_lowercase();
    if let Some((_, rgb)) = KEYWORDS.iter().find(|(name, _)| *name == value) {
        return rgb.map(|(r, g, b, a)| Rgba { r, g, b, a });
    }
    parse_functional(&value)
}

fn parse_functional(value: &str) -> Option<Rgba> {
    if value.starts_with('#') {
        parse_hex(value)
    } else if value.starts_with("rgb") {
        parse_rgb(value)
    } else if value.starts_with("hsl") {
        parse_hsl(value)
    } else if value.starts_with("oklch") {
        parse_oklch(value)
    } else {
        None
    }
}

fn parse_hex(value: &str) -> Option<Rgba> {
    let digits = HEX_RE.captures(value)?.get(1)?.as_str();
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        3 => {
            let expand = |i: usize| channel(&digits[i..=i].repeat(2));
            Some(Rgba::opaque(expand(0)?, expand(1)?, expand(2)?))
        }
        6 | 8 => {
            let alpha = if digits.len() == 8 {
                f64::from(channel(&digits[6..8])?) / 255.0
            } else {
                1.0
            };
            Some(Rgba {
                r: channel(&digits[0..2])?,
                g: channel(&digits[2..4])?,
                b: channel(&digits[4..6])?,
                a: alpha,
            })
        }
        _ => None,
    }
}

fn parse_alpha(raw: Option<regex::Match<'_>>, percent: bool) -> Option<f64> {
    let Some(raw) = raw else { return Some(1.0) };
    let mut alpha: f64 = raw.as_str().parse().ok()?;
    if percent {
        alpha /= 100.0;
    }
    (0.0..=1.0).contains(&alpha).then_some(alpha)
}

fn parse_rgb(value: &str) -> Option<Rgba> {
    let caps = RGB_RE.captures(value)?;
    let channel = |i: usize| caps.get(i)?.as_str().parse::<u8>().ok();
    Some(Rgba {
        r: channel(1)?,
        g: channel(2)?,
        b: channel(3)?,
        a: parse_alpha(caps.get(4), false)?,
    })
}

fn parse_hsl(value: &str) -> Option<Rgba> {
    let caps = HSL_RE.captures(value)?;
    let number = |i: usize| caps.get(i)?.as_str().parse::<f64>().ok();
    let (h, s, l) = (number(1)?, number(2)?, number(3)?);
    if h > 360.0 || s > 100.0 || l > 100.0 {
        return None;
    }
    let (r, g, b) = hsl_to_rgb(h, s / 100.0, l / 100.0);
    Some(Rgba {
        r,
        g,
        b,
        a: parse_alpha(caps.get(4), false)?,
    })
}

#[allow(clippy::suboptimal_flops, clippy::many_single_char_names)]
fn parse_oklch(value: &str) -> Option<Rgba> {
    let caps = OKLCH_RE.captures(value)?;
    let number = |i: usize| caps.get(i)?.as_str().parse::<f64>().ok();
    let mut lightness = number(1)?;
    if caps.get(2).is_some_and(|m| !m.as_str().is_empty()) {
        lightness /= 100.0;
    }
    let chroma = number(3)?;
    let hue = number(4)?;
    if lightness > 1.0 || hue > 360.0 {
        return None;
    }
    let alpha_percent = caps.get(6).is_some_and(|m| !m.as_str().is_empty());
    let alpha = parse_alpha(caps.get(5), alpha_percent)?;

    let (a, b) = {
        let radians = hue.to_radians();
        (chroma * radians.cos(), chroma * radians.sin())
    };
    let l_ = lightness + 0.396_337_777_4 * a + 0.215_803_757_3 * b;
    let m_ = lightness - 0.105_561_345_8 * a - 0.063_854_172_8 * b;
    let s_ = lightness - 0.089_484_177_5 * a - 1.291_485_548_0 * b;
    let (l, m, s) = (l_.powi(3), m_.powi(3), s_.powi(3));

    let r = 4.076_741_662_1 * l - 3.307_711_591_3 * m + 0.230_969_929_2 * s;
    let g = -1.268_438_004_6 * l + 2.609_757_401_1 * m - 0.341_319_396_5 * s;
    let bl = -0.004_196_086_3 * l - 0.703_418_614_7 * m + 1.707_614_701_0 * s;

    Some(Rgba {
        r: linear_to_srgb_byte(r),
        g: linear_to_srgb_byte(g),
        b: linear_to_srgb_byte(bl),
        a: alpha,
    })
}

fn linear_to_srgb_byte(channel: f64) -> u8 {
    let channel = channel.clamp(0.0, 1.0);
    let encoded = if channel <= 0.003_130_8 {
        12.92 * channel
    } else {
        1.055 * channel.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round().clamp(0.0, 255.0) as u8
}

#[allow(clippy::many_single_char_names)]
fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = f64::midpoint(max, min);

    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let mut h = if (max - r).abs() < f64::EPSILON {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    h /= 6.0;
    (h * 360.0, s, l)
}

#[allow(clippy::many_single_char_names, clippy::suboptimal_flops)]
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let h = h / 360.0;
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse_color("#fff"), Some(Rgba::WHITE));
        assert_eq!(parse_color("#10B981"), Some(Rgba::opaque(16, 185, 129)));
        let translucent = parse_color("#00000080").expect("hex8");
        assert!((translucent.a - 128.0 / 255.0).abs() < 1e-9);
        assert!(!is_valid_color("#ffff"));
        assert!(!is_valid_color("#gggggg"));
    }

    #[test]
    fn test_rgb_forms() {
        assert_eq!(parse_color("rgb(1, 2, 3)"), Some(Rgba::opaque(1, 2, 3)));
        assert!(is_valid_color("rgba(0, 0, 0, 0.5)"));
        assert!(!is_valid_color("rgb(256, 0, 0)"));
        assert!(!is_valid_color("rgba(0, 0, 0, 1.5)"));
    }

    #[test]
    fn test_hsl_forms() {
        assert_eq!(parse_color("hsl(0, 100%, 50%)"), Some(Rgba::opaque(255, 0, 0)));
        assert!(is_valid_color("hsla(210, 40%, 50%, 0.3)"));
        assert!(!is_valid_color("hsl(210, 140%, 50%)"));
    }

    #[test]
    fn test_oklch_is_approximately_srgb() {
        let white = parse_color("oklch(100% 0 0)").expect("oklch white");
        assert_eq!((white.r, white.g, white.b), (255, 255, 255));
        let black = parse_color("oklch(0 0 0)").expect("oklch black");
        assert_eq!((black.r, black.g, black.b), (0, 0, 0));
        assert!(is_valid_color("oklch(0.7 0.15 160 / 50%)"));
        assert!(!is_valid_color("oklch(0.7, 0.15, 160)"));
    }

    #[test]
    fn test_keywords() {
        assert!(is_valid_color("currentColor"));
        assert_eq!(parse_color("currentcolor"), None);
        assert_eq!(parse_color("Navy"), Some(Rgba::opaque(0, 0, 128)));
        assert!(!is_valid_color("not-a-color"));
        assert!(!is_valid_color(""));
    }

    #[test]
    fn test_hsl_round_trip_on_primaries() {
        for color in [Rgba::opaque(255, 0, 0), Rgba::opaque(0, 255, 0), Rgba::opaque(0, 0, 255)] {
            let (h, s, l) = color.to_hsl();
            assert_eq!(hsl_to_rgb(h, s, l), (color.r, color.g, color.b));
        }
    }
}

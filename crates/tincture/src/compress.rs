//! Compact on-wire form of a theme.
//!
//! Keys are renamed to single letters per section (`i`, `n`, `c`, `g`, `t`,
//! `e`, `m` at the root). Values are untouched, so [`decompress`] restores
//! the exact document.

use serde_json::{Map, Value};

use crate::error::CompressError;
use crate::model::Theme;

/// Schema of the JSON tree, with the short key for each field.
enum Shape {
    Leaf,
    /// Object with known keys: `(long, short, shape)`.
    Fields(&'static str, &'static [(&'static str, &'static str, &'static Shape)]),
    /// Array whose elements share one shape.
    List(&'static Shape),
}

static LEAF: Shape = Shape::Leaf;

static STOP: Shape = Shape::Fields(
    "gradient stop",
    &[("color", "c", &LEAF), ("position", "p", &LEAF)],
);

static STOPS: Shape = Shape::List(&STOP);

static GRADIENT: Shape = Shape::Fields(
    "gradient",
    &[("direction", "d", &LEAF), ("stops", "s", &STOPS)],
);

static GRADIENTS: Shape = Shape::Fields(
    "gradients",
    &[
        ("hero", "h", &GRADIENT),
        ("card", "c", &GRADIENT),
        ("button", "b", &GRADIENT),
        ("background", "g", &GRADIENT),
        ("accent", "a", &GRADIENT),
    ],
);

static SEMANTIC: Shape = Shape::Fields(
    "semantic colors",
    &[
        ("success", "s", &LEAF),
        ("warning", "w", &LEAF),
        ("error", "e", &LEAF),
        ("info", "i", &LEAF),
    ],
);

static COLORS: Shape = Shape::Fields(
    "colors",
    &[
        ("primary", "p", &LEAF),
        ("secondary", "s", &LEAF),
        ("accent", "a", &LEAF),
        ("neutral", "n", &LEAF),
        ("semantic", "x", &SEMANTIC),
    ],
);

static FONT_FAMILY: Shape = Shape::Fields(
    "font families",
    &[("sans", "s", &LEAF), ("serif", "r", &LEAF), ("mono", "m", &LEAF)],
);

static TYPOGRAPHY: Shape = Shape::Fields(
    "typography",
    &[
        ("fontFamily", "f", &FONT_FAMILY),
        ("fontSize", "s", &LEAF),
        ("fontWeight", "w", &LEAF),
        ("lineHeight", "l", &LEAF),
    ],
);

static EFFECTS: Shape = Shape::Fields(
    "effects",
    &[("blur", "b", &LEAF), ("shadow", "s", &LEAF), ("borderRadius", "r", &LEAF)],
);

static METADATA: Shape = Shape::Fields(
    "metadata",
    &[
        ("name", "n", &LEAF),
        ("description", "d", &LEAF),
        ("author", "a", &LEAF),
        ("version", "v", &LEAF),
        ("createdAt", "c", &LEAF),
        ("updatedAt", "u", &LEAF),
        ("tags", "t", &LEAF),
    ],
);

static ROOT: Shape = Shape::Fields(
    "theme",
    &[
        ("id", "i", &LEAF),
        ("name", "n", &LEAF),
        ("colors", "c", &COLORS),
        ("gradients", "g", &GRADIENTS),
        ("typography", "t", &TYPOGRAPHY),
        ("effects", "e", &EFFECTS),
        ("metadata", "m", &METADATA),
    ],
);

#[derive(Clone, Copy)]
enum Direction {
    Compress,
    Expand,
}

fn rename(value: &Value, shape: &Shape, direction: Direction) -> Result<Value, CompressError> {
    match shape {
        Shape::Leaf => Ok(value.clone()),
        Shape::List(element) => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| rename(item, element, direction))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        },
        Shape::Fields(context, fields) => {
            let Value::Object(map) = value else {
                return Err(CompressError::ExpectedObject(*context));
            };
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                let entry = fields.iter().find(|(long, short, _)| match direction {
                    Direction::Compress => *long == key.as_str(),
                    Direction::Expand => *short == key.as_str(),
                });
                let Some((long, short, child_shape)) = entry else {
                    return Err(CompressError::UnknownKey {
                        context: *context,
                        key: key.clone(),
                    });
                };
                let renamed = match direction {
                    Direction::Compress => *short,
                    Direction::Expand => *long,
                };
                out.insert(renamed.to_string(), rename(child, child_shape, direction)?);
            }
            Ok(Value::Object(out))
        }
    }
}

/// Compact a theme into short-key JSON.
///
/// # Errors
/// Returns [`CompressError`] if the theme cannot be serialized.
pub fn compress(theme: &Theme) -> Result<Value, CompressError> {
    let value = serde_json::to_value(theme)?;
    rename(&value, &ROOT, Direction::Compress)
}

/// Restore a theme from short-key JSON.
///
/// # Errors
/// Returns [`CompressError`] on unknown keys or if the result is not a theme.
pub fn decompress(value: &Value) -> Result<Theme, CompressError> {
    let expanded = rename(value, &ROOT, Direction::Expand)?;
    Ok(serde_json::from_value(expanded)?)
}

/// [`compress`] to a JSON string.
///
/// # Errors
/// Returns [`CompressError`] if serialization fails.
pub fn compress_str(theme: &Theme) -> Result<String, CompressError> {
    Ok(serde_json::to_string(&compress(theme)?)?)
}

/// [`decompress`] from a JSON string.
///
/// # Errors
/// Returns [`CompressError`] if parsing or expansion fails.
pub fn decompress_str(text: &str) -> Result<Theme, CompressError> {
    decompress(&serde_json::from_str(text)?)
}

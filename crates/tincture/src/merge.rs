//! Completing partial theme documents from the built-in default.
//!
//! Admin-authored presets often carry only a few sections. Before validation
//! every document is deep-merged over the default so a missing section never
//! fails application on its own.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::model::{Effects, Theme, ThemeColors, ThemeGradients, ThemeMetadata, Typography};

/// Recursively overlay `overlay` onto `base`.
///
/// Objects merge key by key. Any other value in `overlay` replaces the value
/// in `base`, including arrays and mistyped values. `null` leaves `base`
/// untouched.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None if value.is_null() => {}
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Merge `document` over `defaults` and return the merged JSON.
///
/// Non-object documents are returned as-is so validation can reject them.
pub fn merge_document(document: &Value, defaults: &Theme) -> Value {
    if !document.is_object() {
        return document.clone();
    }
    match serde_json::to_value(defaults) {
        Ok(mut merged) => {
            deep_merge(&mut merged, document);
            merged
        }
        Err(err) => {
            warn!(error = %err, "Default theme could not be serialized for merging");
            document.clone()
        }
    }
}

/// Build a typed theme from a merged document.
///
/// Sections that still fail to deserialize (a mistyped leaf, for instance)
/// are replaced by the default's section. String `id`/`name` values are kept.
pub fn theme_from_merged(merged: &Value, defaults: &Theme) -> Theme {
    if let Ok(theme) = serde_json::from_value::<Theme>(merged.clone()) {
        return theme;
    }

    let mut theme = defaults.clone();
    if let Some(id) = merged.get("id").and_then(Value::as_str) {
        theme.id = id.to_string();
    }
    if let Some(name) = merged.get("name").and_then(Value::as_str) {
        theme.name = name.to_string();
    }

    let mut replaced = Vec::new();
    if !adopt::<ThemeColors>(merged, "colors", &mut theme.colors) {
        replaced.push("colors");
    }
    if !adopt::<ThemeGradients>(merged, "gradients", &mut theme.gradients) {
        replaced.push("gradients");
    }
    if !adopt::<Typography>(merged, "typography", &mut theme.typography) {
        replaced.push("typography");
    }
    if !adopt::<Effects>(merged, "effects", &mut theme.effects) {
        replaced.push("effects");
    }
    if !adopt::<ThemeMetadata>(merged, "metadata", &mut theme.metadata) {
        replaced.push("metadata");
    }

    warn!(
        theme.id = %theme.id,
        theme.replaced_sections = ?replaced,
        "Replaced malformed theme sections with defaults"
    );
    theme
}

/// Deserialize one section into `slot`. Returns `false` if it was unusable.
fn adopt<T: DeserializeOwned>(merged: &Value, key: &str, slot: &mut T) -> bool {
    let Some(section) = merged.get(key) else {
        return false;
    };
    match serde_json::from_value::<T>(section.clone()) {
        Ok(value) => {
            *slot = value;
            true
        }
        Err(_) => false,
    }
}

/// Merge and convert in one step.
pub fn merge_with_defaults(document: &Value, defaults: &Theme) -> Theme {
    theme_from_merged(&merge_document(document, defaults), defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge_overlays_leaves() {
        let mut base = json!({ "a": { "b": 1, "c": 2 }, "d": [1, 2] });
        deep_merge(&mut base, &json!({ "a": { "c": 3 }, "d": [9], "e": null }));
        assert_eq!(base, json!({ "a": { "b": 1, "c": 3 }, "d": [9] }));
    }

    #[test]
    fn test_partial_document_is_completed() {
        let defaults = Theme::extract();
        let doc = json!({
            "id": "t1",
            "name": "T",
            "colors": { "primary": { "500": "#10b981", "100": "#ecfdf5", "800": "#000000" } }
        });
        let theme = merge_with_defaults(&doc, &defaults);
        assert_eq!(theme.id, "t1");
        assert_eq!(theme.colors.primary.s800, "#000000");
        assert_eq!(theme.colors.primary.s300, defaults.colors.primary.s300);
        assert_eq!(theme.gradients.hero, defaults.gradients.hero);
    }

    #[test]
    fn test_mistyped_section_falls_back_to_default() {
        let defaults = Theme::extract();
        let doc = json!({ "id": "typo", "name": "Typo", "colors": { "primary": { "500": 42 } } });
        let theme = merge_with_defaults(&doc, &defaults);
        assert_eq!(theme.id, "typo");
        assert_eq!(theme.colors, defaults.colors);
    }

    #[test]
    fn test_non_object_document_passes_through() {
        let defaults = Theme::extract();
        assert_eq!(merge_document(&json!("nope"), &defaults), json!("nope"));
    }
}

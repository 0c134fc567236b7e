//! Typed addressing of theme fields.
//!
//! [`ThemePath`] names every addressable part of a [`Theme`], from whole
//! sections down to single shades. Dotted strings such as
//! `"colors.primary.500"` are parsed once into a path and every read, write,
//! and copy then goes through exhaustive matches over the schema.

use std::fmt;

use crate::error::PathError;
use crate::model::{
    EffectKind, FontFamilyKind, GradientName, ScaleName, SemanticRole, Theme, TypographyScale,
};

/// String fields of [`ThemeMetadata`](crate::model::ThemeMetadata).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Name,
    Description,
    Author,
    Version,
}

impl MetadataField {
    const ALL: [Self; 4] = [Self::Name, Self::Description, Self::Author, Self::Version];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Author => "author",
            Self::Version => "version",
        }
    }
}

/// A location inside a theme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThemePath {
    Id,
    Name,
    Colors,
    Scale(ScaleName),
    Shade(ScaleName, u16),
    Semantics,
    Semantic(SemanticRole),
    Gradients,
    Gradient(GradientName),
    Typography,
    FontFamilies,
    FontFamily(FontFamilyKind),
    TypographyScale(TypographyScale),
    TypographyToken(TypographyScale, String),
    Effects,
    EffectScale(EffectKind),
    Effect(EffectKind, String),
    Metadata,
    MetadataText(MetadataField),
}

impl ThemePath {
    /// Parse a dotted path that must address a known field exactly.
    ///
    /// # Errors
    /// Returns [`PathError::Unknown`] when the path is not part of the schema.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments: Vec<&str> = path.split('.').collect();
        Self::from_segments(&segments).ok_or_else(|| PathError::Unknown(path.to_string()))
    }

    /// Resolve the longest known prefix of a field path.
    ///
    /// Validation reports fields like `gradients.hero.stops[1].position`;
    /// this maps them to the nearest addressable part (`gradients.hero`).
    pub fn resolve(field: &str) -> Option<Self> {
        let segments: Vec<&str> = field
            .split('.')
            .map(|segment| segment.split('[').next().unwrap_or(segment))
            .collect();
        (1..=segments.len())
            .rev()
            .find_map(|len| Self::from_segments(&segments[..len]))
    }

    fn from_segments(segments: &[&str]) -> Option<Self> {
        let path = match segments {
            ["id"] => Self::Id,
            ["name"] => Self::Name,
            ["colors"] => Self::Colors,
            ["colors", "semantic"] => Self::Semantics,
            ["colors", "semantic", role] => Self::Semantic(SemanticRole::parse(role)?),
            ["colors", scale] => Self::Scale(ScaleName::parse(scale)?),
            ["colors", scale, shade] => {
                let shade: u16 = shade.parse().ok()?;
                if !crate::model::ColorScale::SHADES.contains(&shade) {
                    return None;
                }
                Self::Shade(ScaleName::parse(scale)?, shade)
            }
            ["gradients"] => Self::Gradients,
            ["gradients", name] => Self::Gradient(GradientName::parse(name)?),
            ["typography"] => Self::Typography,
            ["typography", "fontFamily"] => Self::FontFamilies,
            ["typography", "fontFamily", kind] => Self::FontFamily(FontFamilyKind::parse(kind)?),
            ["typography", scale] => Self::TypographyScale(TypographyScale::parse(scale)?),
            ["typography", scale, token] => {
                Self::TypographyToken(TypographyScale::parse(scale)?, (*token).to_string())
            }
            ["effects"] => Self::Effects,
            ["effects", kind] => Self::EffectScale(EffectKind::parse(kind)?),
            ["effects", kind, token] => {
                Self::Effect(EffectKind::parse(kind)?, (*token).to_string())
            }
            ["metadata"] => Self::Metadata,
            ["metadata", field] => {
                match MetadataField::ALL.into_iter().find(|f| f.as_str() == *field) {
                    Some(field) => Self::MetadataText(field),
                    None => return None,
                }
            }
            _ => return None,
        };
        Some(path)
    }

    /// Read a string leaf. Font families are joined with `", "`.
    pub fn get(&self, theme: &Theme) -> Option<String> {
        let value = match self {
            Self::Id => theme.id.clone(),
            Self::Name => theme.name.clone(),
            Self::Shade(scale, shade) => theme.colors.scale(*scale).shade(*shade)?.to_string(),
            Self::Semantic(role) => theme.colors.semantic.get(*role).to_string(),
            Self::FontFamily(kind) => theme.typography.font_family.get(*kind).join(", "),
            Self::TypographyToken(scale, token) => {
                theme.typography.scale(*scale).get(token)?.clone()
            }
            Self::Effect(kind, token) => theme.effects.get(*kind).get(token)?.clone(),
            Self::MetadataText(field) => match field {
                MetadataField::Name => theme.metadata.name.clone(),
                MetadataField::Description => theme.metadata.description.clone(),
                MetadataField::Author => theme.metadata.author.clone(),
                MetadataField::Version => theme.metadata.version.clone(),
            },
            _ => return None,
        };
        Some(value)
    }

    /// Write a string leaf. Font families are split on commas.
    ///
    /// # Errors
    /// Returns [`PathError::NotALeaf`] for section paths.
    pub fn set(&self, theme: &mut Theme, value: &str) -> Result<(), PathError> {
        let value = value.to_string();
        match self {
            Self::Id => theme.id = value,
            Self::Name => theme.name = value,
            Self::Shade(scale, shade) => {
                let slot = theme
                    .colors
                    .scale_mut(*scale)
                    .shade_mut(*shade)
                    .ok_or_else(|| PathError::Unknown(self.to_string()))?;
                *slot = value;
            }
            Self::Semantic(role) => *theme.colors.semantic.get_mut(*role) = value,
            Self::FontFamily(kind) => {
                *theme.typography.font_family.get_mut(*kind) = value
                    .split(',')
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect();
            }
            Self::TypographyToken(scale, token) => {
                theme.typography.scale_mut(*scale).insert(token.clone(), value);
            }
            Self::Effect(kind, token) => {
                theme.effects.get_mut(*kind).insert(token.clone(), value);
            }
            Self::MetadataText(field) => match field {
                MetadataField::Name => theme.metadata.name = value,
                MetadataField::Description => theme.metadata.description = value,
                MetadataField::Author => theme.metadata.author = value,
                MetadataField::Version => theme.metadata.version = value,
            },
            _ => return Err(PathError::NotALeaf(self.to_string())),
        }
        Ok(())
    }

    /// Copy the addressed part from `source` into `target`.
    pub fn copy_from(&self, target: &mut Theme, source: &Theme) {
        match self {
            Self::Id => target.id.clone_from(&source.id),
            Self::Name => target.name.clone_from(&source.name),
            Self::Colors => target.colors = source.colors.clone(),
            Self::Scale(scale) => {
                *target.colors.scale_mut(*scale) = source.colors.scale(*scale).clone();
            }
            Self::Shade(scale, shade) => {
                if let (Some(slot), Some(value)) = (
                    target.colors.scale_mut(*scale).shade_mut(*shade),
                    source.colors.scale(*scale).shade(*shade),
                ) {
                    *slot = value.to_string();
                }
            }
            Self::Semantics => target.colors.semantic = source.colors.semantic.clone(),
            Self::Semantic(role) => {
                *target.colors.semantic.get_mut(*role) =
                    source.colors.semantic.get(*role).to_string();
            }
            Self::Gradients => target.gradients = source.gradients.clone(),
            Self::Gradient(name) => {
                *target.gradients.get_mut(*name) = source.gradients.get(*name).clone();
            }
            Self::Typography => target.typography = source.typography.clone(),
            Self::FontFamilies => {
                target.typography.font_family = source.typography.font_family.clone();
            }
            Self::FontFamily(kind) => {
                *target.typography.font_family.get_mut(*kind) =
                    source.typography.font_family.get(*kind).to_vec();
            }
            Self::TypographyScale(scale) => {
                *target.typography.scale_mut(*scale) = source.typography.scale(*scale).clone();
            }
            Self::TypographyToken(scale, token) => {
                let target_scale = target.typography.scale_mut(*scale);
                match source.typography.scale(*scale).get(token) {
                    Some(value) => {
                        target_scale.insert(token.clone(), value.clone());
                    }
                    None => {
                        target_scale.remove(token);
                    }
                }
            }
            Self::Effects => target.effects = source.effects.clone(),
            Self::EffectScale(kind) => {
                *target.effects.get_mut(*kind) = source.effects.get(*kind).clone();
            }
            Self::Effect(kind, token) => {
                let target_scale = target.effects.get_mut(*kind);
                match source.effects.get(*kind).get(token) {
                    Some(value) => {
                        target_scale.insert(token.clone(), value.clone());
                    }
                    None => {
                        target_scale.remove(token);
                    }
                }
            }
            Self::Metadata | Self::MetadataText(_) => target.metadata = source.metadata.clone(),
        }
    }

    /// Top-level section this path belongs to.
    pub fn section(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Colors
            | Self::Scale(_)
            | Self::Shade(..)
            | Self::Semantics
            | Self::Semantic(_) => "colors",
            Self::Gradients | Self::Gradient(_) => "gradients",
            Self::Typography
            | Self::FontFamilies
            | Self::FontFamily(_)
            | Self::TypographyScale(_)
            | Self::TypographyToken(..) => "typography",
            Self::Effects | Self::EffectScale(_) | Self::Effect(..) => "effects",
            Self::Metadata | Self::MetadataText(_) => "metadata",
        }
    }
}

impl fmt::Display for ThemePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("id"),
            Self::Name => f.write_str("name"),
            Self::Colors => f.write_str("colors"),
            Self::Scale(scale) => write!(f, "colors.{scale}"),
            Self::Shade(scale, shade) => write!(f, "colors.{scale}.{shade}"),
            Self::Semantics => f.write_str("colors.semantic"),
            Self::Semantic(role) => write!(f, "colors.semantic.{}", role.as_str()),
            Self::Gradients => f.write_str("gradients"),
            Self::Gradient(name) => write!(f, "gradients.{}", name.as_str()),
            Self::Typography => f.write_str("typography"),
            Self::FontFamilies => f.write_str("typography.fontFamily"),
            Self::FontFamily(kind) => write!(f, "typography.fontFamily.{}", kind.as_str()),
            Self::TypographyScale(scale) => write!(f, "typography.{}", scale.as_str()),
            Self::TypographyToken(scale, token) => {
                write!(f, "typography.{}.{token}", scale.as_str())
            }
            Self::Effects => f.write_str("effects"),
            Self::EffectScale(kind) => write!(f, "effects.{}", kind.as_str()),
            Self::Effect(kind, token) => write!(f, "effects.{}.{token}", kind.as_str()),
            Self::Metadata => f.write_str("metadata"),
            Self::MetadataText(field) => write!(f, "metadata.{}", field.as_str()),
        }
    }
}

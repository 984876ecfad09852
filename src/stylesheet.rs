//! Stylesheet system for plan colors
//!
//! Maps element kinds (plus a few plan-level tokens such as `lot` and
//! `outline`) to fill colors. A stylesheet is a TOML file with an optional
//! `[metadata]` table and a `[colors]` table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::layout::Kind;

/// Errors that can occur when loading or parsing stylesheets
#[derive(Error, Debug)]
pub enum StylesheetError {
    #[error("Failed to read stylesheet file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse stylesheet TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// A stylesheet mapping kind names and plan tokens to colors
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    /// Optional name for the stylesheet
    pub name: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Color mappings: token name -> hex color
    pub colors: BTreeMap<String, String>,
}

/// TOML structure for deserializing stylesheets
#[derive(Deserialize)]
struct TomlStylesheet {
    metadata: Option<TomlMetadata>,
    colors: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
    description: Option<String>,
}

/// Default palette - soft pastels per kind on a light lot
const DEFAULT_PALETTE: &str = r##"
[metadata]
name = "pastel"

[colors]
# Plan
lot = "#f8f9fa"
outline = "#111111"
text = "#111111"

# Exterior
park = "#b9e6a4"
pool = "#9bd3f0"
garage = "#c9c9c9"

# Public
entrance = "#f5c16c"
living = "#f9dcc4"
kitchen = "#f4bfbf"
hallway = "#d3f8e2"
stairs = "#e8d8b0"

# Private
bedroom = "#d0bdf4"
bathroom = "#b8c0ff"

other = "#e5e5e5"
"##;

/// Tokens that are never matched against kind names
const PLAN_TOKENS: [&str; 3] = ["lot", "outline", "text"];

impl Stylesheet {
    /// Load stylesheet from TOML file
    pub fn from_file(path: &Path) -> Result<Self, StylesheetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load stylesheet from TOML string
    pub fn from_str(content: &str) -> Result<Self, StylesheetError> {
        let parsed: TomlStylesheet = toml::from_str(content)?;

        Ok(Stylesheet {
            name: parsed.metadata.as_ref().and_then(|m| m.name.clone()),
            description: parsed.metadata.as_ref().and_then(|m| m.description.clone()),
            colors: parsed.colors,
        })
    }

    /// Resolve a token to a color
    ///
    /// Returns None if the token is not defined in this stylesheet.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.colors.get(token).map(|s| s.as_str())
    }

    /// Color for a kind name: exact entry first, then the first entry whose
    /// key occurs inside the name (`wine_cellar` has none, `pool_house`
    /// picks up `pool`)
    fn resolve_kind_name(&self, name: &str) -> Option<&str> {
        self.resolve(name).or_else(|| {
            self.colors
                .iter()
                .filter(|(key, _)| !PLAN_TOKENS.contains(&key.as_str()) && key.as_str() != "other")
                .find(|(key, _)| name.contains(key.as_str()))
                .map(|(_, color)| color.as_str())
        })
    }

    /// Fill color for an element kind, falling back to the default palette
    /// and finally to the `other` color
    pub fn color_for(&self, kind: &Kind) -> String {
        let name = kind.as_str();
        if let Some(color) = self.resolve_kind_name(name) {
            return color.to_string();
        }
        let default = Self::default();
        if let Some(color) = default.resolve_kind_name(name) {
            return color.to_string();
        }
        self.resolve_or_default("other")
    }

    /// Resolve a token with fallback to the default palette
    pub fn resolve_or_default(&self, token: &str) -> String {
        if let Some(color) = self.resolve(token) {
            return color.to_string();
        }

        let default = Self::default();
        if let Some(color) = default.resolve(token) {
            return color.to_string();
        }

        // Unknown token - neutral gray
        "#e5e5e5".to_string()
    }
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self::from_str(DEFAULT_PALETTE).expect("Default palette should be valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Stylesheet {
        Stylesheet {
            name: None,
            description: None,
            colors: BTreeMap::new(),
        }
    }

    #[test]
    fn test_default_stylesheet() {
        let stylesheet = Stylesheet::default();
        assert_eq!(stylesheet.name.as_deref(), Some("pastel"));
        for token in ["lot", "park", "pool", "entrance", "bedroom", "bathroom", "other"] {
            assert!(stylesheet.colors.contains_key(token), "missing {token}");
        }
    }

    #[test]
    fn test_color_for_known_kinds() {
        let stylesheet = Stylesheet::default();
        assert_eq!(stylesheet.color_for(&Kind::Pool), "#9bd3f0");
        assert_eq!(stylesheet.color_for(&Kind::Bathroom), "#b8c0ff");
    }

    #[test]
    fn test_color_for_other_kinds() {
        let stylesheet = Stylesheet::default();
        assert_eq!(stylesheet.color_for(&Kind::Other("wine_cellar".into())), "#e5e5e5");
        assert_eq!(stylesheet.color_for(&Kind::Other("pool_house".into())), "#9bd3f0");
    }

    #[test]
    fn test_custom_stylesheet_overrides_and_falls_back() {
        let stylesheet = Stylesheet::from_str(
            r##"
[colors]
pool = "#0000ff"
"##,
        )
        .unwrap();
        assert_eq!(stylesheet.color_for(&Kind::Pool), "#0000ff");
        assert_eq!(stylesheet.color_for(&Kind::Park), "#b9e6a4");
        assert_eq!(stylesheet.resolve_or_default("lot"), "#f8f9fa");
    }

    #[test]
    fn test_resolve_or_default_unknown_token() {
        assert_eq!(empty().resolve_or_default("nonexistent"), "#e5e5e5");
    }

    #[test]
    fn test_parse_toml_with_metadata() {
        let toml_str = r##"
[metadata]
name = "Night"
description = "Dark plan"

[colors]
lot = "#000000"
"##;
        let stylesheet = Stylesheet::from_str(toml_str).expect("Should parse");
        assert_eq!(stylesheet.name, Some("Night".to_string()));
        assert_eq!(stylesheet.description, Some("Dark plan".to_string()));
        assert_eq!(stylesheet.resolve("lot"), Some("#000000"));
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = Stylesheet::from_str("this is not valid toml {{{{");
        assert!(result.is_err());
    }
}

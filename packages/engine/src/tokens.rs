//! Design-token resolution.
//!
//! Node specs refer to paints and typography by token name. A
//! [`TokenResolver`] maps names to concrete values; the
//! [`UnresolvedTokenPolicy`] decides what happens when it cannot.

use crate::host::{FontName, Paint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_FONT_FAMILY: &str = "Inter";
pub const DEFAULT_FONT_STYLE: &str = "Regular";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
/// Neutral fill used when a paint token falls back
pub const FALLBACK_PAINT_HEX: &str = "#D9D9D9";

#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    pub font: FontName,
    pub font_size: f64,
    pub line_height: Option<f64>,
    pub letter_spacing: Option<f64>,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font: FontName::new(DEFAULT_FONT_FAMILY, DEFAULT_FONT_STYLE),
            font_size: DEFAULT_FONT_SIZE,
            line_height: None,
            letter_spacing: None,
        }
    }
}

/// Maps token names to concrete values
pub trait TokenResolver: Send + Sync {
    fn resolve_paint(&self, token: &str) -> Option<Paint>;

    fn resolve_typography(&self, token: &str) -> Option<Typography>;
}

/// What to do with a token the resolver does not know
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedTokenPolicy {
    /// Substitute a neutral default and record a warning
    #[default]
    Fallback,
    /// Leave the property unset and record a warning
    Skip,
    /// Fail the document
    Error,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyToken {
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_style: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub line_height: Option<f64>,
    #[serde(default)]
    pub letter_spacing: Option<f64>,
}

/// Token table loaded from JSON:
///
/// ```json
/// { "colors": { "brand/primary": "#1A73E8" },
///   "typography": { "heading/lg": { "fontFamily": "Inter", "fontStyle": "Bold", "fontSize": 32 } } }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenTable {
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    #[serde(default)]
    pub typography: BTreeMap<String, TypographyToken>,
}

impl TokenTable {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

impl TokenResolver for TokenTable {
    /// Literal hex colors resolve to themselves
    fn resolve_paint(&self, token: &str) -> Option<Paint> {
        let value = self.colors.get(token).map(String::as_str).unwrap_or(token);
        Paint::solid_hex(value)
    }

    fn resolve_typography(&self, token: &str) -> Option<Typography> {
        let entry = self.typography.get(token)?;
        let base = Typography::default();
        Some(Typography {
            font: FontName::new(
                entry.font_family.clone().unwrap_or(base.font.family),
                entry.font_style.clone().unwrap_or(base.font.style),
            ),
            font_size: entry.font_size.unwrap_or(base.font_size),
            line_height: entry.line_height,
            letter_spacing: entry.letter_spacing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Color;

    fn table() -> TokenTable {
        TokenTable::from_json(
            r##"{
                "colors": { "brand/primary": "#1A73E8", "broken": "blue" },
                "typography": { "heading/lg": { "fontStyle": "Bold", "fontSize": 32 } }
            }"##,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_paint() {
        let tokens = table();
        assert_eq!(
            tokens.resolve_paint("brand/primary"),
            Some(Paint::Solid {
                color: Color::from_hex("#1A73E8").unwrap()
            })
        );
        assert!(tokens.resolve_paint("#fff").is_some());
        assert!(tokens.resolve_paint("broken").is_none());
        assert!(tokens.resolve_paint("missing").is_none());
    }

    #[test]
    fn test_resolve_typography_fills_defaults() {
        let heading = table().resolve_typography("heading/lg").unwrap();
        assert_eq!(heading.font, FontName::new("Inter", "Bold"));
        assert_eq!(heading.font_size, 32.0);
        assert!(table().resolve_typography("body").is_none());
    }

    #[test]
    fn test_policy_wire_names() {
        let policy: UnresolvedTokenPolicy = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(policy, UnresolvedTokenPolicy::Skip);
        assert_eq!(UnresolvedTokenPolicy::default(), UnresolvedTokenPolicy::Fallback);
    }
}

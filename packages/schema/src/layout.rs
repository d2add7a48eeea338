//! Layout primitives shared by node specs and slot configuration.

use serde::{Deserialize, Serialize};

/// Auto-layout axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Vertical
    }
}

/// Placement of children along an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    Start,
    Center,
    End,
    SpaceBetween,
    Stretch,
}

/// Keyword sizing modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeKeyword {
    /// Shrink to content
    Hug,
    /// Stretch to the parent
    Fill,
}

/// A width or height: either a fixed number of pixels or a keyword
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Fixed(f64),
    Keyword(SizeKeyword),
}

impl Dimension {
    pub const HUG: Dimension = Dimension::Keyword(SizeKeyword::Hug);
    pub const FILL: Dimension = Dimension::Keyword(SizeKeyword::Fill);

    pub fn fixed(&self) -> Option<f64> {
        match self {
            Dimension::Fixed(value) => Some(*value),
            Dimension::Keyword(_) => None,
        }
    }

    pub fn is_fill(&self) -> bool {
        matches!(self, Dimension::Keyword(SizeKeyword::Fill))
    }
}

/// Explicit width/height pair. Missing axes hug their content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
}

impl SizeSpec {
    pub fn fixed(width: f64, height: f64) -> Self {
        Self {
            width: Some(Dimension::Fixed(width)),
            height: Some(Dimension::Fixed(height)),
        }
    }
}

/// Four-sided inset
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Edges {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
}

impl Edges {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// Padding as written in documents and catalogs: a single number or per-side values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Padding {
    Uniform(f64),
    Sides(Edges),
}

impl Padding {
    pub fn edges(&self) -> Edges {
        match self {
            Padding::Uniform(value) => Edges::uniform(*value),
            Padding::Sides(edges) => *edges,
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Padding::Uniform(0.0)
    }
}

/// Auto-layout parameters of a container node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Primary-axis alignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
    /// Cross-axis alignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_align: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<Padding>,
    /// Flex grow factor inside the parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grow: Option<f64>,
}

/// Edge pinning relative to the parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constraint {
    Min,
    Center,
    Max,
    Stretch,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<Constraint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_accepts_numbers_and_keywords() {
        let size: SizeSpec = serde_json::from_str(r#"{ "width": 320, "height": "hug" }"#).unwrap();
        assert_eq!(size.width, Some(Dimension::Fixed(320.0)));
        assert_eq!(size.height, Some(Dimension::HUG));

        let fill: Dimension = serde_json::from_str(r#""fill""#).unwrap();
        assert!(fill.is_fill());
        assert_eq!(fill.fixed(), None);
    }

    #[test]
    fn test_padding_forms() {
        let uniform: Padding = serde_json::from_str("24").unwrap();
        assert_eq!(uniform.edges(), Edges::uniform(24.0));

        let sides: Padding = serde_json::from_str(r#"{ "top": 8, "left": 16 }"#).unwrap();
        let edges = sides.edges();
        assert_eq!(edges.top, 8.0);
        assert_eq!(edges.left, 16.0);
        assert_eq!(edges.right, 0.0);
    }

    #[test]
    fn test_alignment_kebab_case() {
        let align: Alignment = serde_json::from_str(r#""space-between""#).unwrap();
        assert_eq!(align, Alignment::SpaceBetween);
    }
}

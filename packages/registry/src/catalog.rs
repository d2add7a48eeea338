//! # Layout Catalog
//!
//! Raw shape of the generated layout catalog. The catalog is produced by an
//! offline build step that flattens per-surface layout files and per-section
//! documents; this crate only reads it.
//!
//! ```json
//! {
//!   "surfaces": {
//!     "docs": {
//!       "label": "Documentation",
//!       "layout": { "width": 1440, "padding": 64, "spacing": 32, "background": "#FFFFFF" },
//!       "slots": [
//!         { "id": "body", "layout": { "direction": "vertical", "width": "fill" } },
//!         { "id": "terms", "parent": "body", "allowedSections": ["glossary"] }
//!       ],
//!       "routes": ["/docs"],
//!       "requiredSlots": ["body"]
//!     }
//!   },
//!   "sections": [
//!     { "id": "glossary", "surface": "docs", "slot": "terms", "order": 1, "document": "{...}" }
//!   ]
//! }
//! ```

use crate::error::ConfigError;
use plinth_schema::{Dimension, Direction, Padding};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub surfaces: BTreeMap<String, RawSurface>,
    #[serde(default)]
    pub sections: Vec<SectionEntry>,
}

impl Catalog {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSurface {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub layout: RawSurfaceLayout,
    #[serde(default)]
    pub slots: Vec<RawSlot>,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(default)]
    pub required_slots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawSurfaceLayout {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub padding: Option<Padding>,
    #[serde(default)]
    pub spacing: Option<f64>,
    #[serde(default)]
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSlot {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub layout: RawSlotLayout,
    #[serde(default)]
    pub allowed_sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawSlotLayout {
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub spacing: Option<f64>,
    #[serde(default)]
    pub padding: Option<Padding>,
    #[serde(default)]
    pub width: Option<Dimension>,
    #[serde(default)]
    pub height: Option<Dimension>,
    #[serde(default)]
    pub grow: Option<f64>,
}

/// A section document available for a surface route/slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionEntry {
    pub id: String,
    pub surface: String,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub order: i64,
    /// Raw JSON request document
    pub document: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let source = r#"{
            "surfaces": {
                "Docs": {
                    "label": "Documentation",
                    "layout": { "width": 1440, "padding": { "top": 64 }, "spacing": 32 },
                    "slots": [
                        { "id": "body", "layout": { "direction": "vertical", "width": "fill" } },
                        { "id": "terms", "parent": "body", "allowedSections": ["glossary"] }
                    ],
                    "requiredSlots": ["body"]
                }
            },
            "sections": [
                { "id": "glossary", "surface": "docs", "slot": "terms", "order": 2, "document": "{}" }
            ]
        }"#;

        let catalog = Catalog::from_json(source).unwrap();
        let docs = &catalog.surfaces["Docs"];
        assert_eq!(docs.slots.len(), 2);
        assert_eq!(docs.slots[0].layout.width, Some(Dimension::FILL));
        assert_eq!(docs.slots[1].parent.as_deref(), Some("body"));
        assert_eq!(docs.required_slots, vec!["body"]);
        assert_eq!(catalog.sections[0].order, 2);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::from_json("{}").unwrap();
        assert!(catalog.surfaces.is_empty());
        assert!(catalog.sections.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

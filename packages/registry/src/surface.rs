//! # Surfaces and Slots
//!
//! Normalized layout configuration. A surface is a top-level layout region;
//! its slots form a tree through `parent` references. Slot ids are stored
//! lower-cased so lookups are case-insensitive.

use crate::catalog::{RawSlot, RawSurface};
use crate::error::ConfigError;
use crate::hash::checksum;
use plinth_schema::{Dimension, Direction, Edges};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

pub const DEFAULT_SURFACE_ID: &str = "default";
pub const DEFAULT_SURFACE_WIDTH: f64 = 1440.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConfig {
    pub id: String,
    pub label: String,
    pub parent: Option<String>,
    pub direction: Direction,
    pub spacing: f64,
    pub padding: Edges,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub grow: f64,
    pub allowed_sections: Vec<String>,
    #[serde(skip)]
    pub hash: String,
}

impl SlotConfig {
    /// Whether a section may be placed here. An empty whitelist allows everything.
    pub fn allows_section(&self, section: &str) -> bool {
        let section = section.trim().to_ascii_lowercase();
        self.allowed_sections.is_empty() || self.allowed_sections.iter().any(|s| *s == section)
    }

    fn from_raw(raw: &RawSlot) -> Self {
        let id = normalize_id(&raw.id);
        let mut slot = SlotConfig {
            label: raw
                .label
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| raw.id.trim().to_string()),
            parent: raw
                .parent
                .as_deref()
                .map(normalize_id)
                .filter(|p| !p.is_empty()),
            direction: raw.layout.direction.unwrap_or_default(),
            spacing: raw.layout.spacing.unwrap_or(0.0),
            padding: raw.layout.padding.map(|p| p.edges()).unwrap_or_default(),
            width: raw.layout.width,
            height: raw.layout.height,
            grow: raw.layout.grow.unwrap_or(0.0),
            allowed_sections: dedupe(&raw.allowed_sections),
            id,
            hash: String::new(),
        };
        slot.hash = checksum(&slot);
        slot
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceConfig {
    pub id: String,
    pub label: String,
    pub width: f64,
    pub height: Option<f64>,
    pub padding: Edges,
    pub spacing: f64,
    pub background: Option<String>,
    pub slots: BTreeMap<String, SlotConfig>,
    pub routes: Vec<String>,
    pub required_slots: Vec<String>,
    #[serde(skip)]
    pub hash: String,
}

impl SurfaceConfig {
    /// Layout used when a document names no surface or an unknown one
    pub fn fallback() -> Self {
        let mut surface = SurfaceConfig {
            id: DEFAULT_SURFACE_ID.to_string(),
            label: "Default Surface".to_string(),
            width: DEFAULT_SURFACE_WIDTH,
            height: None,
            padding: Edges::uniform(64.0),
            spacing: 32.0,
            background: Some("#FFFFFF".to_string()),
            slots: BTreeMap::new(),
            routes: Vec::new(),
            required_slots: Vec::new(),
            hash: String::new(),
        };
        surface.hash = checksum(&surface);
        surface
    }

    /// Normalize one catalog entry. Rejects duplicate slot ids and parent cycles.
    pub fn from_raw(id: &str, raw: &RawSurface) -> Result<Self, ConfigError> {
        let id = normalize_id(id);
        let mut slots = BTreeMap::new();

        for raw_slot in &raw.slots {
            let slot = SlotConfig::from_raw(raw_slot);
            if slot.id.is_empty() {
                return Err(ConfigError::EmptySlotId(id));
            }
            if slots.contains_key(&slot.id) {
                return Err(ConfigError::DuplicateSlot {
                    surface: id,
                    slot: slot.id,
                });
            }
            slots.insert(slot.id.clone(), slot);
        }

        // Dangling parents become top-level slots
        let known: HashSet<String> = slots.keys().cloned().collect();
        for slot in slots.values_mut() {
            if let Some(parent) = &slot.parent {
                if !known.contains(parent) {
                    warn!(surface = %id, slot = %slot.id, parent = %parent, "Slot parent not found, treating slot as top-level");
                    slot.parent = None;
                    slot.hash = checksum(&*slot);
                }
            }
        }

        let mut surface = SurfaceConfig {
            label: raw
                .label
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| id.clone()),
            width: raw.layout.width.unwrap_or(DEFAULT_SURFACE_WIDTH),
            height: raw.layout.height,
            padding: raw.layout.padding.map(|p| p.edges()).unwrap_or_default(),
            spacing: raw.layout.spacing.unwrap_or(0.0),
            background: raw
                .layout
                .background
                .clone()
                .filter(|b| !b.trim().is_empty()),
            slots,
            routes: raw.routes.clone(),
            required_slots: dedupe(&raw.required_slots),
            id,
            hash: String::new(),
        };

        for slot_id in surface.slots.keys() {
            surface.slot_chain(slot_id)?;
        }

        surface.hash = checksum(&surface);
        Ok(surface)
    }

    pub fn slot(&self, slot_id: &str) -> Option<&SlotConfig> {
        self.slots.get(&normalize_id(slot_id))
    }

    /// Slots from the top-level ancestor down to `slot_id` itself.
    ///
    /// Ancestors always precede descendants, so materializing the chain in
    /// order sets each parent's layout before its children are attached.
    pub fn slot_chain(&self, slot_id: &str) -> Result<Vec<&SlotConfig>, ConfigError> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(normalize_id(slot_id));

        while let Some(id) = cursor {
            let slot = self.slots.get(&id).ok_or_else(|| ConfigError::UnknownSlot {
                surface: self.id.clone(),
                slot: id.clone(),
            })?;

            if !visited.insert(id.clone()) {
                return Err(ConfigError::SlotCycle {
                    surface: self.id.clone(),
                    slot: id,
                });
            }

            chain.push(slot);
            cursor = slot.parent.clone();
        }

        chain.reverse();
        Ok(chain)
    }
}

pub(crate) fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

fn dedupe(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| normalize_id(v))
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RawSlotLayout, RawSurfaceLayout};

    fn raw_slot(id: &str, parent: Option<&str>) -> RawSlot {
        RawSlot {
            id: id.to_string(),
            parent: parent.map(str::to_string),
            ..RawSlot::default()
        }
    }

    fn raw_surface(slots: Vec<RawSlot>) -> RawSurface {
        RawSurface {
            label: Some("Docs".to_string()),
            layout: RawSurfaceLayout {
                width: Some(1280.0),
                ..RawSurfaceLayout::default()
            },
            slots,
            ..RawSurface::default()
        }
    }

    #[test]
    fn test_ids_are_lower_cased_and_sections_deduplicated() {
        let mut slot = raw_slot("Body", None);
        slot.allowed_sections = vec![
            "Glossary".to_string(),
            "glossary".to_string(),
            "faq".to_string(),
        ];
        let surface = SurfaceConfig::from_raw("Docs", &raw_surface(vec![slot])).unwrap();

        assert_eq!(surface.id, "docs");
        let body = surface.slot("BODY").unwrap();
        assert_eq!(body.id, "body");
        assert_eq!(body.label, "Body");
        assert_eq!(body.allowed_sections, vec!["glossary", "faq"]);
        assert!(body.allows_section("FAQ"));
        assert!(!body.allows_section("pricing"));
    }

    #[test]
    fn test_slot_chain_orders_ancestors_first() {
        let surface = SurfaceConfig::from_raw(
            "docs",
            &raw_surface(vec![
                raw_slot("terms", Some("body")),
                raw_slot("body", Some("page")),
                raw_slot("page", None),
            ]),
        )
        .unwrap();

        let chain: Vec<&str> = surface
            .slot_chain("terms")
            .unwrap()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(chain, vec!["page", "body", "terms"]);
    }

    #[test]
    fn test_cycles_are_rejected_at_load() {
        let err = SurfaceConfig::from_raw(
            "docs",
            &raw_surface(vec![raw_slot("a", Some("b")), raw_slot("b", Some("a"))]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SlotCycle { .. }));

        let err = SurfaceConfig::from_raw("docs", &raw_surface(vec![raw_slot("a", Some("a"))]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::SlotCycle { .. }));
    }

    #[test]
    fn test_duplicate_slots_are_rejected() {
        let err = SurfaceConfig::from_raw(
            "docs",
            &raw_surface(vec![raw_slot("body", None), raw_slot("BODY", None)]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSlot { .. }));
    }

    #[test]
    fn test_dangling_parent_becomes_top_level() {
        let surface =
            SurfaceConfig::from_raw("docs", &raw_surface(vec![raw_slot("terms", Some("missing"))]))
                .unwrap();
        assert_eq!(surface.slot("terms").unwrap().parent, None);
        assert_eq!(surface.slot_chain("terms").unwrap().len(), 1);
    }

    #[test]
    fn test_hashes_track_configuration() {
        let a = SurfaceConfig::from_raw("docs", &raw_surface(vec![raw_slot("body", None)])).unwrap();
        let b = SurfaceConfig::from_raw("docs", &raw_surface(vec![raw_slot("body", None)])).unwrap();
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.slot("body").unwrap().hash, b.slot("body").unwrap().hash);

        let mut wide = raw_slot("body", None);
        wide.layout = RawSlotLayout {
            spacing: Some(24.0),
            ..RawSlotLayout::default()
        };
        let c = SurfaceConfig::from_raw("docs", &raw_surface(vec![wide])).unwrap();
        assert_ne!(a.hash, c.hash);
        assert_ne!(a.slot("body").unwrap().hash, c.slot("body").unwrap().hash);
    }

    #[test]
    fn test_fallback_surface() {
        let surface = SurfaceConfig::fallback();
        assert_eq!(surface.id, DEFAULT_SURFACE_ID);
        assert_eq!(surface.width, DEFAULT_SURFACE_WIDTH);
        assert!(surface.slots.is_empty());
        assert_eq!(surface.hash.len(), 8);
    }
}

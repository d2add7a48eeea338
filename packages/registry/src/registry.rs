//! # Surface Registry
//!
//! Owns the normalized surfaces and section listings built from one catalog.
//! The registry is an explicit value handed to the executor; `reset` and
//! `rebuild` replace its contents in place (tests rely on this for isolation).

use crate::catalog::{Catalog, SectionEntry};
use crate::error::ConfigError;
use crate::surface::{normalize_id, SurfaceConfig, DEFAULT_SURFACE_ID};
use plinth_schema::DocumentMeta;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SurfaceRegistry {
    surfaces: BTreeMap<String, SurfaceConfig>,
    sections: Vec<SectionEntry>,
    default_surface: SurfaceConfig,
}

impl SurfaceRegistry {
    /// Registry holding only the built-in default surface
    pub fn new() -> Self {
        Self {
            surfaces: BTreeMap::new(),
            sections: Vec::new(),
            default_surface: SurfaceConfig::fallback(),
        }
    }

    pub fn from_catalog(catalog: &Catalog) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        registry.rebuild(catalog)?;
        Ok(registry)
    }

    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Self::from_catalog(&Catalog::from_json(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_catalog(&Catalog::load(path)?)
    }

    /// Replace the registry contents with a freshly normalized catalog.
    /// On error the registry is left untouched.
    pub fn rebuild(&mut self, catalog: &Catalog) -> Result<(), ConfigError> {
        let mut surfaces = BTreeMap::new();
        for (id, raw) in &catalog.surfaces {
            let surface = SurfaceConfig::from_raw(id, raw)?;
            if surfaces.contains_key(&surface.id) {
                return Err(ConfigError::DuplicateSurface(surface.id));
            }
            debug!(surface = %surface.id, slots = surface.slots.len(), hash = %surface.hash, "Registered surface");
            surfaces.insert(surface.id.clone(), surface);
        }

        let default_surface = surfaces
            .get(DEFAULT_SURFACE_ID)
            .cloned()
            .unwrap_or_else(SurfaceConfig::fallback);

        let mut sections = catalog.sections.clone();
        sections.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));

        info!(
            surfaces = surfaces.len(),
            sections = sections.len(),
            "Surface registry built"
        );

        self.surfaces = surfaces;
        self.sections = sections;
        self.default_surface = default_surface;
        Ok(())
    }

    /// Drop everything loaded from a catalog
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn get(&self, surface_id: &str) -> Option<&SurfaceConfig> {
        self.surfaces.get(&normalize_id(surface_id))
    }

    /// Surface for an id, falling back to the default surface when absent or unknown
    pub fn resolve(&self, surface_id: Option<&str>) -> &SurfaceConfig {
        match surface_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => self.get(id).unwrap_or_else(|| {
                debug!(surface = %id, "Unknown surface, using default");
                &self.default_surface
            }),
            None => &self.default_surface,
        }
    }

    /// Surface named by a document's `meta.designSurface`
    pub fn resolve_surface_config(&self, meta: &DocumentMeta) -> &SurfaceConfig {
        self.resolve(meta.design_surface.as_deref())
    }

    pub fn default_surface(&self) -> &SurfaceConfig {
        &self.default_surface
    }

    pub fn list_required_slots(&self, surface_id: &str) -> Vec<String> {
        self.resolve(Some(surface_id)).required_slots.clone()
    }

    /// Catalog sections, optionally filtered by surface and slot, ordered by `order` then id
    pub fn sections(&self, surface_id: Option<&str>, slot_id: Option<&str>) -> Vec<&SectionEntry> {
        let surface_id = surface_id.map(normalize_id);
        let slot_id = slot_id.map(normalize_id);

        self.sections
            .iter()
            .filter(|s| {
                surface_id
                    .as_ref()
                    .map_or(true, |id| normalize_id(&s.surface) == *id)
            })
            .filter(|s| {
                slot_id.as_ref().map_or(true, |id| {
                    s.slot.as_deref().map(normalize_id).as_ref() == Some(id)
                })
            })
            .collect()
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

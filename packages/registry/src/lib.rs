//! # Plinth Registry
//!
//! Turns the generated layout catalog into typed surface and slot
//! configuration, and resolves the configuration a request document lands in.

pub mod catalog;
pub mod error;
pub mod hash;
pub mod registry;
pub mod surface;

pub use catalog::{Catalog, RawSlot, RawSlotLayout, RawSurface, RawSurfaceLayout, SectionEntry};
pub use error::ConfigError;
pub use hash::{canonical_json, checksum};
pub use registry::SurfaceRegistry;
pub use surface::{SlotConfig, SurfaceConfig, DEFAULT_SURFACE_ID, DEFAULT_SURFACE_WIDTH};

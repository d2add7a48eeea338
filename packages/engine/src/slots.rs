//! # Slot Containers
//!
//! Slots are materialized as nested auto-layout frames inside the surface
//! frame. Resolving a slot walks its ancestor chain from the top down and
//! creates whatever is missing, so a parent's layout is in place before its
//! children are attached.

use crate::errors::HostError;
use crate::factory::sizing_of;
use crate::host::{AutoLayout, Canvas, HostNodeKind, NodeId, NodeSizing, Sizing};
use crate::identity::{slot_container_id, ContainerIdentity};
use plinth_registry::{ConfigError, SlotConfig, SurfaceConfig};
use tracing::{debug, warn};

/// Slot id recorded for content placed directly in the surface frame
pub const ROOT_SLOT_ID: &str = "root";

/// Where a document's content goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTarget {
    pub container: NodeId,
    pub slot_id: String,
    pub slot_hash: String,
}

impl SlotTarget {
    pub fn root(container: NodeId, surface: &SurfaceConfig) -> Self {
        Self {
            container,
            slot_id: ROOT_SLOT_ID.to_string(),
            slot_hash: surface.hash.clone(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.slot_id == ROOT_SLOT_ID
    }
}

pub fn slot_container_name(slot: &SlotConfig) -> String {
    format!("Slot/{}", slot.label)
}

/// Container for `slot_id`, creating it and its ancestors on demand.
///
/// Without a slot, or with one the surface does not define, content goes to
/// the surface root.
pub async fn resolve_slot_container(
    canvas: &mut dyn Canvas,
    root: NodeId,
    slot_id: Option<&str>,
    surface: &SurfaceConfig,
) -> Result<SlotTarget, HostError> {
    let Some(slot_id) = slot_id.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(SlotTarget::root(root, surface));
    };

    let chain = match surface.slot_chain(slot_id) {
        Ok(chain) => chain,
        Err(ConfigError::UnknownSlot { .. }) => {
            debug!(slot = slot_id, surface = %surface.id, "Unknown slot, using surface root");
            return Ok(SlotTarget::root(root, surface));
        }
        Err(err) => {
            warn!(error = %err, "Slot chain rejected, using surface root");
            return Ok(SlotTarget::root(root, surface));
        }
    };

    let mut parent = root;
    let mut target = SlotTarget::root(root, surface);
    for slot in chain {
        parent = ensure_slot_container(canvas, parent, slot, surface).await?;
        target = SlotTarget {
            container: parent,
            slot_id: slot.id.clone(),
            slot_hash: slot.hash.clone(),
        };
    }
    Ok(target)
}

/// Find the container for `slot` among the children of `parent`, or create it.
/// Layout and identity are re-applied either way.
async fn ensure_slot_container(
    canvas: &mut dyn Canvas,
    parent: NodeId,
    slot: &SlotConfig,
    surface: &SurfaceConfig,
) -> Result<NodeId, HostError> {
    let existing = canvas
        .children(parent)
        .into_iter()
        .find(|child| slot_container_id(canvas, *child).as_deref() == Some(slot.id.as_str()));

    let container = match existing {
        Some(container) => container,
        None => {
            let container = canvas.create_node(HostNodeKind::Frame).await?;
            canvas.append_child(parent, container)?;
            debug!(slot = %slot.id, node = %container, "Created slot container");
            container
        }
    };

    canvas.set_name(container, &slot_container_name(slot))?;
    canvas.set_fills(container, &[])?;
    canvas.set_auto_layout(
        container,
        &AutoLayout {
            direction: slot.direction,
            spacing: slot.spacing,
            padding: slot.padding,
            primary_align: None,
            counter_align: None,
        },
    )?;

    let fixed_width = slot.width.and_then(|d| d.fixed());
    let fixed_height = slot.height.and_then(|d| d.fixed());
    if fixed_width.is_some() || fixed_height.is_some() {
        let current = canvas.bounds(container).unwrap_or_default();
        canvas.resize(
            container,
            fixed_width.unwrap_or(current.width),
            fixed_height.unwrap_or(current.height),
        )?;
    }

    canvas.set_sizing(
        container,
        &NodeSizing {
            horizontal: sizing_of(slot.width, Sizing::Fill),
            vertical: sizing_of(slot.height, Sizing::Hug),
            grow: slot.grow,
        },
    )?;

    ContainerIdentity::surface(&surface.id, &surface.hash)
        .with_slot(&slot.id, &slot.hash)
        .write(canvas, container)?;
    Ok(container)
}

/// Existing container for `slot_id` anywhere below `root`, without creating anything
pub fn find_slot_container(canvas: &dyn Canvas, root: NodeId, slot_id: &str) -> Option<NodeId> {
    let mut stack = canvas.children(root);
    while let Some(id) = stack.pop() {
        match slot_container_id(canvas, id) {
            Some(found) if found == slot_id => return Some(id),
            Some(_) => stack.extend(canvas.children(id)),
            None => {}
        }
    }
    None
}

//! Persisting identity metadata on canvas nodes.
//!
//! Content nodes carry a full [`NodeIdentity`]. Surface frames and slot
//! containers carry a [`ContainerIdentity`], which never has a `nodeKey`;
//! that absence is what separates structure from content during reconcile.

use crate::errors::HostError;
use crate::host::{Canvas, NodeId};
use plinth_schema::identity::{
    NODE_KEY_KEY, SLOT_HASH_KEY, SLOT_ID_KEY, SURFACE_HASH_KEY, SURFACE_ID_KEY,
};
use plinth_schema::NodeIdentity;

/// Stamp every identity key onto `id`
pub fn write_identity(
    canvas: &mut dyn Canvas,
    id: NodeId,
    identity: &NodeIdentity,
) -> Result<(), HostError> {
    for (key, value) in identity.entries() {
        canvas.set_plugin_data(id, key, value)?;
    }
    Ok(())
}

/// Identity of a node, if all five keys are present
pub fn read_identity(canvas: &dyn Canvas, id: NodeId) -> Option<NodeIdentity> {
    let read = |key: &str| canvas.plugin_data(id, key).filter(|v| !v.is_empty());
    Some(NodeIdentity {
        surface_id: read(SURFACE_ID_KEY)?,
        surface_hash: read(SURFACE_HASH_KEY)?,
        slot_id: read(SLOT_ID_KEY)?,
        slot_hash: read(SLOT_HASH_KEY)?,
        node_key: read(NODE_KEY_KEY)?,
    })
}

pub fn read_node_key(canvas: &dyn Canvas, id: NodeId) -> Option<String> {
    canvas.plugin_data(id, NODE_KEY_KEY).filter(|v| !v.is_empty())
}

/// Metadata of a surface frame or slot container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerIdentity {
    pub surface_id: String,
    pub surface_hash: String,
    /// `(slot id, slot hash)`; `None` for the surface frame itself
    pub slot: Option<(String, String)>,
}

impl ContainerIdentity {
    pub fn surface(surface_id: impl Into<String>, surface_hash: impl Into<String>) -> Self {
        Self {
            surface_id: surface_id.into(),
            surface_hash: surface_hash.into(),
            slot: None,
        }
    }

    pub fn with_slot(mut self, slot_id: impl Into<String>, slot_hash: impl Into<String>) -> Self {
        self.slot = Some((slot_id.into(), slot_hash.into()));
        self
    }

    pub fn write(&self, canvas: &mut dyn Canvas, id: NodeId) -> Result<(), HostError> {
        canvas.set_plugin_data(id, SURFACE_ID_KEY, &self.surface_id)?;
        canvas.set_plugin_data(id, SURFACE_HASH_KEY, &self.surface_hash)?;
        if let Some((slot_id, slot_hash)) = &self.slot {
            canvas.set_plugin_data(id, SLOT_ID_KEY, slot_id)?;
            canvas.set_plugin_data(id, SLOT_HASH_KEY, slot_hash)?;
        }
        Ok(())
    }
}

/// Slot id of a slot container; content nodes are never slot containers
pub fn slot_container_id(canvas: &dyn Canvas, id: NodeId) -> Option<String> {
    if read_node_key(canvas, id).is_some() {
        return None;
    }
    canvas.plugin_data(id, SLOT_ID_KEY).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostNodeKind;
    use crate::memory::MemoryCanvas;

    fn identity() -> NodeIdentity {
        NodeIdentity {
            surface_id: "docs".to_string(),
            surface_hash: "0badf00d".to_string(),
            slot_id: "body".to_string(),
            slot_hash: "cafebabe".to_string(),
            node_key: "docs::body::intro".to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_then_read_identity() {
        let mut canvas = MemoryCanvas::new();
        let node = canvas.create_node(HostNodeKind::Frame).await.unwrap();
        assert!(read_identity(&canvas, node).is_none());

        write_identity(&mut canvas, node, &identity()).unwrap();
        assert_eq!(read_identity(&canvas, node), Some(identity()));
        assert_eq!(canvas.plugin_data(node, "nodeKey").as_deref(), Some("docs::body::intro"));
        assert!(slot_container_id(&canvas, node).is_none());
    }

    #[tokio::test]
    async fn test_container_identity() {
        let mut canvas = MemoryCanvas::new();
        let slot = canvas.create_node(HostNodeKind::Frame).await.unwrap();
        ContainerIdentity::surface("docs", "0badf00d")
            .with_slot("body", "cafebabe")
            .write(&mut canvas, slot)
            .unwrap();

        assert_eq!(slot_container_id(&canvas, slot).as_deref(), Some("body"));
        assert!(read_identity(&canvas, slot).is_none());
    }
}

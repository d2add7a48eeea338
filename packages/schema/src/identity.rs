//! # Node Identity
//!
//! Identity metadata persisted on every node created from a request document.
//! The key names are a storage contract: nodes written by earlier runs are
//! found again through them, so they must never change.
//!
//! ```text
//! surfaceId   surface the node was built for
//! surfaceHash checksum of that surface's configuration
//! slotId      slot container that owns the node
//! slotHash    checksum of that slot's configuration
//! nodeKey     surfaceId::slotId::(idempotentKey | name)
//! ```
//!
//! Descendants prefix their local key with their parent's, separated by
//! `/`, so `Card/Title` and `Card/text#0` stay distinct across parents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SURFACE_ID_KEY: &str = "surfaceId";
pub const SURFACE_HASH_KEY: &str = "surfaceHash";
pub const SLOT_ID_KEY: &str = "slotId";
pub const SLOT_HASH_KEY: &str = "slotHash";
pub const NODE_KEY_KEY: &str = "nodeKey";

/// Separator between the components of a node key
pub const NODE_KEY_SEPARATOR: &str = "::";

/// Build the stable identity key for a node
pub fn node_key(surface_id: &str, slot_id: &str, local_key: &str) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        surface_id,
        slot_id,
        local_key,
        sep = NODE_KEY_SEPARATOR
    )
}

/// Identity stamped onto a created node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeIdentity {
    pub surface_id: String,
    pub surface_hash: String,
    pub slot_id: String,
    pub slot_hash: String,
    pub node_key: String,
}

impl NodeIdentity {
    /// Metadata entries in the order they are written
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            (SURFACE_ID_KEY, self.surface_id.as_str()),
            (SURFACE_HASH_KEY, self.surface_hash.as_str()),
            (SLOT_ID_KEY, self.slot_id.as_str()),
            (SLOT_HASH_KEY, self.slot_hash.as_str()),
            (NODE_KEY_KEY, self.node_key.as_str()),
        ]
    }

    /// Rebuild an identity from a metadata map. Returns `None` unless all keys are present.
    pub fn from_metadata(metadata: &BTreeMap<String, String>) -> Option<Self> {
        let get = |key: &str| metadata.get(key).filter(|v| !v.is_empty()).cloned();

        Some(Self {
            surface_id: get(SURFACE_ID_KEY)?,
            surface_hash: get(SURFACE_HASH_KEY)?,
            slot_id: get(SLOT_ID_KEY)?,
            slot_hash: get(SLOT_HASH_KEY)?,
            node_key: get(NODE_KEY_KEY)?,
        })
    }

    pub fn to_metadata(&self) -> BTreeMap<String, String> {
        self.entries()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

//! # Slot Reconciliation
//!
//! Keyed diff between the specs of one document and the content already in
//! its slot container. Every spec gets a `nodeKey` derived from the surface,
//! the slot and its local key:
//!
//! - `remove` deletes the node with that key, if any
//! - `add`/`update` delete any node with that key and schedule the spec
//!
//! Only scheduled specs reach the factory. Update is a destructive
//! re-create, never an in-place mutation.
//!
//! Slot containers nested in the slot are structure, not content: they are
//! never matched, cleared or counted.

use crate::errors::EngineError;
use crate::factory::{create_nodes, BuildContext, CreatedNode};
use crate::host::{Canvas, NodeId};
use crate::identity::{read_node_key, slot_container_id};
use crate::slots::SlotTarget;
use plinth_registry::SurfaceConfig;
use plinth_schema::{node_key, Mode, NodeIdentity, NodeSpec, Operation};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

/// Outcome of one slot sync
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub created: Vec<CreatedNode>,
    /// Keys of existing nodes that were deleted and re-created
    pub updated_keys: Vec<String>,
    /// Keys deleted by `operation: remove`
    pub removed_keys: Vec<String>,
    /// Content nodes dropped by `mode: replace`
    pub cleared: usize,
    /// Keys present after the sync but not before
    pub added_keys: Vec<String>,
    /// Keys present before the sync but not after
    pub stale_keys: Vec<String>,
}

impl SyncReport {
    /// Total nodes created, descendants included
    pub fn created_count(&self) -> usize {
        self.created.iter().map(CreatedNode::count).sum()
    }

    pub fn created_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for node in &self.created {
            node.walk(&mut |n| names.push(n.name.clone()));
        }
        names
    }
}

/// Local part of a spec's key. Anonymous specs are keyed by type and position.
pub fn local_key_for(spec: &NodeSpec, index: usize) -> String {
    spec.local_key()
        .map(|key| key.trim().to_string())
        .unwrap_or_else(|| format!("{}#{}", spec.type_name(), index))
}

/// Attach identity to `spec` and its subtree.
///
/// Descendant keys are scoped by their parent's local key (`Card/Title`,
/// `Card/text#0`). Later siblings that collide with an earlier key are
/// dropped; their node keys are returned.
pub fn stamp_identity(
    spec: &mut NodeSpec,
    index: usize,
    surface: &SurfaceConfig,
    target: &SlotTarget,
) -> Vec<String> {
    let mut dropped = Vec::new();
    let local = local_key_for(spec, index);
    stamp_scoped(spec, local, surface, target, &mut dropped);
    dropped
}

fn stamp_scoped(
    spec: &mut NodeSpec,
    local: String,
    surface: &SurfaceConfig,
    target: &SlotTarget,
    dropped: &mut Vec<String>,
) {
    if let Some(children) = spec.children_mut() {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(children.len());
        for (i, mut child) in std::mem::take(children).into_iter().enumerate() {
            let child_local = format!("{}/{}", local, local_key_for(&child, i));
            if !seen.insert(child_local.clone()) {
                dropped.push(node_key(&surface.id, &target.slot_id, &child_local));
                continue;
            }
            stamp_scoped(&mut child, child_local, surface, target, dropped);
            kept.push(child);
        }
        *children = kept;
    }

    spec.identity = Some(NodeIdentity {
        surface_id: surface.id.clone(),
        surface_hash: surface.hash.clone(),
        slot_id: target.slot_id.clone(),
        slot_hash: target.slot_hash.clone(),
        node_key: node_key(&surface.id, &target.slot_id, &local),
    });
}

/// Direct children of `container` that are content rather than nested slots
pub fn content_children(canvas: &dyn Canvas, container: NodeId) -> Vec<NodeId> {
    canvas
        .children(container)
        .into_iter()
        .filter(|id| slot_container_id(canvas, *id).is_none())
        .collect()
}

/// Every `nodeKey` stored in the content under `container`
pub fn collect_node_keys(canvas: &dyn Canvas, container: NodeId) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    let mut stack = content_children(canvas, container);
    while let Some(id) = stack.pop() {
        if let Some(key) = read_node_key(canvas, id) {
            keys.insert(key);
        }
        stack.extend(canvas.children(id));
    }
    keys
}

/// Bring the content of `target` in line with `specs`
pub async fn sync_slot_children(
    canvas: &mut dyn Canvas,
    target: &SlotTarget,
    specs: &[NodeSpec],
    surface: &SurfaceConfig,
    mode: Mode,
    ctx: &mut BuildContext<'_>,
) -> Result<SyncReport, EngineError> {
    let before = collect_node_keys(canvas, target.container);
    let mut report = SyncReport::default();

    let mut existing: HashMap<String, Vec<NodeId>> = HashMap::new();
    if mode == Mode::Replace {
        for child in content_children(canvas, target.container) {
            canvas.remove_node(child)?;
            report.cleared += 1;
        }
    } else {
        for child in content_children(canvas, target.container) {
            if let Some(key) = read_node_key(canvas, child) {
                existing.entry(key).or_default().push(child);
            }
        }
    }

    let mut scheduled = Vec::new();
    let mut seen = HashSet::new();
    for (index, spec) in specs.iter().enumerate() {
        let mut spec = spec.clone();
        for key in stamp_identity(&mut spec, index, surface, target) {
            ctx.warn(format!("Duplicate node key '{}', later spec skipped", key));
        }
        let key = spec
            .identity
            .as_ref()
            .map(|identity| identity.node_key.clone())
            .unwrap_or_default();

        if !seen.insert(key.clone()) {
            ctx.warn(format!("Duplicate node key '{}', later spec skipped", key));
            continue;
        }

        let matched = existing.remove(&key).unwrap_or_default();
        for id in &matched {
            canvas.remove_node(*id)?;
        }

        match spec.operation {
            Operation::Remove => {
                if matched.is_empty() {
                    debug!(key = %key, "Nothing to remove");
                } else {
                    report.removed_keys.push(key);
                }
            }
            Operation::Add | Operation::Update => {
                if !matched.is_empty() {
                    report.updated_keys.push(key);
                }
                scheduled.push(spec);
            }
        }
    }

    report.created = create_nodes(canvas, target.container, &scheduled, ctx).await?;

    let after = collect_node_keys(canvas, target.container);
    report.added_keys = after.difference(&before).cloned().collect();
    report.stale_keys = before.difference(&after).cloned().collect();

    info!(
        slot = %target.slot_id,
        mode = %mode,
        created = report.created_count(),
        updated = report.updated_keys.len(),
        removed = report.removed_keys.len(),
        cleared = report.cleared,
        added = report.added_keys.len(),
        stale = report.stale_keys.len(),
        "Slot synced"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostNodeKind;
    use crate::memory::MemoryCanvas;
    use crate::tokens::{TokenTable, UnresolvedTokenPolicy};
    use plinth_registry::SurfaceRegistry;

    struct Fixture {
        canvas: MemoryCanvas,
        target: SlotTarget,
        registry: SurfaceRegistry,
        tokens: TokenTable,
    }

    impl Fixture {
        async fn new() -> Self {
            let mut canvas = MemoryCanvas::new();
            let page = canvas.current_page();
            let root = canvas.create_node(HostNodeKind::Frame).await.unwrap();
            canvas.append_child(page, root).unwrap();
            let registry = SurfaceRegistry::new();
            let target = SlotTarget::root(root, registry.default_surface());
            Self {
                canvas,
                target,
                registry,
                tokens: TokenTable::default(),
            }
        }

        async fn sync(&mut self, specs: Vec<NodeSpec>, mode: Mode) -> SyncReport {
            let mut ctx = BuildContext::new(&self.tokens, UnresolvedTokenPolicy::Fallback);
            sync_slot_children(
                &mut self.canvas,
                &self.target,
                &specs,
                self.registry.default_surface(),
                mode,
                &mut ctx,
            )
            .await
            .unwrap()
        }

        fn names(&self) -> Vec<String> {
            self.canvas
                .children(self.target.container)
                .into_iter()
                .filter_map(|id| self.canvas.node_name(id))
                .collect()
        }
    }

    fn cards() -> Vec<NodeSpec> {
        vec![
            NodeSpec::frame("Card A", vec![NodeSpec::text("Title A", "A")]),
            NodeSpec::frame("Card B", vec![NodeSpec::text("Title B", "B")]),
        ]
    }

    #[test]
    fn test_local_key_fallbacks() {
        assert_eq!(local_key_for(&NodeSpec::text("Title", "x").with_key(" intro "), 0), "intro");
        assert_eq!(local_key_for(&NodeSpec::text("Title", "x"), 0), "Title");
        let mut anonymous = NodeSpec::text("", "x");
        anonymous.name = None;
        assert_eq!(local_key_for(&anonymous, 3), "text#3");
    }

    #[tokio::test]
    async fn test_stamped_keys_are_scoped() {
        let fixture = Fixture::new().await;
        let mut spec = NodeSpec::frame("Card", vec![NodeSpec::text("Title", "x")]);
        let dropped = stamp_identity(&mut spec, 0, fixture.registry.default_surface(), &fixture.target);

        assert!(dropped.is_empty());
        assert_eq!(spec.identity.as_ref().unwrap().node_key, "default::root::Card");
        assert_eq!(
            spec.children()[0].identity.as_ref().unwrap().node_key,
            "default::root::Card/Title"
        );
    }

    fn anonymous_text(content: &str) -> NodeSpec {
        let mut spec = NodeSpec::text("", content);
        spec.name = None;
        spec
    }

    fn entries() -> Vec<NodeSpec> {
        vec![
            NodeSpec::frame("Entry 1", vec![anonymous_text("one")]),
            NodeSpec::frame("Entry 2", vec![anonymous_text("two")]),
        ]
    }

    #[tokio::test]
    async fn test_anonymous_children_are_scoped_by_parent() {
        let mut fixture = Fixture::new().await;
        let first = fixture.sync(entries(), Mode::Append).await;
        assert_eq!(first.created_count(), 4);
        assert_eq!(
            first.added_keys,
            vec![
                "default::root::Entry 1".to_string(),
                "default::root::Entry 1/text#0".to_string(),
                "default::root::Entry 2".to_string(),
                "default::root::Entry 2/text#0".to_string(),
            ]
        );

        let second = fixture.sync(entries(), Mode::Append).await;
        assert!(second.added_keys.is_empty());
        assert!(second.stale_keys.is_empty());
    }

    #[tokio::test]
    async fn test_nested_duplicate_siblings_are_skipped() {
        let mut fixture = Fixture::new().await;
        let mut ctx = BuildContext::new(&fixture.tokens, UnresolvedTokenPolicy::Fallback);
        let specs = vec![NodeSpec::frame(
            "Card",
            vec![NodeSpec::text("Same", "1"), NodeSpec::text("Same", "2")],
        )];
        let report = sync_slot_children(
            &mut fixture.canvas,
            &fixture.target,
            &specs,
            fixture.registry.default_surface(),
            Mode::Append,
            &mut ctx,
        )
        .await
        .unwrap();

        assert_eq!(report.created_count(), 2);
        assert_eq!(ctx.warnings().len(), 1);
        assert!(ctx.warnings()[0].contains("default::root::Card/Same"));
    }

    #[tokio::test]
    async fn test_append_twice_is_idempotent() {
        let mut fixture = Fixture::new().await;
        let first = fixture.sync(cards(), Mode::Append).await;
        assert_eq!(first.created_count(), 4);
        assert_eq!(first.added_keys.len(), 4);

        let keys = collect_node_keys(&fixture.canvas, fixture.target.container);
        let second = fixture.sync(cards(), Mode::Append).await;
        assert_eq!(second.updated_keys.len(), 2);
        assert!(second.added_keys.is_empty());
        assert!(second.stale_keys.is_empty());
        assert_eq!(collect_node_keys(&fixture.canvas, fixture.target.container), keys);
        assert_eq!(fixture.names(), vec!["Card A", "Card B"]);
    }

    #[tokio::test]
    async fn test_replace_clears_previous_content() {
        let mut fixture = Fixture::new().await;
        fixture.sync(cards(), Mode::Append).await;

        let report = fixture
            .sync(vec![NodeSpec::text("Only", "x")], Mode::Replace)
            .await;
        assert_eq!(report.cleared, 2);
        assert_eq!(report.stale_keys.len(), 4);
        assert_eq!(fixture.names(), vec!["Only"]);
    }

    #[tokio::test]
    async fn test_remove_is_surgical() {
        let mut fixture = Fixture::new().await;
        fixture.sync(cards(), Mode::Append).await;

        let report = fixture
            .sync(
                vec![NodeSpec::frame("Card A", vec![]).with_operation(Operation::Remove)],
                Mode::Append,
            )
            .await;
        assert_eq!(report.removed_keys, vec!["default::root::Card A".to_string()]);
        assert_eq!(report.created_count(), 0);
        assert_eq!(fixture.names(), vec!["Card B"]);

        let noop = fixture
            .sync(
                vec![NodeSpec::frame("Card Z", vec![]).with_operation(Operation::Remove)],
                Mode::Append,
            )
            .await;
        assert!(noop.removed_keys.is_empty());
        assert_eq!(fixture.names(), vec!["Card B"]);
    }

    #[tokio::test]
    async fn test_nested_slots_are_left_alone() {
        let mut fixture = Fixture::new().await;
        let nested = fixture.canvas.create_node(HostNodeKind::Frame).await.unwrap();
        fixture
            .canvas
            .append_child(fixture.target.container, nested)
            .unwrap();
        crate::identity::ContainerIdentity::surface("default", "0")
            .with_slot("aside", "1")
            .write(&mut fixture.canvas, nested)
            .unwrap();

        let report = fixture.sync(cards(), Mode::Replace).await;
        assert_eq!(report.cleared, 0);
        assert!(fixture.canvas.node(nested).is_some());
    }

    #[tokio::test]
    async fn test_duplicate_keys_are_skipped() {
        let mut fixture = Fixture::new().await;
        let mut ctx = BuildContext::new(&fixture.tokens, UnresolvedTokenPolicy::Fallback);
        let specs = vec![NodeSpec::text("Same", "1"), NodeSpec::text("Same", "2")];
        let report = sync_slot_children(
            &mut fixture.canvas,
            &fixture.target,
            &specs,
            fixture.registry.default_surface(),
            Mode::Append,
            &mut ctx,
        )
        .await
        .unwrap();

        assert_eq!(report.created_count(), 1);
        assert_eq!(ctx.warnings().len(), 1);
    }
}

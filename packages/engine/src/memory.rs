//! # In-Memory Canvas
//!
//! A [`Canvas`] backed by plain data. It is used by tests and by the CLI,
//! which persists it as a JSON snapshot between runs so repeated runs
//! reconcile against the previous result.

use crate::errors::HostError;
use crate::host::{
    AutoLayout, Canvas, FontName, HostNodeKind, NodeId, NodeSizing, NoticeLevel, Paint, Rect,
    TextContent,
};
use async_trait::async_trait;
use plinth_schema::Constraints;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use tracing::debug;

/// Default size of a freshly created node
const DEFAULT_NODE_SIZE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryNode {
    pub id: NodeId,
    pub kind: HostNodeKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    pub bounds: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_layout: Option<AutoLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizing: Option<NodeSizing>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fills: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strokes: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub component_properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugin_data: BTreeMap<String, String>,
}

impl MemoryNode {
    fn new(id: NodeId, kind: HostNodeKind) -> Self {
        let name = match &kind {
            HostNodeKind::Page => "Page",
            HostNodeKind::Frame => "Frame",
            HostNodeKind::Text => "Text",
            HostNodeKind::Rectangle => "Rectangle",
            HostNodeKind::Instance { .. } => "Instance",
        }
        .to_string();

        Self {
            id,
            kind,
            name,
            parent: None,
            children: Vec::new(),
            bounds: Rect {
                width: DEFAULT_NODE_SIZE,
                height: DEFAULT_NODE_SIZE,
                ..Rect::default()
            },
            auto_layout: None,
            sizing: None,
            fills: Vec::new(),
            strokes: Vec::new(),
            text: None,
            constraints: None,
            component_properties: BTreeMap::new(),
            plugin_data: BTreeMap::new(),
        }
    }
}

/// A message passed to [`Canvas::notify`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCanvas {
    nodes: BTreeMap<u64, MemoryNode>,
    pages: Vec<NodeId>,
    current_page: NodeId,
    next_id: u64,
    #[serde(default)]
    selections: BTreeMap<u64, Vec<NodeId>>,
    /// Font families that fail to load
    #[serde(default)]
    unavailable_fonts: BTreeSet<String>,
    /// Component keys that fail to import
    #[serde(default)]
    unavailable_components: BTreeSet<String>,
    #[serde(skip)]
    loaded_fonts: HashSet<FontName>,
    #[serde(skip)]
    notices: Vec<Notice>,
}

impl Default for MemoryCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCanvas {
    /// A canvas with a single page named "Page 1"
    pub fn new() -> Self {
        Self::with_pages(&["Page 1"])
    }

    /// A canvas with the given pages; the first one is current
    pub fn with_pages(names: &[&str]) -> Self {
        let mut canvas = Self {
            nodes: BTreeMap::new(),
            pages: Vec::new(),
            current_page: NodeId(0),
            next_id: 1,
            selections: BTreeMap::new(),
            unavailable_fonts: BTreeSet::new(),
            unavailable_components: BTreeSet::new(),
            loaded_fonts: HashSet::new(),
            notices: Vec::new(),
        };

        for name in names {
            canvas.add_page(name);
        }
        if let Some(first) = canvas.pages.first() {
            canvas.current_page = *first;
        }
        canvas
    }

    pub fn add_page(&mut self, name: &str) -> NodeId {
        let id = self.allocate(HostNodeKind::Page);
        if let Some(node) = self.nodes.get_mut(&id.0) {
            node.name = name.to_string();
        }
        self.pages.push(id);
        if self.pages.len() == 1 {
            self.current_page = id;
        }
        id
    }

    pub fn pages(&self) -> &[NodeId] {
        &self.pages
    }

    pub fn set_current_page(&mut self, page: NodeId) -> Result<(), HostError> {
        if !self.pages.contains(&page) {
            return Err(HostError::NodeNotFound(page));
        }
        self.current_page = page;
        Ok(())
    }

    /// Make every load of `family` fail
    pub fn mark_font_unavailable(&mut self, family: &str) {
        self.unavailable_fonts.insert(family.to_string());
    }

    /// Make every import of `component_key` fail
    pub fn mark_component_unavailable(&mut self, component_key: &str) {
        self.unavailable_components.insert(component_key.to_string());
    }

    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(&id.0)
    }

    /// Number of nodes, pages included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First direct child of `parent` named `name`
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)?
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).map(|n| n.name == name).unwrap_or(false))
    }

    /// All descendants of `root` in depth-first order, `root` excluded
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        out
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn clear_notices(&mut self) {
        self.notices.clear();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Load a snapshot, or start a fresh canvas when the file does not exist
    pub fn load_or_default(path: &Path) -> std::io::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    fn allocate(&mut self, kind: HostNodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id.0, MemoryNode::new(id, kind));
        id
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, HostError> {
        self.nodes.get_mut(&id.0).ok_or(HostError::NodeNotFound(id))
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.nodes.get(&id.0).and_then(|n| n.parent);
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p.0)) {
            parent.children.retain(|child| *child != id);
        }
        if let Some(node) = self.nodes.get_mut(&id.0) {
            node.parent = None;
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes.get(&id.0).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }
}

#[async_trait]
impl Canvas for MemoryCanvas {
    fn current_page(&self) -> NodeId {
        self.current_page
    }

    fn find_page(&self, name: &str) -> Option<NodeId> {
        self.pages
            .iter()
            .copied()
            .find(|page| self.node(*page).map(|n| n.name == name).unwrap_or(false))
    }

    fn node_name(&self, id: NodeId) -> Option<String> {
        self.node(id).map(|n| n.name.clone())
    }

    fn node_kind(&self, id: NodeId) -> Option<HostNodeKind> {
        self.node(id).map(|n| n.kind.clone())
    }

    fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.node(parent)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.node(id).map(|n| n.bounds)
    }

    fn plugin_data(&self, id: NodeId, key: &str) -> Option<String> {
        self.node(id).and_then(|n| n.plugin_data.get(key).cloned())
    }

    fn selection(&self, page: NodeId) -> Vec<NodeId> {
        self.selections.get(&page.0).cloned().unwrap_or_default()
    }

    async fn create_node(&mut self, kind: HostNodeKind) -> Result<NodeId, HostError> {
        match &kind {
            HostNodeKind::Page => {
                return Err(HostError::Unsupported("pages cannot be created".to_string()))
            }
            HostNodeKind::Instance { component_key }
                if self.unavailable_components.contains(component_key) =>
            {
                return Err(HostError::ComponentUnavailable(component_key.clone()))
            }
            _ => {}
        }

        let id = self.allocate(kind);
        debug!(node = %id, "Created node");
        Ok(id)
    }

    async fn load_font(&mut self, font: &FontName) -> Result<(), HostError> {
        if self.unavailable_fonts.contains(&font.family) {
            return Err(HostError::FontUnavailable(font.to_string()));
        }
        self.loaded_fonts.insert(font.clone());
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let parent_kind = self
            .node(parent)
            .map(|n| n.kind.clone())
            .ok_or(HostError::NodeNotFound(parent))?;
        if self.node(child).is_none() {
            return Err(HostError::NodeNotFound(child));
        }
        if !parent_kind.can_have_children() {
            return Err(HostError::NotAContainer(parent));
        }
        if self.is_ancestor(child, parent) {
            return Err(HostError::Cycle { parent, child });
        }

        self.detach(child);
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn remove_node(&mut self, id: NodeId) -> Result<(), HostError> {
        if self.node(id).is_none() {
            return Err(HostError::NodeNotFound(id));
        }
        if self.pages.contains(&id) {
            return Err(HostError::Unsupported("pages cannot be removed".to_string()));
        }

        let mut doomed = self.descendants(id);
        doomed.push(id);
        self.detach(id);

        for node in &doomed {
            self.nodes.remove(&node.0);
        }
        for selection in self.selections.values_mut() {
            selection.retain(|selected| !doomed.contains(selected));
        }
        Ok(())
    }

    fn set_name(&mut self, id: NodeId, name: &str) -> Result<(), HostError> {
        self.node_mut(id)?.name = name.to_string();
        Ok(())
    }

    fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        node.bounds.x = x;
        node.bounds.y = y;
        Ok(())
    }

    fn resize(&mut self, id: NodeId, width: f64, height: f64) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        node.bounds.width = width;
        node.bounds.height = height;
        Ok(())
    }

    fn set_auto_layout(&mut self, id: NodeId, layout: &AutoLayout) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        if !node.kind.can_have_children() {
            return Err(HostError::NotAContainer(id));
        }
        node.auto_layout = Some(*layout);
        Ok(())
    }

    fn set_sizing(&mut self, id: NodeId, sizing: &NodeSizing) -> Result<(), HostError> {
        self.node_mut(id)?.sizing = Some(*sizing);
        Ok(())
    }

    fn set_fills(&mut self, id: NodeId, fills: &[Paint]) -> Result<(), HostError> {
        self.node_mut(id)?.fills = fills.to_vec();
        Ok(())
    }

    fn set_strokes(&mut self, id: NodeId, strokes: &[Paint]) -> Result<(), HostError> {
        self.node_mut(id)?.strokes = strokes.to_vec();
        Ok(())
    }

    fn set_text(&mut self, id: NodeId, text: &TextContent) -> Result<(), HostError> {
        if !self.loaded_fonts.contains(&text.font) {
            return Err(HostError::FontNotLoaded(text.font.to_string()));
        }
        let node = self.node_mut(id)?;
        if node.kind != HostNodeKind::Text {
            return Err(HostError::Unsupported(format!("{} is not a text node", id)));
        }
        node.text = Some(text.clone());
        Ok(())
    }

    fn set_constraints(&mut self, id: NodeId, constraints: &Constraints) -> Result<(), HostError> {
        self.node_mut(id)?.constraints = Some(*constraints);
        Ok(())
    }

    fn set_component_properties(
        &mut self,
        id: NodeId,
        properties: &BTreeMap<String, String>,
    ) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        node.component_properties
            .extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn set_plugin_data(&mut self, id: NodeId, key: &str, value: &str) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        if value.is_empty() {
            node.plugin_data.remove(key);
        } else {
            node.plugin_data.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn set_selection(&mut self, page: NodeId, nodes: &[NodeId]) -> Result<(), HostError> {
        if !self.pages.contains(&page) {
            return Err(HostError::NodeNotFound(page));
        }
        if let Some(missing) = nodes.iter().find(|id| self.node(**id).is_none()) {
            return Err(HostError::NodeNotFound(*missing));
        }
        self.selections.insert(page.0, nodes.to_vec());
        Ok(())
    }

    fn notify(&mut self, message: &str, level: NoticeLevel) {
        self.notices.push(Notice {
            level,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tree_operations() {
        let mut canvas = MemoryCanvas::new();
        let page = canvas.current_page();

        let frame = canvas.create_node(HostNodeKind::Frame).await.unwrap();
        let text = canvas.create_node(HostNodeKind::Text).await.unwrap();
        canvas.append_child(page, frame).unwrap();
        canvas.append_child(frame, text).unwrap();

        assert_eq!(canvas.children(page), vec![frame]);
        assert_eq!(canvas.parent(text), Some(frame));
        assert_eq!(canvas.descendants(page), vec![frame, text]);

        assert_eq!(
            canvas.append_child(text, frame),
            Err(HostError::NotAContainer(text))
        );
        assert_eq!(
            canvas.append_child(frame, frame),
            Err(HostError::Cycle { parent: frame, child: frame })
        );

        canvas.remove_node(frame).unwrap();
        assert!(canvas.children(page).is_empty());
        assert!(canvas.node(text).is_none());
    }

    #[tokio::test]
    async fn test_reparenting_detaches() {
        let mut canvas = MemoryCanvas::new();
        let page = canvas.current_page();
        let a = canvas.create_node(HostNodeKind::Frame).await.unwrap();
        let b = canvas.create_node(HostNodeKind::Frame).await.unwrap();
        let child = canvas.create_node(HostNodeKind::Rectangle).await.unwrap();
        canvas.append_child(page, a).unwrap();
        canvas.append_child(page, b).unwrap();
        canvas.append_child(a, child).unwrap();
        canvas.append_child(b, child).unwrap();

        assert!(canvas.children(a).is_empty());
        assert_eq!(canvas.children(b), vec![child]);
    }

    #[tokio::test]
    async fn test_text_requires_loaded_font() {
        let mut canvas = MemoryCanvas::new();
        let text = canvas.create_node(HostNodeKind::Text).await.unwrap();
        let content = TextContent {
            characters: "Hello".to_string(),
            font: FontName::new("Inter", "Regular"),
            font_size: 16.0,
            line_height: None,
            letter_spacing: None,
        };

        assert!(matches!(
            canvas.set_text(text, &content),
            Err(HostError::FontNotLoaded(_))
        ));
        canvas.load_font(&content.font).await.unwrap();
        canvas.set_text(text, &content).unwrap();

        canvas.mark_font_unavailable("Comic Sans");
        assert!(canvas
            .load_font(&FontName::new("Comic Sans", "Bold"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unavailable_component() {
        let mut canvas = MemoryCanvas::new();
        canvas.mark_component_unavailable("btn-primary");
        let result = canvas
            .create_node(HostNodeKind::Instance {
                component_key: "btn-primary".to_string(),
            })
            .await;
        assert_eq!(
            result,
            Err(HostError::ComponentUnavailable("btn-primary".to_string()))
        );
        assert!(canvas.create_node(HostNodeKind::Page).await.is_err());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.json");

        let mut canvas = MemoryCanvas::with_pages(&["Cover", "Docs"]);
        let docs = canvas.find_page("Docs").unwrap();
        let frame = canvas.create_node(HostNodeKind::Frame).await.unwrap();
        canvas.append_child(docs, frame).unwrap();
        canvas.set_plugin_data(frame, "nodeKey", "a::b::c").unwrap();
        canvas.set_selection(docs, &[frame]).unwrap();
        canvas.save(&path).unwrap();

        let restored = MemoryCanvas::load_or_default(&path).unwrap();
        assert_eq!(restored.find_page("Docs"), Some(docs));
        assert_eq!(restored.plugin_data(frame, "nodeKey").as_deref(), Some("a::b::c"));
        assert_eq!(restored.selection(docs), vec![frame]);

        let fresh = MemoryCanvas::load_or_default(&dir.path().join("missing.json")).unwrap();
        assert_eq!(fresh.pages().len(), 1);
    }
}

//! # Host Capability Interface
//!
//! The canvas belongs to the host application. The engine only sees it
//! through [`Canvas`]: nodes are opaque [`NodeId`] handles, queries are
//! synchronous, and the two operations hosts typically implement remotely
//! (node creation and font loading) are async.
//!
//! Callers await every operation before issuing the next one; the engine
//! never runs two canvas mutations concurrently.

use crate::errors::HostError;
use async_trait::async_trait;
use plinth_schema::{Alignment, Constraints, Direction, Edges, ImageFit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque handle to a host node (pages included)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Node primitives the host can create
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostNodeKind {
    Page,
    Frame,
    Text,
    Rectangle,
    Instance {
        #[serde(rename = "componentKey")]
        component_key: String,
    },
}

impl HostNodeKind {
    pub fn can_have_children(&self) -> bool {
        matches!(self, HostNodeKind::Page | HostNodeKind::Frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// RGBA color with channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits.to_string(),
            _ => return None,
        };

        let channel = |i: usize| -> Option<f32> {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };

        Some(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if expanded.len() == 8 { channel(6)? } else { 1.0 },
        })
    }

    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if self.a >= 1.0 {
            format!("#{:02X}{:02X}{:02X}", byte(self.r), byte(self.g), byte(self.b))
        } else {
            format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                byte(self.r),
                byte(self.g),
                byte(self.b),
                byte(self.a)
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Paint {
    Solid { color: Color },
    Image { src: String, fit: ImageFit },
}

impl Paint {
    pub fn solid_hex(hex: &str) -> Option<Self> {
        Color::from_hex(hex).map(|color| Paint::Solid { color })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl fmt::Display for FontName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub characters: String,
    pub font: FontName,
    pub font_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
}

/// Auto-layout settings of a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoLayout {
    pub direction: Direction,
    pub spacing: f64,
    pub padding: Edges,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_align: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_align: Option<Alignment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sizing {
    Fixed,
    Hug,
    Fill,
}

/// How a node sizes itself inside an auto-layout parent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSizing {
    pub horizontal: Sizing,
    pub vertical: Sizing,
    pub grow: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Capability surface of the host design tool
#[async_trait]
pub trait Canvas: Send {
    /// Page the user is currently looking at
    fn current_page(&self) -> NodeId;

    fn find_page(&self, name: &str) -> Option<NodeId>;

    fn node_name(&self, id: NodeId) -> Option<String>;

    fn node_kind(&self, id: NodeId) -> Option<HostNodeKind>;

    /// Direct children in paint order
    fn children(&self, parent: NodeId) -> Vec<NodeId>;

    fn parent(&self, id: NodeId) -> Option<NodeId>;

    fn bounds(&self, id: NodeId) -> Option<Rect>;

    fn plugin_data(&self, id: NodeId, key: &str) -> Option<String>;

    fn selection(&self, page: NodeId) -> Vec<NodeId>;

    /// Create a detached node. Pages cannot be created.
    async fn create_node(&mut self, kind: HostNodeKind) -> Result<NodeId, HostError>;

    /// Fonts must be loaded before text using them is set
    async fn load_font(&mut self, font: &FontName) -> Result<(), HostError>;

    /// Append `child` as the last child of `parent`, detaching it from any previous parent
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    /// Remove a node and its subtree
    fn remove_node(&mut self, id: NodeId) -> Result<(), HostError>;

    fn set_name(&mut self, id: NodeId, name: &str) -> Result<(), HostError>;

    fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<(), HostError>;

    fn resize(&mut self, id: NodeId, width: f64, height: f64) -> Result<(), HostError>;

    fn set_auto_layout(&mut self, id: NodeId, layout: &AutoLayout) -> Result<(), HostError>;

    fn set_sizing(&mut self, id: NodeId, sizing: &NodeSizing) -> Result<(), HostError>;

    fn set_fills(&mut self, id: NodeId, fills: &[Paint]) -> Result<(), HostError>;

    fn set_strokes(&mut self, id: NodeId, strokes: &[Paint]) -> Result<(), HostError>;

    fn set_text(&mut self, id: NodeId, text: &TextContent) -> Result<(), HostError>;

    fn set_constraints(&mut self, id: NodeId, constraints: &Constraints) -> Result<(), HostError>;

    fn set_component_properties(
        &mut self,
        id: NodeId,
        properties: &BTreeMap<String, String>,
    ) -> Result<(), HostError>;

    fn set_plugin_data(&mut self, id: NodeId, key: &str, value: &str) -> Result<(), HostError>;

    fn set_selection(&mut self, page: NodeId, nodes: &[NodeId]) -> Result<(), HostError>;

    /// Show a transient message to the user
    fn notify(&mut self, message: &str, level: NoticeLevel);
}

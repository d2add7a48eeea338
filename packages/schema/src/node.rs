//! # Node Specs
//!
//! Tagged union describing one node a request document wants on the canvas.
//!
//! On the wire every node is a flat JSON object discriminated by `type`:
//!
//! ```json
//! { "type": "frame", "name": "Card", "layout": { "direction": "vertical" },
//!   "children": [ { "type": "text", "content": "Hello" } ] }
//! ```
//!
//! Unknown `type` values still parse (as [`NodeKind::Unsupported`]) so one
//! unsupported node never rejects the whole document. Only `frame` and
//! `stack` may carry children.

use crate::identity::NodeIdentity;
use crate::layout::{Constraints, LayoutSpec, SizeSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// What a spec asks the reconciler to do with its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Add,
    Update,
    Remove,
}

/// Style-token references
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Typography token (text nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl NodeTokens {
    pub fn is_empty(&self) -> bool {
        self.fill.is_none() && self.stroke.is_none() && self.text.is_none()
    }
}

/// Shared payload of `frame` and `stack`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutSpec>,
    #[serde(skip)]
    pub children: Vec<NodeSpec>,
}

/// Direct text style. Anything left unset falls back to the typography token.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    /// Hex color, e.g. `#1A1A1A`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextSpec {
    #[serde(default, alias = "text", alias = "characters")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeSpec>,
}

/// Instance of a library component
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    #[serde(default, alias = "key")]
    pub component_key: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    #[default]
    Fill,
    Fit,
    Crop,
    Tile,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageSpec {
    #[serde(default, alias = "url", alias = "hash")]
    pub src: String,
    #[serde(default)]
    pub fit: ImageFit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeSpec>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpacerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeSpec>,
}

/// Type-specific payload of a node spec
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Frame(ContainerSpec),
    Stack(ContainerSpec),
    Text(TextSpec),
    Component(ComponentSpec),
    Image(ImageSpec),
    Spacer(SpacerSpec),
    /// A `type` this version does not know how to build. Children are kept so
    /// guardrails still measure them.
    Unsupported {
        type_name: String,
        children: Vec<NodeSpec>,
    },
}

impl NodeKind {
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::Frame(_) => "frame",
            NodeKind::Stack(_) => "stack",
            NodeKind::Text(_) => "text",
            NodeKind::Component(_) => "component",
            NodeKind::Image(_) => "image",
            NodeKind::Spacer(_) => "spacer",
            NodeKind::Unsupported { type_name, .. } => type_name,
        }
    }

    pub fn container(&self) -> Option<&ContainerSpec> {
        match self {
            NodeKind::Frame(container) | NodeKind::Stack(container) => Some(container),
            _ => None,
        }
    }

    pub fn container_mut(&mut self) -> Option<&mut ContainerSpec> {
        match self {
            NodeKind::Frame(container) | NodeKind::Stack(container) => Some(container),
            _ => None,
        }
    }
}

/// One declared node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNodeSpec", into = "RawNodeSpec")]
pub struct NodeSpec {
    pub name: Option<String>,
    pub tokens: NodeTokens,
    pub constraints: Option<Constraints>,
    /// Free-form metadata persisted on the created node
    pub plugin_data: BTreeMap<String, String>,
    pub idempotent_key: Option<String>,
    pub operation: Operation,
    pub kind: NodeKind,
    /// Set by the reconciler just before creation; never read from the wire
    pub identity: Option<NodeIdentity>,
}

impl NodeSpec {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            tokens: NodeTokens::default(),
            constraints: None,
            plugin_data: BTreeMap::new(),
            idempotent_key: None,
            operation: Operation::Add,
            kind,
            identity: None,
        }
    }

    pub fn frame(name: impl Into<String>, children: Vec<NodeSpec>) -> Self {
        NodeSpec::new(NodeKind::Frame(ContainerSpec {
            children,
            ..ContainerSpec::default()
        }))
        .with_name(name)
    }

    pub fn stack(name: impl Into<String>, children: Vec<NodeSpec>) -> Self {
        NodeSpec::new(NodeKind::Stack(ContainerSpec {
            children,
            ..ContainerSpec::default()
        }))
        .with_name(name)
    }

    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        NodeSpec::new(NodeKind::Text(TextSpec {
            content: content.into(),
            ..TextSpec::default()
        }))
        .with_name(name)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.idempotent_key = Some(key.into());
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    /// Name shown on the canvas: explicit name, else the type name
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.kind.type_name())
    }

    /// The local part of the node key (`idempotentKey ?? name`)
    pub fn local_key(&self) -> Option<&str> {
        self.idempotent_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.name.as_deref().filter(|n| !n.trim().is_empty()))
    }

    pub fn children(&self) -> &[NodeSpec] {
        match &self.kind {
            NodeKind::Unsupported { children, .. } => children,
            kind => kind.container().map(|c| c.children.as_slice()).unwrap_or(&[]),
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<NodeSpec>> {
        self.kind.container_mut().map(|c| &mut c.children)
    }

    /// Visit this spec and every descendant, parents first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a NodeSpec, usize)) {
        self.walk_at(1, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a NodeSpec, usize)) {
        visit(self, depth);
        for child in self.children() {
            child.walk_at(depth + 1, visit);
        }
    }
}

/// Flat wire shape of a node spec
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNodeSpec {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "NodeTokens::is_empty")]
    tokens: NodeTokens,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    constraints: Option<Constraints>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    plugin_data: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    idempotent_key: Option<String>,
    #[serde(default)]
    operation: Operation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeSpec>,
    #[serde(flatten)]
    props: Map<String, Value>,
}

fn props_into<T: serde::de::DeserializeOwned>(
    node_type: &str,
    props: Map<String, Value>,
) -> Result<T, String> {
    serde_json::from_value(Value::Object(props))
        .map_err(|e| format!("invalid '{}' node: {}", node_type, e))
}

fn props_from<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

impl TryFrom<RawNodeSpec> for NodeSpec {
    type Error = String;

    fn try_from(raw: RawNodeSpec) -> Result<Self, Self::Error> {
        let node_type = raw.node_type.trim().to_ascii_lowercase();
        let has_children = !raw.children.is_empty();

        let kind = match node_type.as_str() {
            "frame" | "stack" => {
                let mut container: ContainerSpec = props_into(&node_type, raw.props)?;
                container.children = raw.children;
                if node_type == "frame" {
                    NodeKind::Frame(container)
                } else {
                    NodeKind::Stack(container)
                }
            }
            "text" => NodeKind::Text(props_into(&node_type, raw.props)?),
            "component" => NodeKind::Component(props_into(&node_type, raw.props)?),
            "image" => NodeKind::Image(props_into(&node_type, raw.props)?),
            "spacer" => NodeKind::Spacer(props_into(&node_type, raw.props)?),
            _ => NodeKind::Unsupported {
                type_name: raw.node_type.clone(),
                children: raw.children,
            },
        };

        let unsupported = matches!(kind, NodeKind::Unsupported { .. });
        if has_children && kind.container().is_none() && !unsupported {
            return Err(format!("'{}' nodes cannot have children", node_type));
        }

        Ok(NodeSpec {
            name: raw.name,
            tokens: raw.tokens,
            constraints: raw.constraints,
            plugin_data: raw.plugin_data,
            idempotent_key: raw.idempotent_key,
            operation: raw.operation,
            kind,
            identity: None,
        })
    }
}

impl From<NodeSpec> for RawNodeSpec {
    fn from(spec: NodeSpec) -> Self {
        let node_type = spec.kind.type_name().to_string();
        let (props, children) = match spec.kind {
            NodeKind::Frame(container) | NodeKind::Stack(container) => {
                let props = props_from(&container);
                (props, container.children)
            }
            NodeKind::Text(text) => (props_from(&text), Vec::new()),
            NodeKind::Component(component) => (props_from(&component), Vec::new()),
            NodeKind::Image(image) => (props_from(&image), Vec::new()),
            NodeKind::Spacer(spacer) => (props_from(&spacer), Vec::new()),
            NodeKind::Unsupported { children, .. } => (Map::new(), children),
        };

        RawNodeSpec {
            node_type,
            name: spec.name,
            tokens: spec.tokens,
            constraints: spec.constraints,
            plugin_data: spec.plugin_data,
            idempotent_key: spec.idempotent_key,
            operation: spec.operation,
            children,
            props,
        }
    }
}

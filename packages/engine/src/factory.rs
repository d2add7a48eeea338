//! # Node Factory
//!
//! Turns node specs into canvas nodes, depth first. Each node is appended to
//! its parent right after creation so fill sizing is applied inside an
//! auto-layout parent. Unsupported node types are skipped with a notice;
//! host failures abort the whole batch.

use crate::errors::{EngineError, HostError};
use crate::host::{
    AutoLayout, Canvas, FontName, HostNodeKind, NodeId, NodeSizing, NoticeLevel, Paint, Sizing,
    TextContent,
};
use crate::identity::write_identity;
use crate::tokens::{
    TokenResolver, Typography, UnresolvedTokenPolicy, FALLBACK_PAINT_HEX,
};
use futures::future::{BoxFuture, FutureExt};
use plinth_schema::{
    ContainerSpec, Dimension, Direction, NodeIdentity, NodeKind, NodeSpec, SizeSpec, TextSpec,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Record of one node the factory put on the canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNode {
    pub id: NodeId,
    pub name: String,
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<NodeIdentity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CreatedNode>,
}

impl CreatedNode {
    /// This node plus all descendants
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(CreatedNode::count).sum::<usize>()
    }

    /// Visit this node and every descendant, parents first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a CreatedNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Per-run state shared by every node the factory builds
pub struct BuildContext<'t> {
    tokens: &'t dyn TokenResolver,
    policy: UnresolvedTokenPolicy,
    loaded_fonts: HashSet<FontName>,
    warnings: Vec<String>,
}

impl<'t> BuildContext<'t> {
    pub fn new(tokens: &'t dyn TokenResolver, policy: UnresolvedTokenPolicy) -> Self {
        Self {
            tokens,
            policy,
            loaded_fonts: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    pub fn tokens(&self) -> &dyn TokenResolver {
        self.tokens
    }

    /// Record a non-fatal problem for the run summary
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    pub fn paint(&mut self, token: &str) -> Result<Option<Paint>, EngineError> {
        match self.tokens.resolve_paint(token) {
            Some(paint) => Ok(Some(paint)),
            None => self.unresolved(token, "paint", Paint::solid_hex(FALLBACK_PAINT_HEX)),
        }
    }

    pub fn typography(&mut self, token: &str) -> Result<Option<Typography>, EngineError> {
        match self.tokens.resolve_typography(token) {
            Some(typography) => Ok(Some(typography)),
            None => self.unresolved(token, "typography", Some(Typography::default())),
        }
    }

    fn unresolved<T>(
        &mut self,
        token: &str,
        kind: &'static str,
        fallback: Option<T>,
    ) -> Result<Option<T>, EngineError> {
        match self.policy {
            UnresolvedTokenPolicy::Fallback => {
                self.warn(format!("Unresolved {} token '{}', using fallback", kind, token));
                Ok(fallback)
            }
            UnresolvedTokenPolicy::Skip => {
                self.warn(format!("Unresolved {} token '{}', skipped", kind, token));
                Ok(None)
            }
            UnresolvedTokenPolicy::Error => Err(EngineError::UnresolvedToken {
                token: token.to_string(),
                kind,
            }),
        }
    }

    /// Load `font` once per run, falling back to the default font when the host rejects it
    pub async fn ensure_font(
        &mut self,
        canvas: &mut dyn Canvas,
        font: FontName,
    ) -> Result<FontName, HostError> {
        if self.loaded_fonts.contains(&font) {
            return Ok(font);
        }

        match canvas.load_font(&font).await {
            Ok(()) => {
                self.loaded_fonts.insert(font.clone());
                Ok(font)
            }
            Err(err) => {
                let fallback = Typography::default().font;
                if font == fallback {
                    return Err(err);
                }
                self.warn(format!("Font '{}' unavailable, using '{}'", font, fallback));
                if !self.loaded_fonts.contains(&fallback) {
                    canvas.load_font(&fallback).await?;
                    self.loaded_fonts.insert(fallback.clone());
                }
                Ok(fallback)
            }
        }
    }
}

/// Create every spec under `parent`, in order
pub async fn create_nodes(
    canvas: &mut dyn Canvas,
    parent: NodeId,
    specs: &[NodeSpec],
    ctx: &mut BuildContext<'_>,
) -> Result<Vec<CreatedNode>, EngineError> {
    let mut created = Vec::with_capacity(specs.len());
    for spec in specs {
        if let Some(node) = create_node(canvas, parent, spec, ctx).await? {
            created.push(node);
        }
    }
    Ok(created)
}

/// Create one spec and its subtree. Returns `None` when the type is unsupported.
pub fn create_node<'a, 't: 'a>(
    canvas: &'a mut dyn Canvas,
    parent: NodeId,
    spec: &'a NodeSpec,
    ctx: &'a mut BuildContext<'t>,
) -> BoxFuture<'a, Result<Option<CreatedNode>, EngineError>> {
    async move {
        let host_kind = match &spec.kind {
            NodeKind::Frame(_) | NodeKind::Stack(_) | NodeKind::Spacer(_) => HostNodeKind::Frame,
            NodeKind::Text(_) => HostNodeKind::Text,
            NodeKind::Image(_) => HostNodeKind::Rectangle,
            NodeKind::Component(component) => HostNodeKind::Instance {
                component_key: component.component_key.clone(),
            },
            NodeKind::Unsupported { type_name, .. } => {
                let message = format!(
                    "Skipped '{}': unsupported node type '{}'",
                    spec.display_name(),
                    type_name
                );
                canvas.notify(&message, NoticeLevel::Warning);
                ctx.warn(message);
                return Ok(None);
            }
        };

        let id = canvas.create_node(host_kind).await?;
        canvas.append_child(parent, id)?;
        canvas.set_name(id, spec.display_name())?;

        let mut children = Vec::new();
        match &spec.kind {
            NodeKind::Frame(container) | NodeKind::Stack(container) => {
                let stack = matches!(spec.kind, NodeKind::Stack(_));
                apply_container(canvas, id, container, stack)?;
                apply_fill_token(canvas, id, spec, ctx)?;

                for child in &container.children {
                    if let Some(node) = create_node(&mut *canvas, id, child, &mut *ctx).await? {
                        children.push(node);
                    }
                }
            }
            NodeKind::Text(text) => apply_text(canvas, id, spec, text, ctx).await?,
            NodeKind::Component(component) => {
                apply_size(canvas, id, component.size.as_ref(), None, Sizing::Fixed)?;
                if !component.properties.is_empty() {
                    canvas.set_component_properties(id, &component.properties)?;
                }
                apply_fill_token(canvas, id, spec, ctx)?;
            }
            NodeKind::Image(image) => {
                apply_size(canvas, id, image.size.as_ref(), None, Sizing::Fixed)?;
                canvas.set_fills(
                    id,
                    &[Paint::Image {
                        src: image.src.clone(),
                        fit: image.fit,
                    }],
                )?;
            }
            NodeKind::Spacer(spacer) => {
                canvas.set_fills(id, &[])?;
                apply_size(canvas, id, spacer.size.as_ref(), None, Sizing::Fixed)?;
            }
            NodeKind::Unsupported { .. } => {}
        }

        if let Some(token) = &spec.tokens.stroke {
            if let Some(paint) = ctx.paint(token)? {
                canvas.set_strokes(id, &[paint])?;
            }
        }

        if let Some(constraints) = &spec.constraints {
            canvas.set_constraints(id, constraints)?;
        }

        for (key, value) in &spec.plugin_data {
            canvas.set_plugin_data(id, key, value)?;
        }
        if let Some(identity) = &spec.identity {
            write_identity(canvas, id, identity)?;
        }

        debug!(node = %id, name = spec.display_name(), kind = spec.type_name(), "Node created");

        Ok(Some(CreatedNode {
            id,
            name: spec.display_name().to_string(),
            type_name: spec.type_name().to_string(),
            identity: spec.identity.clone(),
            children,
        }))
    }
    .boxed()
}

fn apply_container(
    canvas: &mut dyn Canvas,
    id: NodeId,
    container: &ContainerSpec,
    stack: bool,
) -> Result<(), HostError> {
    let layout = container.layout.unwrap_or_default();
    let direction = layout
        .direction
        .or_else(|| stack.then_some(Direction::Vertical));

    canvas.set_fills(id, &[])?;

    let default_sizing = match direction {
        Some(direction) => {
            canvas.set_auto_layout(
                id,
                &AutoLayout {
                    direction,
                    spacing: layout.spacing.unwrap_or(0.0),
                    padding: layout.padding.map(|p| p.edges()).unwrap_or_default(),
                    primary_align: layout.align,
                    counter_align: layout.cross_align,
                },
            )?;
            Sizing::Hug
        }
        None => Sizing::Fixed,
    };

    apply_size(canvas, id, container.size.as_ref(), layout.grow, default_sizing)
}

/// Resize fixed axes and record the sizing mode of each axis
pub(crate) fn apply_size(
    canvas: &mut dyn Canvas,
    id: NodeId,
    size: Option<&SizeSpec>,
    grow: Option<f64>,
    default: Sizing,
) -> Result<(), HostError> {
    let width = size.and_then(|s| s.width);
    let height = size.and_then(|s| s.height);
    let fixed_width = width.and_then(|d| d.fixed());
    let fixed_height = height.and_then(|d| d.fixed());

    if fixed_width.is_some() || fixed_height.is_some() {
        let current = canvas.bounds(id).unwrap_or_default();
        canvas.resize(
            id,
            fixed_width.unwrap_or(current.width),
            fixed_height.unwrap_or(current.height),
        )?;
    }

    canvas.set_sizing(
        id,
        &NodeSizing {
            horizontal: sizing_of(width, default),
            vertical: sizing_of(height, default),
            grow: grow.unwrap_or(0.0),
        },
    )
}

pub(crate) fn sizing_of(dimension: Option<Dimension>, default: Sizing) -> Sizing {
    match dimension {
        Some(d) if d.fixed().is_some() => Sizing::Fixed,
        Some(d) if d.is_fill() => Sizing::Fill,
        Some(_) => Sizing::Hug,
        None => default,
    }
}

fn apply_fill_token(
    canvas: &mut dyn Canvas,
    id: NodeId,
    spec: &NodeSpec,
    ctx: &mut BuildContext<'_>,
) -> Result<(), EngineError> {
    if let Some(token) = &spec.tokens.fill {
        if let Some(paint) = ctx.paint(token)? {
            canvas.set_fills(id, &[paint])?;
        }
    }
    Ok(())
}

async fn apply_text(
    canvas: &mut dyn Canvas,
    id: NodeId,
    spec: &NodeSpec,
    text: &TextSpec,
    ctx: &mut BuildContext<'_>,
) -> Result<(), EngineError> {
    let mut typography = match &spec.tokens.text {
        Some(token) => ctx.typography(token)?.unwrap_or_default(),
        None => Typography::default(),
    };

    if let Some(style) = &text.style {
        if let Some(family) = &style.font_family {
            typography.font.family = family.clone();
        }
        if let Some(font_style) = &style.font_style {
            typography.font.style = font_style.clone();
        }
        typography.font_size = style.font_size.unwrap_or(typography.font_size);
        typography.line_height = style.line_height.or(typography.line_height);
        typography.letter_spacing = style.letter_spacing.or(typography.letter_spacing);
    }

    let font = ctx.ensure_font(canvas, typography.font).await?;
    canvas.set_text(
        id,
        &TextContent {
            characters: text.content.clone(),
            font,
            font_size: typography.font_size,
            line_height: typography.line_height,
            letter_spacing: typography.letter_spacing,
        },
    )?;

    let color = text.style.as_ref().and_then(|s| s.color.as_deref());
    let paint = match color {
        Some(hex) => match Paint::solid_hex(hex) {
            Some(paint) => Some(paint),
            None => {
                ctx.warn(format!("Invalid text color '{}' on '{}'", hex, spec.display_name()));
                None
            }
        },
        None => match &spec.tokens.fill {
            Some(token) => ctx.paint(token)?,
            None => None,
        },
    };
    if let Some(paint) = paint {
        canvas.set_fills(id, &[paint])?;
    }

    apply_size(canvas, id, text.size.as_ref(), None, Sizing::Hug)?;
    Ok(())
}

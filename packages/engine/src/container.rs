//! Target page and surface frame management.

use crate::errors::{EngineError, HostError};
use crate::host::{AutoLayout, Canvas, HostNodeKind, NodeId, NodeSizing, Paint, Sizing};
use crate::identity::ContainerIdentity;
use crate::tokens::TokenResolver;
use plinth_registry::SurfaceConfig;
use plinth_schema::Direction;
use tracing::{debug, info};

/// Vertical gap between a new surface frame and the content above it
pub const FRAME_GAP: f64 = 120.0;

/// Page named `name`. Pages are never created implicitly.
pub fn find_target_page(canvas: &dyn Canvas, name: &str) -> Result<NodeId, EngineError> {
    canvas
        .find_page(name)
        .ok_or_else(|| EngineError::PageNotFound(name.to_string()))
}

/// Top-level frames on `page` named `frame_name`
pub fn find_frames(canvas: &dyn Canvas, page: NodeId, frame_name: &str) -> Vec<NodeId> {
    canvas
        .children(page)
        .into_iter()
        .filter(|id| {
            canvas.node_kind(*id) == Some(HostNodeKind::Frame)
                && canvas.node_name(*id).as_deref() == Some(frame_name)
        })
        .collect()
}

/// Remove every top-level frame named `frame_name`. Returns how many were removed.
pub fn remove_existing_frame(
    canvas: &mut dyn Canvas,
    page: NodeId,
    frame_name: &str,
) -> Result<usize, HostError> {
    let frames = find_frames(canvas, page, frame_name);
    for frame in &frames {
        canvas.remove_node(*frame)?;
    }
    if !frames.is_empty() {
        debug!(frame = frame_name, count = frames.len(), "Removed existing frame");
    }
    Ok(frames.len())
}

/// Reuse the named surface frame or create one below the page's existing content
pub async fn prepare_target_frame(
    canvas: &mut dyn Canvas,
    page: NodeId,
    frame_name: &str,
) -> Result<NodeId, HostError> {
    if let Some(existing) = find_frames(canvas, page, frame_name).into_iter().next() {
        return Ok(existing);
    }

    let origin = canvas
        .children(page)
        .into_iter()
        .filter_map(|id| canvas.bounds(id))
        .fold(None, |acc: Option<(f64, f64)>, rect| match acc {
            Some((x, bottom)) => Some((x.min(rect.x), bottom.max(rect.bottom()))),
            None => Some((rect.x, rect.bottom())),
        });

    let frame = canvas.create_node(HostNodeKind::Frame).await?;
    canvas.append_child(page, frame)?;
    canvas.set_name(frame, frame_name)?;
    match origin {
        Some((x, bottom)) => canvas.set_position(frame, x, bottom + FRAME_GAP)?,
        None => canvas.set_position(frame, 0.0, 0.0)?,
    }

    info!(frame = frame_name, node = %frame, "Created surface frame");
    Ok(frame)
}

/// Apply the surface's size, padding, spacing and background to its frame and stamp its identity
pub fn apply_surface_layout(
    canvas: &mut dyn Canvas,
    frame: NodeId,
    surface: &SurfaceConfig,
    tokens: &dyn TokenResolver,
) -> Result<(), HostError> {
    let current = canvas.bounds(frame).unwrap_or_default();
    canvas.set_auto_layout(
        frame,
        &AutoLayout {
            direction: Direction::Vertical,
            spacing: surface.spacing,
            padding: surface.padding,
            primary_align: None,
            counter_align: None,
        },
    )?;
    canvas.resize(frame, surface.width, surface.height.unwrap_or(current.height))?;
    canvas.set_sizing(
        frame,
        &NodeSizing {
            horizontal: Sizing::Fixed,
            vertical: if surface.height.is_some() {
                Sizing::Fixed
            } else {
                Sizing::Hug
            },
            grow: 0.0,
        },
    )?;

    let background: Option<Paint> = surface
        .background
        .as_deref()
        .and_then(|value| tokens.resolve_paint(value));
    match background {
        Some(paint) => canvas.set_fills(frame, &[paint])?,
        None => canvas.set_fills(frame, &[])?,
    }

    ContainerIdentity::surface(&surface.id, &surface.hash).write(canvas, frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCanvas;
    use crate::tokens::TokenTable;
    use plinth_registry::SurfaceRegistry;
    use plinth_schema::identity::SURFACE_ID_KEY;

    #[tokio::test]
    async fn test_missing_page_is_an_error() {
        let canvas = MemoryCanvas::with_pages(&["Cover"]);
        assert!(find_target_page(&canvas, "Cover").is_ok());
        assert!(matches!(
            find_target_page(&canvas, "Docs"),
            Err(EngineError::PageNotFound(name)) if name == "Docs"
        ));
    }

    #[tokio::test]
    async fn test_prepare_reuses_and_stacks_frames() {
        let mut canvas = MemoryCanvas::new();
        let page = canvas.current_page();

        let first = prepare_target_frame(&mut canvas, page, "Home").await.unwrap();
        assert_eq!(prepare_target_frame(&mut canvas, page, "Home").await.unwrap(), first);

        canvas.resize(first, 1440.0, 900.0).unwrap();
        let second = prepare_target_frame(&mut canvas, page, "Pricing").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(canvas.bounds(second).unwrap().y, 900.0 + FRAME_GAP);
    }

    #[tokio::test]
    async fn test_remove_existing_frame() {
        let mut canvas = MemoryCanvas::new();
        let page = canvas.current_page();
        prepare_target_frame(&mut canvas, page, "Home").await.unwrap();
        prepare_target_frame(&mut canvas, page, "Other").await.unwrap();

        assert_eq!(remove_existing_frame(&mut canvas, page, "Home").unwrap(), 1);
        assert_eq!(remove_existing_frame(&mut canvas, page, "Home").unwrap(), 0);
        assert_eq!(canvas.children(page).len(), 1);
    }

    #[tokio::test]
    async fn test_apply_surface_layout() {
        let mut canvas = MemoryCanvas::new();
        let page = canvas.current_page();
        let frame = prepare_target_frame(&mut canvas, page, "Home").await.unwrap();

        let registry = SurfaceRegistry::new();
        let surface = registry.default_surface();
        apply_surface_layout(&mut canvas, frame, surface, &TokenTable::default()).unwrap();

        let node = canvas.node(frame).unwrap();
        assert_eq!(node.bounds.width, surface.width);
        assert_eq!(node.auto_layout.unwrap().spacing, surface.spacing);
        assert_eq!(node.fills, vec![Paint::solid_hex("#FFFFFF").unwrap()]);
        assert_eq!(canvas.plugin_data(frame, SURFACE_ID_KEY).as_deref(), Some("default"));
    }
}

//! Execution context: resolves where and how a parsed document runs.
//!
//! Each target field is taken from the first source that provides it: the
//! run options, then the document's own `target`, then session defaults
//! (current page, document title or surface label, `append`).

use crate::container::find_target_page;
use crate::errors::EngineError;
use crate::host::{Canvas, NodeId};
use plinth_registry::SurfaceConfig;
use plinth_schema::{ExecutionRequest, Intent, Mode, RequestDocument, TargetSpec};
use serde::Serialize;

/// Suffix appended to the frame name of every dry run
pub const PREVIEW_SUFFIX: &str = "_preview";

/// Caller-level overrides for every document of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOptions {
    pub intent: Intent,
    pub target_page: Option<String>,
    pub target_mode: Option<Mode>,
    pub target_frame_name: Option<String>,
}

impl From<&ExecutionRequest> for ExecutionOptions {
    fn from(request: &ExecutionRequest) -> Self {
        Self {
            intent: request.intent,
            target_page: request.target_page.clone(),
            target_mode: request.target_mode,
            target_frame_name: request.target_frame_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTarget {
    pub page: String,
    pub frame_name: String,
    pub mode: Mode,
}

/// Everything the orchestrator needs to run one document
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub document: RequestDocument,
    pub surface: SurfaceConfig,
    pub intent: Intent,
    pub target: ResolvedTarget,
    pub page: NodeId,
}

pub fn preview_name(frame_name: &str) -> String {
    if frame_name.ends_with(PREVIEW_SUFFIX) {
        frame_name.to_string()
    } else {
        format!("{}{}", frame_name, PREVIEW_SUFFIX)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve the target of `document` and look up its page.
///
/// The resolved target is written back into `document.target`.
pub fn create_execution_context(
    canvas: &dyn Canvas,
    mut document: RequestDocument,
    surface: SurfaceConfig,
    options: &ExecutionOptions,
) -> Result<ExecutionContext, EngineError> {
    let page_name = non_blank(options.target_page.as_deref())
        .or_else(|| non_blank(document.target.page.as_deref()))
        .or_else(|| canvas.node_name(canvas.current_page()))
        .unwrap_or_default();

    let frame_name = non_blank(options.target_frame_name.as_deref())
        .or_else(|| non_blank(document.target.frame_name.as_deref()))
        .or_else(|| non_blank(document.meta.title.as_deref()))
        .unwrap_or_else(|| surface.label.clone());

    let frame_name = if options.intent.is_dry_run() {
        preview_name(&frame_name)
    } else {
        frame_name
    };

    let mode = options
        .target_mode
        .or(document.target.mode)
        .unwrap_or_default();

    let page = find_target_page(canvas, &page_name)?;

    document.target = TargetSpec {
        page: Some(page_name.clone()),
        frame_name: Some(frame_name.clone()),
        mode: Some(mode),
    };

    Ok(ExecutionContext {
        document,
        surface,
        intent: options.intent,
        target: ResolvedTarget {
            page: page_name,
            frame_name,
            mode,
        },
        page,
    })
}

//! # Executor
//!
//! Runs request documents end to end:
//!
//! ```text
//! parse → guardrails → context → frame → slot → reconcile → finalize
//! ```
//!
//! Parse and guardrail failures stop a document before the canvas is
//! touched. Documents in a batch run independently: a failure is recorded
//! and the next document still runs. Nothing is rolled back.

use crate::container::{apply_surface_layout, prepare_target_frame, remove_existing_frame};
use crate::context::{create_execution_context, ExecutionContext, ExecutionOptions};
use crate::errors::ExecutionError;
use crate::factory::BuildContext;
use crate::host::{Canvas, NodeId, NoticeLevel};
use crate::reconcile::{content_children, sync_slot_children};
use crate::slots::{find_slot_container, resolve_slot_container};
use crate::tokens::{TokenResolver, TokenTable, UnresolvedTokenPolicy};
use chrono::{DateTime, Utc};
use plinth_guardrails::{Diagnostic, GuardrailMetrics, Guardrails};
use plinth_registry::SurfaceRegistry;
use plinth_schema::{parse_document, ExecutionRequest, Intent, Mode};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, instrument, warn};

static NO_TOKENS: TokenTable = TokenTable {
    colors: BTreeMap::new(),
    typography: BTreeMap::new(),
};

/// Rule name attached to warnings raised while building nodes
pub const BUILD_RULE: &str = "build";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounts {
    /// Nodes created, descendants included
    pub created: usize,
    /// Keys present after the run but not before
    pub added: usize,
    /// Existing keys deleted and re-created
    pub updated: usize,
    /// Keys deleted by `operation: remove`
    pub removed: usize,
    /// Content nodes dropped by `mode: replace`
    pub cleared: usize,
    /// Keys present before the run but not after
    pub stale: usize,
}

/// Result of one executed document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub intent: Intent,
    pub page: String,
    pub frame_name: String,
    pub frame_id: NodeId,
    pub surface_id: String,
    pub slot_id: String,
    pub mode: Mode,
    pub metrics: GuardrailMetrics,
    pub warnings: Vec<Diagnostic>,
    pub created_names: Vec<String>,
    pub counts: SyncCounts,
    /// Required slots of the surface that hold no content after the run
    pub empty_required_slots: Vec<String>,
    pub executed_at: DateTime<Utc>,
}

/// Serializable per-document outcome of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    pub index: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ExecutionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl From<&ExecutionError> for ErrorReport {
    fn from(err: &ExecutionError) -> Self {
        let diagnostics = match err {
            ExecutionError::Validation { result } => {
                result.errors.iter().chain(&result.warnings).cloned().collect()
            }
            _ => Vec::new(),
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            diagnostics,
        }
    }
}

/// Results of a batch, in document order
#[derive(Debug)]
pub struct BatchOutcome {
    pub intent: Intent,
    pub results: Vec<Result<ExecutionSummary, ExecutionError>>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn summaries(&self) -> impl Iterator<Item = &ExecutionSummary> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn reports(&self) -> Vec<DocumentReport> {
        self.results
            .iter()
            .enumerate()
            .map(|(index, result)| match result {
                Ok(summary) => DocumentReport {
                    index,
                    ok: true,
                    summary: Some(summary.clone()),
                    error: None,
                },
                Err(err) => DocumentReport {
                    index,
                    ok: false,
                    summary: None,
                    error: Some(ErrorReport::from(err)),
                },
            })
            .collect()
    }
}

/// Runs documents against a canvas using one registry and one set of guardrails
pub struct Executor<'a> {
    registry: &'a SurfaceRegistry,
    guardrails: Guardrails,
    tokens: &'a dyn TokenResolver,
    token_policy: UnresolvedTokenPolicy,
}

impl<'a> Executor<'a> {
    pub fn new(registry: &'a SurfaceRegistry) -> Self {
        Self {
            registry,
            guardrails: Guardrails::default(),
            tokens: &NO_TOKENS,
            token_policy: UnresolvedTokenPolicy::default(),
        }
    }

    pub fn with_guardrails(mut self, guardrails: Guardrails) -> Self {
        self.guardrails = guardrails;
        self
    }

    pub fn with_tokens(mut self, tokens: &'a dyn TokenResolver, policy: UnresolvedTokenPolicy) -> Self {
        self.tokens = tokens;
        self.token_policy = policy;
        self
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        self.registry
    }

    /// Run one raw document
    #[instrument(skip(self, canvas, source, options), fields(bytes = source.len(), intent = options.intent.as_str()))]
    pub async fn run_document(
        &self,
        canvas: &mut dyn Canvas,
        source: &str,
        options: &ExecutionOptions,
    ) -> Result<ExecutionSummary, ExecutionError> {
        let document = parse_document(source)?;
        let surface = self.registry.resolve_surface_config(&document.meta).clone();

        let checked = self.guardrails.evaluate(&document, source.len(), &surface);
        for diagnostic in &checked.warnings {
            warn!(rule = %diagnostic.rule, "{}", diagnostic.message);
        }
        if !checked.is_ok() {
            return Err(ExecutionError::Validation { result: checked });
        }

        let ExecutionContext {
            document,
            surface,
            intent,
            target,
            page,
        } = create_execution_context(canvas, document, surface, options)?;

        if intent.is_dry_run() || target.mode == Mode::Replace {
            remove_existing_frame(canvas, page, &target.frame_name)?;
        }

        let frame = prepare_target_frame(canvas, page, &target.frame_name).await?;
        apply_surface_layout(canvas, frame, &surface, self.tokens)?;

        let slot =
            resolve_slot_container(canvas, frame, document.meta.slot.as_deref(), &surface).await?;

        let mut build = BuildContext::new(self.tokens, self.token_policy);
        let report = sync_slot_children(
            canvas,
            &slot,
            &document.nodes,
            &surface,
            target.mode,
            &mut build,
        )
        .await?;

        let view: &dyn Canvas = &*canvas;
        let empty_required_slots: Vec<String> = surface
            .required_slots
            .iter()
            .filter(|slot_id| {
                find_slot_container(view, frame, slot_id)
                    .map(|container| content_children(view, container).is_empty())
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        let mut warnings = checked.warnings;
        warnings.extend(
            build
                .into_warnings()
                .into_iter()
                .map(|message| Diagnostic::warning(BUILD_RULE, message)),
        );

        let summary = ExecutionSummary {
            intent,
            page: target.page,
            frame_name: target.frame_name,
            frame_id: frame,
            surface_id: surface.id.clone(),
            slot_id: slot.slot_id.clone(),
            mode: target.mode,
            metrics: checked.metrics,
            warnings,
            created_names: report.created_names(),
            counts: SyncCounts {
                created: report.created_count(),
                added: report.added_keys.len(),
                updated: report.updated_keys.len(),
                removed: report.removed_keys.len(),
                cleared: report.cleared,
                stale: report.stale_keys.len(),
            },
            empty_required_slots,
            executed_at: Utc::now(),
        };

        if !intent.is_dry_run() {
            canvas.set_selection(page, &[frame])?;
            canvas.notify(
                &format!(
                    "Created {} node(s) in '{}'",
                    summary.counts.created, summary.frame_name
                ),
                NoticeLevel::Info,
            );
        }

        info!(
            frame = %summary.frame_name,
            surface = %summary.surface_id,
            slot = %summary.slot_id,
            created = summary.counts.created,
            warnings = summary.warnings.len(),
            "Document executed"
        );

        Ok(summary)
    }

    /// Run every document of a validated request, in order
    #[instrument(skip_all, fields(documents = request.documents.len(), intent = request.intent.as_str()))]
    pub async fn run_batch(
        &self,
        canvas: &mut dyn Canvas,
        request: &ExecutionRequest,
    ) -> BatchOutcome {
        let options = ExecutionOptions::from(request);
        let mut results = Vec::with_capacity(request.documents.len());

        for (index, source) in request.documents.iter().enumerate() {
            let result = self.run_document(canvas, source, &options).await;
            if let Err(err) = &result {
                error!(index, error = %err, "Document failed");
                if !options.intent.is_dry_run() {
                    canvas.notify(
                        &format!("Document {} failed: {}", index + 1, err),
                        NoticeLevel::Error,
                    );
                }
            }
            results.push(result);
        }

        let outcome = BatchOutcome {
            intent: request.intent,
            results,
        };
        info!(
            succeeded = outcome.succeeded(),
            failed = outcome.failed(),
            "Batch finished"
        );
        outcome
    }
}

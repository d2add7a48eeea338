mod budget;
mod slot_placement;

pub use budget::{BudgetRule, Metric};
pub use slot_placement::SlotPlacementRule;

use crate::diagnostic::Diagnostic;
use crate::evaluator::GuardrailMetrics;
use crate::thresholds::GuardrailThresholds;
use plinth_registry::SurfaceConfig;
use plinth_schema::RequestDocument;

/// Everything a rule may look at. Rules never see the canvas.
#[derive(Debug, Clone, Copy)]
pub struct GuardrailInput<'a> {
    pub document: &'a RequestDocument,
    pub surface: &'a SurfaceConfig,
    pub metrics: &'a GuardrailMetrics,
    pub thresholds: &'a GuardrailThresholds,
}

/// Trait for implementing guardrail rules
pub trait GuardrailRule: Send + Sync {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    fn check(&self, input: &GuardrailInput<'_>) -> Vec<Diagnostic>;
}

/// The budget rules for every metric, then slot placement
pub fn builtin_rules() -> Vec<Box<dyn GuardrailRule>> {
    vec![
        Box::new(BudgetRule::new(Metric::NodeCount)),
        Box::new(BudgetRule::new(Metric::Depth)),
        Box::new(BudgetRule::new(Metric::FileSize)),
        Box::new(SlotPlacementRule),
    ]
}

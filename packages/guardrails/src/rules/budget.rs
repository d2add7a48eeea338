use super::{GuardrailInput, GuardrailRule};
use crate::diagnostic::Diagnostic;
use crate::thresholds::Budget;

/// Structural metric measured by a budget rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    NodeCount,
    Depth,
    FileSize,
}

impl Metric {
    fn limit(&self, budget: &Budget) -> usize {
        match self {
            Metric::NodeCount => budget.node_count,
            Metric::Depth => budget.depth,
            Metric::FileSize => budget.file_size,
        }
    }

    fn describe(&self, value: usize) -> String {
        match self {
            Metric::NodeCount => format!("{} nodes", value),
            Metric::Depth => format!("nesting depth {}", value),
            Metric::FileSize => format!("{} bytes", value),
        }
    }
}

/// Two-tier budget on one metric; the fail tier wins when both trip
#[derive(Debug, Clone, Copy)]
pub struct BudgetRule {
    metric: Metric,
}

impl BudgetRule {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }
}

impl GuardrailRule for BudgetRule {
    fn name(&self) -> &'static str {
        match self.metric {
            Metric::NodeCount => "node-count",
            Metric::Depth => "depth",
            Metric::FileSize => "file-size",
        }
    }

    fn description(&self) -> &'static str {
        match self.metric {
            Metric::NodeCount => "Limits the total number of nodes in a document",
            Metric::Depth => "Limits how deeply nodes may nest",
            Metric::FileSize => "Limits the serialized size of a document",
        }
    }

    fn check(&self, input: &GuardrailInput<'_>) -> Vec<Diagnostic> {
        let value = match self.metric {
            Metric::NodeCount => input.metrics.node_count,
            Metric::Depth => input.metrics.depth,
            Metric::FileSize => input.metrics.file_size,
        };

        let fail = self.metric.limit(&input.thresholds.fail);
        let warn = self.metric.limit(&input.thresholds.warn);

        if value >= fail {
            vec![Diagnostic::error(
                self.name(),
                format!(
                    "Document has {} (limit {})",
                    self.metric.describe(value),
                    self.metric.describe(fail)
                ),
            )
            .with_suggestion("Split the document into smaller sections")]
        } else if value >= warn {
            vec![Diagnostic::warning(
                self.name(),
                format!(
                    "Document has {} (recommended below {})",
                    self.metric.describe(value),
                    self.metric.describe(warn)
                ),
            )]
        } else {
            Vec::new()
        }
    }
}

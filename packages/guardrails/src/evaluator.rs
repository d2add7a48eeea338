//! # Guardrail Evaluation
//!
//! Pure, pre-mutation checks over a request document. Evaluation always runs
//! to completion; callers must not touch the canvas when `errors` is non-empty.

use crate::diagnostic::{Diagnostic, DiagnosticLevel};
use crate::rules::{builtin_rules, GuardrailInput, GuardrailRule};
use crate::thresholds::GuardrailThresholds;
use plinth_registry::SurfaceConfig;
use plinth_schema::{NodeSpec, RequestDocument};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Structural measurements of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailMetrics {
    pub node_count: usize,
    /// Deepest nesting level; top-level nodes are depth 1
    pub depth: usize,
    /// Serialized size in bytes
    pub file_size: usize,
}

impl GuardrailMetrics {
    pub fn measure(document: &RequestDocument, raw_size: usize) -> Self {
        let mut node_count = 0;
        let mut depth = 0;
        let mut stack: Vec<(&NodeSpec, usize)> = document.nodes.iter().map(|n| (n, 1)).collect();

        while let Some((node, level)) = stack.pop() {
            node_count += 1;
            depth = depth.max(level);
            stack.extend(node.children().iter().map(|child| (child, level + 1)));
        }

        Self {
            node_count,
            depth,
            file_size: raw_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GuardrailResult {
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
    pub metrics: GuardrailMetrics,
}

impl GuardrailResult {
    /// True when nothing blocks execution
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|d| d.message.clone()).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|d| d.message.clone()).collect()
    }
}

/// Thresholds plus the rules to apply, in order
pub struct Guardrails {
    thresholds: GuardrailThresholds,
    rules: Vec<Box<dyn GuardrailRule>>,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self::new(GuardrailThresholds::default())
    }
}

impl Guardrails {
    /// Built-in rules under `thresholds`
    pub fn new(thresholds: GuardrailThresholds) -> Self {
        Self::with_rules(thresholds, builtin_rules())
    }

    /// Exactly `rules`, without the built-ins
    pub fn with_rules(
        thresholds: GuardrailThresholds,
        rules: Vec<Box<dyn GuardrailRule>>,
    ) -> Self {
        Self { thresholds, rules }
    }

    pub fn with_rule(mut self, rule: Box<dyn GuardrailRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn thresholds(&self) -> &GuardrailThresholds {
        &self.thresholds
    }

    pub fn evaluate(
        &self,
        document: &RequestDocument,
        raw_size: usize,
        surface: &SurfaceConfig,
    ) -> GuardrailResult {
        let metrics = GuardrailMetrics::measure(document, raw_size);
        let input = GuardrailInput {
            document,
            surface,
            metrics: &metrics,
            thresholds: &self.thresholds,
        };

        let mut result = GuardrailResult {
            metrics,
            ..GuardrailResult::default()
        };

        for rule in &self.rules {
            for diagnostic in rule.check(&input) {
                match diagnostic.level {
                    DiagnosticLevel::Error => result.errors.push(diagnostic),
                    DiagnosticLevel::Warning => result.warnings.push(diagnostic),
                }
            }
        }

        debug!(
            nodes = metrics.node_count,
            depth = metrics.depth,
            bytes = metrics.file_size,
            warnings = result.warnings.len(),
            errors = result.errors.len(),
            "Guardrails evaluated"
        );

        result
    }
}

/// Evaluate with the default thresholds and built-in rules
pub fn evaluate(
    document: &RequestDocument,
    raw_size: usize,
    surface: &SurfaceConfig,
) -> GuardrailResult {
    Guardrails::default().evaluate(document, raw_size, surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::GuardrailRule;
    use plinth_registry::SurfaceRegistry;
    use plinth_schema::DocumentMeta;

    fn flat_document(count: usize) -> RequestDocument {
        RequestDocument::new(
            (0..count)
                .map(|i| NodeSpec::text(format!("n{}", i), "x"))
                .collect(),
        )
    }

    fn nested_document(depth: usize) -> RequestDocument {
        let mut node = NodeSpec::text("leaf", "x");
        for level in 1..depth {
            node = NodeSpec::frame(format!("level-{}", level), vec![node]);
        }
        RequestDocument::new(vec![node])
    }

    fn docs_registry() -> SurfaceRegistry {
        SurfaceRegistry::from_json(
            r#"{ "surfaces": { "docs": { "slots": [
                { "id": "body" },
                { "id": "terms", "parent": "body", "allowedSections": ["glossary"] }
            ] } } }"#,
        )
        .unwrap()
    }

    fn rules_fired(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.rule.as_str()).collect()
    }

    #[test]
    fn test_metrics() {
        let doc = RequestDocument::new(vec![
            NodeSpec::frame("a", vec![NodeSpec::text("b", "x"), NodeSpec::text("c", "y")]),
            NodeSpec::text("d", "z"),
        ]);
        let metrics = GuardrailMetrics::measure(&doc, 512);
        assert_eq!(metrics.node_count, 4);
        assert_eq!(metrics.depth, 2);
        assert_eq!(metrics.file_size, 512);
    }

    #[test]
    fn test_metrics_count_inside_unsupported_nodes() {
        let doc = plinth_schema::parse_document(
            r#"{ "nodes": [ { "type": "carousel", "children": [ { "type": "text", "content": "a" } ] } ] }"#,
        )
        .unwrap();
        let metrics = GuardrailMetrics::measure(&doc, 0);
        assert_eq!(metrics.node_count, 2);
        assert_eq!(metrics.depth, 2);
    }

    #[test]
    fn test_small_document_is_clean() {
        let registry = SurfaceRegistry::new();
        let result = evaluate(&flat_document(3), 100, registry.default_surface());
        assert!(result.is_ok());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_node_count_boundaries() {
        let registry = SurfaceRegistry::new();
        let surface = registry.default_surface();

        let below = evaluate(&flat_document(119), 0, surface);
        assert!(below.warnings.is_empty());

        let at_warn = evaluate(&flat_document(120), 0, surface);
        assert_eq!(rules_fired(&at_warn.warnings), vec!["node-count"]);
        assert!(at_warn.errors.is_empty());

        let at_fail = evaluate(&flat_document(200), 0, surface);
        assert_eq!(rules_fired(&at_fail.errors), vec!["node-count"]);
        assert!(at_fail.warnings.is_empty(), "fail tier takes priority");
    }

    #[test]
    fn test_depth_boundaries() {
        let registry = SurfaceRegistry::new();
        let surface = registry.default_surface();

        assert!(evaluate(&nested_document(5), 0, surface).warnings.is_empty());

        let at_warn = evaluate(&nested_document(6), 0, surface);
        assert_eq!(at_warn.metrics.depth, 6);
        assert_eq!(rules_fired(&at_warn.warnings), vec!["depth"]);
        assert!(at_warn.is_ok());

        let at_fail = evaluate(&nested_document(8), 0, surface);
        assert_eq!(rules_fired(&at_fail.errors), vec!["depth"]);
    }

    #[test]
    fn test_file_size_boundaries() {
        let registry = SurfaceRegistry::new();
        let surface = registry.default_surface();
        let doc = flat_document(1);

        assert!(evaluate(&doc, 40 * 1024 - 1, surface).warnings.is_empty());
        assert_eq!(rules_fired(&evaluate(&doc, 40 * 1024, surface).warnings), vec!["file-size"]);
        assert_eq!(rules_fired(&evaluate(&doc, 80 * 1024, surface).errors), vec!["file-size"]);
    }

    #[test]
    fn test_missing_slot_is_a_warning() {
        let registry = docs_registry();
        let mut doc = flat_document(1);
        doc.meta = DocumentMeta {
            slot: Some("sidebar".to_string()),
            ..DocumentMeta::default()
        };

        let result = evaluate(&doc, 0, registry.get("docs").unwrap());
        assert!(result.is_ok());
        assert_eq!(rules_fired(&result.warnings), vec!["slot-placement"]);
        assert!(result.warnings[0].message.contains("sidebar"));
    }

    #[test]
    fn test_disallowed_section_is_a_warning() {
        let registry = docs_registry();
        let surface = registry.get("docs").unwrap();
        let mut doc = flat_document(1);
        doc.meta = DocumentMeta {
            slot: Some("terms".to_string()),
            section: Some("pricing".to_string()),
            ..DocumentMeta::default()
        };

        let result = evaluate(&doc, 0, surface);
        assert!(result.is_ok());
        assert!(result.warnings[0].message.contains("pricing"));

        doc.meta.section = Some("Glossary".to_string());
        assert!(evaluate(&doc, 0, surface).warnings.is_empty());

        doc.meta.slot = Some("body".to_string());
        doc.meta.section = Some("anything".to_string());
        assert!(evaluate(&doc, 0, surface).warnings.is_empty());
    }

    #[test]
    fn test_custom_thresholds_and_rules() {
        struct NoAnonymousNodes;

        impl GuardrailRule for NoAnonymousNodes {
            fn name(&self) -> &'static str {
                "no-anonymous"
            }

            fn description(&self) -> &'static str {
                "Every top-level node needs a key"
            }

            fn check(&self, input: &GuardrailInput<'_>) -> Vec<Diagnostic> {
                input
                    .document
                    .nodes
                    .iter()
                    .filter(|n| n.local_key().is_none())
                    .map(|n| Diagnostic::error(self.name(), format!("{} has no key", n.type_name())))
                    .collect()
            }
        }

        let guardrails = Guardrails::with_rules(GuardrailThresholds::default(), Vec::new())
            .with_rule(Box::new(NoAnonymousNodes));

        let mut doc = flat_document(1);
        doc.nodes.push(NodeSpec::new(plinth_schema::NodeKind::Spacer(Default::default())));

        let registry = SurfaceRegistry::new();
        let result = guardrails.evaluate(&doc, 0, registry.default_surface());
        assert_eq!(result.error_messages(), vec!["spacer has no key".to_string()]);
    }
}

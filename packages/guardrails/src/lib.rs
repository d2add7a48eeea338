//! # Plinth Guardrails
//!
//! Structural budget and slot-placement checks that gate every run before
//! the canvas is mutated.

mod diagnostic;
mod evaluator;
mod thresholds;

pub mod rules;

pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use evaluator::{evaluate, GuardrailMetrics, GuardrailResult, Guardrails};
pub use rules::{builtin_rules, GuardrailInput, GuardrailRule};
pub use thresholds::{Budget, BudgetOverrides, GuardrailThresholds, ThresholdOverrides, KIB};

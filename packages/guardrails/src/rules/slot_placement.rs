use super::{GuardrailInput, GuardrailRule};
use crate::diagnostic::Diagnostic;

/// Checks `meta.slot` / `meta.section` against the resolved surface.
/// Placement problems are always warnings: the document still lands in the
/// surface root when its slot is unknown.
#[derive(Debug, Clone, Copy)]
pub struct SlotPlacementRule;

impl GuardrailRule for SlotPlacementRule {
    fn name(&self) -> &'static str {
        "slot-placement"
    }

    fn description(&self) -> &'static str {
        "Validates that the target slot exists and accepts the document's section"
    }

    fn check(&self, input: &GuardrailInput<'_>) -> Vec<Diagnostic> {
        let meta = &input.document.meta;
        let Some(slot_id) = meta.slot.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Vec::new();
        };

        let Some(slot) = input.surface.slot(slot_id) else {
            return vec![Diagnostic::warning(
                self.name(),
                format!(
                    "Slot '{}' is not defined on surface '{}'",
                    slot_id, input.surface.id
                ),
            )
            .with_suggestion("Content will be placed in the surface root")];
        };

        match meta.section.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(section) if !slot.allows_section(section) => vec![Diagnostic::warning(
                self.name(),
                format!(
                    "Section '{}' is not allowed in slot '{}' (allowed: {})",
                    section,
                    slot.id,
                    slot.allowed_sections.join(", ")
                ),
            )],
            _ => Vec::new(),
        }
    }
}

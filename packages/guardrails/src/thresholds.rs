use serde::{Deserialize, Serialize};

pub const KIB: usize = 1024;

/// One tier of structural limits. A metric trips the tier when it is `>=` the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub node_count: usize,
    pub depth: usize,
    /// Serialized document size in bytes
    pub file_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailThresholds {
    pub warn: Budget,
    pub fail: Budget,
}

impl Default for GuardrailThresholds {
    fn default() -> Self {
        Self {
            warn: Budget {
                node_count: 120,
                depth: 6,
                file_size: 40 * KIB,
            },
            fail: Budget {
                node_count: 200,
                depth: 8,
                file_size: 80 * KIB,
            },
        }
    }
}

/// Partially specified budget, as written in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<usize>,
}

impl BudgetOverrides {
    fn apply(&self, budget: Budget) -> Budget {
        Budget {
            node_count: self.node_count.unwrap_or(budget.node_count),
            depth: self.depth.unwrap_or(budget.depth),
            file_size: self.file_size.unwrap_or(budget.file_size),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default)]
    pub warn: BudgetOverrides,
    #[serde(default)]
    pub fail: BudgetOverrides,
}

impl ThresholdOverrides {
    /// Overlay the overrides on the default thresholds
    pub fn resolve(&self) -> GuardrailThresholds {
        let defaults = GuardrailThresholds::default();
        GuardrailThresholds {
            warn: self.warn.apply(defaults.warn),
            fail: self.fail.apply(defaults.fail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers() {
        let thresholds = GuardrailThresholds::default();
        assert_eq!(thresholds.warn.node_count, 120);
        assert_eq!(thresholds.warn.depth, 6);
        assert_eq!(thresholds.warn.file_size, 40 * 1024);
        assert_eq!(thresholds.fail.node_count, 200);
        assert_eq!(thresholds.fail.depth, 8);
        assert_eq!(thresholds.fail.file_size, 80 * 1024);
    }

    #[test]
    fn test_partial_overrides_keep_tier_defaults() {
        let overrides: ThresholdOverrides =
            serde_json::from_str(r#"{ "fail": { "nodeCount": 150 } }"#).unwrap();
        let thresholds = overrides.resolve();
        assert_eq!(thresholds.fail.node_count, 150);
        assert_eq!(thresholds.fail.depth, 8);
        assert_eq!(thresholds.warn, GuardrailThresholds::default().warn);
    }
}

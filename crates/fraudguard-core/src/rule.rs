//! Rule configuration records

use crate::expr::Expression;
use serde::{Deserialize, Serialize};

/// A configured fraud check.
///
/// `kind` carries the variant body; `is_critical` escalates a firing rule
/// from FRAUD to CRITICAL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub uuid: String,
    pub name: String,
    pub is_critical: bool,
    #[serde(flatten)]
    pub kind: RuleKind,
}

/// The four rule kinds, tagged by `rule_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    /// A single comparison over the current transaction.
    Threshold { expression: Expression },

    /// A boolean expression that may use history-backed aggregates.
    Pattern {
        expression: Expression,
        /// Window in seconds relative to the current transaction.
        #[serde(default)]
        max_delta_time: Option<u32>,
        /// Cap on the most recent rows considered.
        #[serde(default)]
        max_count: Option<u32>,
    },

    /// Gradient-boosted model lookup with a probability threshold.
    Ml { model_uuid: String, lower_bound: f64 },

    /// Boolean algebra over sub-expressions; no aggregates.
    Composite { expression: Expression },
}

impl RuleKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            RuleKind::Threshold { .. } => "THRESHOLD",
            RuleKind::Pattern { .. } => "PATTERN",
            RuleKind::Ml { .. } => "ML",
            RuleKind::Composite { .. } => "COMPOSITE",
        }
    }
}

//! The four rule kinds
//!
//! One tagged union with a single evaluate dispatch; each kind shares the
//! core expression evaluator and reports whether the transaction is
//! fraudulent plus a human-readable description.

mod composite;
mod ml;
mod pattern;
mod threshold;

pub use composite::CompositeRule;
pub use ml::{MlRule, Scorer};
pub use pattern::PatternRule;
pub use threshold::ThresholdRule;

use crate::error::Result;
use fraudguard_core::Transaction;

/// Outcome of one rule application.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub is_fraud: bool,
    pub description: String,
}

/// A built rule, ready to apply to transactions.
pub enum Rule {
    Threshold(ThresholdRule),
    Pattern(PatternRule),
    Ml(MlRule),
    Composite(CompositeRule),
}

impl Rule {
    pub async fn evaluate(&self, txn: &Transaction) -> Result<Evaluation> {
        match self {
            Rule::Threshold(rule) => rule.evaluate(txn).await,
            Rule::Pattern(rule) => rule.evaluate(txn).await,
            Rule::Ml(rule) => rule.evaluate(txn).await,
            Rule::Composite(rule) => rule.evaluate(txn).await,
        }
    }
}

//! Rule factory: build the right rule kind from a configuration

use crate::error::{EngineError, Result};
use crate::rules::{CompositeRule, MlRule, PatternRule, Rule, Scorer, ThresholdRule};
use fraudguard_core::{RuleConfig, RuleKind};
use fraudguard_store::TransactionHistory;
use std::sync::Arc;

/// Builds rules from configurations, validating that each kind's
/// prerequisites are wired: pattern rules need history, ML rules need both
/// history and a scorer.
#[derive(Clone)]
pub struct RuleFactory {
    history: Option<Arc<dyn TransactionHistory>>,
    scorer: Option<Arc<dyn Scorer>>,
}

impl RuleFactory {
    pub fn new(
        history: Option<Arc<dyn TransactionHistory>>,
        scorer: Option<Arc<dyn Scorer>>,
    ) -> Self {
        Self { history, scorer }
    }

    pub fn build(&self, config: &RuleConfig) -> Result<Rule> {
        match &config.kind {
            RuleKind::Threshold { expression } => {
                Ok(Rule::Threshold(ThresholdRule::new(expression.clone())))
            }
            RuleKind::Pattern {
                expression,
                max_delta_time,
                max_count,
            } => {
                let history = self.history.clone().ok_or_else(|| {
                    EngineError::Configuration(format!(
                        "PATTERN rule {} requires a transaction history store",
                        config.uuid
                    ))
                })?;
                Ok(Rule::Pattern(PatternRule::new(
                    expression.clone(),
                    *max_delta_time,
                    *max_count,
                    history,
                )))
            }
            RuleKind::Ml {
                model_uuid,
                lower_bound,
            } => {
                let scorer = self.scorer.clone().ok_or_else(|| {
                    EngineError::Configuration(format!(
                        "ML rule {} requires a scorer",
                        config.uuid
                    ))
                })?;
                let history = self.history.clone().ok_or_else(|| {
                    EngineError::Configuration(format!(
                        "ML rule {} requires a transaction history store",
                        config.uuid
                    ))
                })?;
                Ok(Rule::Ml(MlRule::new(
                    model_uuid.clone(),
                    *lower_bound,
                    scorer,
                    history,
                )))
            }
            RuleKind::Composite { expression } => {
                Ok(Rule::Composite(CompositeRule::new(expression.clone())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::{ComparisonOp, Expression, FieldRef};
    use fraudguard_store::MemoryHistory;

    fn config(kind: RuleKind) -> RuleConfig {
        RuleConfig {
            uuid: "r-1".to_string(),
            name: "rule".to_string(),
            is_critical: false,
            kind,
        }
    }

    fn expr() -> Expression {
        Expression::comparison(
            Expression::field(FieldRef::Amount),
            ComparisonOp::GreaterThan,
            Expression::literal(500.0),
        )
    }

    #[test]
    fn test_threshold_needs_nothing() {
        let factory = RuleFactory::new(None, None);
        assert!(factory
            .build(&config(RuleKind::Threshold { expression: expr() }))
            .is_ok());
    }

    #[test]
    fn test_pattern_requires_history() {
        let factory = RuleFactory::new(None, None);
        let err = factory
            .build(&config(RuleKind::Pattern {
                expression: expr(),
                max_delta_time: Some(60),
                max_count: None,
            }))
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));

        let with_history = RuleFactory::new(Some(Arc::new(MemoryHistory::new())), None);
        assert!(with_history
            .build(&config(RuleKind::Pattern {
                expression: expr(),
                max_delta_time: Some(60),
                max_count: None,
            }))
            .is_ok());
    }

    #[test]
    fn test_ml_requires_scorer_and_history() {
        let ml = RuleKind::Ml {
            model_uuid: "m-1".to_string(),
            lower_bound: 0.5,
        };

        let bare = RuleFactory::new(Some(Arc::new(MemoryHistory::new())), None);
        assert!(matches!(
            bare.build(&config(ml.clone())),
            Err(EngineError::Configuration(_))
        ));

        struct NullScorer;

        #[async_trait::async_trait]
        impl Scorer for NullScorer {
            async fn predict(
                &self,
                _model_uuid: &str,
                _txn: &fraudguard_core::Transaction,
                _history: &dyn TransactionHistory,
            ) -> fraudguard_ml::Result<f64> {
                Ok(0.0)
            }
        }

        let no_history = RuleFactory::new(None, Some(Arc::new(NullScorer)));
        assert!(matches!(
            no_history.build(&config(ml.clone())),
            Err(EngineError::Configuration(_))
        ));

        let full = RuleFactory::new(
            Some(Arc::new(MemoryHistory::new())),
            Some(Arc::new(NullScorer)),
        );
        assert!(full.build(&config(ml)).is_ok());
    }
}

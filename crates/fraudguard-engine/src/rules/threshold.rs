//! Threshold rule: a single comparison over the current transaction

use super::Evaluation;
use crate::error::Result;
use fraudguard_core::{CoreError, Evaluator, Expression, Transaction};

pub struct ThresholdRule {
    expression: Expression,
}

impl ThresholdRule {
    pub fn new(expression: Expression) -> Self {
        Self { expression }
    }

    pub async fn evaluate(&self, txn: &Transaction) -> Result<Evaluation> {
        if !matches!(self.expression, Expression::Comparison { .. }) {
            return Err(CoreError::MalformedExpression(
                "threshold rule supports only comparison operations".to_string(),
            )
            .into());
        }

        let evaluator = Evaluator::new(txn);
        let is_fraud = evaluator.eval_bool(&self.expression).await?;

        Ok(Evaluation {
            is_fraud,
            description: format!("Threshold rule applied, amount: {:.6}", txn.amount),
        })
    }
}

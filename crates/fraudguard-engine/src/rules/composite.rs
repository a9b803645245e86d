//! Composite rule: boolean algebra over sub-expressions, no aggregates

use super::Evaluation;
use crate::error::Result;
use fraudguard_core::{Evaluator, Expression, Transaction};

pub struct CompositeRule {
    expression: Expression,
}

impl CompositeRule {
    pub fn new(expression: Expression) -> Self {
        Self { expression }
    }

    pub async fn evaluate(&self, txn: &Transaction) -> Result<Evaluation> {
        // no aggregate context here: aggregate nodes fail the evaluation
        let evaluator = Evaluator::new(txn);
        let is_fraud = evaluator.eval_bool(&self.expression).await?;

        Ok(Evaluation {
            is_fraud,
            description: "Composite rule applied".to_string(),
        })
    }
}

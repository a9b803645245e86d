//! Pattern rule: boolean expression with history-backed aggregates

use super::Evaluation;
use crate::aggregate::HistoryAggregateContext;
use crate::error::Result;
use fraudguard_core::{Evaluator, Expression, Transaction};
use fraudguard_store::{AggregateWindow, TransactionHistory};
use std::sync::Arc;

pub struct PatternRule {
    expression: Expression,
    max_delta_time: Option<u32>,
    max_count: Option<u32>,
    history: Arc<dyn TransactionHistory>,
}

impl PatternRule {
    pub fn new(
        expression: Expression,
        max_delta_time: Option<u32>,
        max_count: Option<u32>,
        history: Arc<dyn TransactionHistory>,
    ) -> Self {
        Self {
            expression,
            max_delta_time,
            max_count,
            history,
        }
    }

    pub async fn evaluate(&self, txn: &Transaction) -> Result<Evaluation> {
        let window = AggregateWindow {
            reference_ts: txn.epoch_seconds(),
            max_delta_time: self.max_delta_time,
            max_count: self.max_count,
        };
        let ctx = HistoryAggregateContext::new(
            self.history.clone(),
            txn.sender_account.clone(),
            window,
        );

        let evaluator = Evaluator::with_context(txn, &ctx);
        let is_fraud = evaluator.eval_bool(&self.expression).await?;

        Ok(Evaluation {
            is_fraud,
            description: "Pattern rule applied".to_string(),
        })
    }
}

//! History-backed aggregate context for pattern rules

use async_trait::async_trait;
use fraudguard_core::{
    AggregateContext, AggregateFunction, CoreError, FieldRef, Value,
};
use fraudguard_store::{fold, AggregateWindow, StoreError, TransactionHistory};
use std::sync::Arc;
use std::time::Duration;

/// Rows fetched for the local-fold fallback.
const FOLD_FETCH_LIMIT: u32 = 1000;

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves aggregate nodes against one account's history within the
/// pattern rule's window.
///
/// Server-side pushdown is preferred when the store supports it; otherwise
/// the history is fetched and folded locally with the shared semantics.
pub struct HistoryAggregateContext {
    store: Arc<dyn TransactionHistory>,
    account_id: String,
    window: AggregateWindow,
    query_timeout: Duration,
}

impl HistoryAggregateContext {
    pub fn new(store: Arc<dyn TransactionHistory>, account_id: String, window: AggregateWindow) -> Self {
        Self {
            store,
            account_id,
            window,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    async fn resolve(
        &self,
        function: AggregateFunction,
        field: Option<FieldRef>,
    ) -> Result<f64, StoreError> {
        if self.store.supports_pushdown() {
            self.store
                .aggregate(function, field, &self.account_id, self.window)
                .await
        } else {
            let rows = self
                .store
                .account_history(&self.account_id, FOLD_FETCH_LIMIT)
                .await?;
            let windowed = fold::apply_window(rows, self.window);
            fold::fold(function, field, &windowed)
        }
    }
}

#[async_trait]
impl AggregateContext for HistoryAggregateContext {
    async fn aggregate(
        &self,
        function: AggregateFunction,
        field: Option<FieldRef>,
    ) -> fraudguard_core::Result<Value> {
        let resolved = tokio::time::timeout(self.query_timeout, self.resolve(function, field))
            .await
            .map_err(|_| CoreError::Aggregate {
                message: format!("aggregate {function:?} timed out"),
                retryable: true,
            })?
            .map_err(|e| CoreError::Aggregate {
                retryable: e.is_retryable(),
                message: e.to_string(),
            })?;

        // counts stay integral, everything else is a float
        Ok(match function {
            AggregateFunction::Count | AggregateFunction::CountDistinct => {
                Value::Int(resolved as i32)
            }
            _ => Value::Float(resolved),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::{
        ComparisonOp, DeviceUsed, Evaluator, Expression, PaymentChannel, Transaction,
        TransactionType,
    };
    use fraudguard_store::MemoryHistory;

    fn txn(id: &str, amount: f64, ts: i64) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            sender_account: "A".to_string(),
            receiver_account: "B".to_string(),
            amount,
            timestamp: ts.to_string(),
            transaction_type: TransactionType::Payment,
            merchant_category: "retail".to_string(),
            location: "US".to_string(),
            device_used: DeviceUsed::Web,
            payment_channel: PaymentChannel::Card,
            ip_address: "10.0.0.1".to_string(),
            device_hash: "h".to_string(),
        }
    }

    #[tokio::test]
    async fn test_count_yields_int_sum_yields_float() {
        let store = Arc::new(MemoryHistory::new());
        store.save(&txn("T1", 100.0, 1000)).await.unwrap();
        store.save(&txn("T2", 200.0, 2000)).await.unwrap();

        let ctx = HistoryAggregateContext::new(
            store,
            "A".to_string(),
            AggregateWindow::unbounded(3000),
        );

        let count = ctx.aggregate(AggregateFunction::Count, None).await.unwrap();
        assert_eq!(count, Value::Int(2));

        let sum = ctx
            .aggregate(AggregateFunction::Sum, Some(FieldRef::Amount))
            .await
            .unwrap();
        assert_eq!(sum, Value::Float(300.0));
    }

    #[tokio::test]
    async fn test_context_drives_expression_evaluation() {
        let store = Arc::new(MemoryHistory::new());
        for i in 0..4 {
            store.save(&txn(&format!("T{i}"), 50.0, 1000 + i)).await.unwrap();
        }

        let current = txn("T9", 75.0, 2000);
        let ctx = HistoryAggregateContext::new(
            store,
            current.sender_account.clone(),
            AggregateWindow {
                reference_ts: current.epoch_seconds(),
                max_delta_time: Some(60),
                max_count: None,
            },
        );

        // COUNT() > 3 over the last 60 seconds
        let expr = Expression::comparison(
            Expression::aggregate(AggregateFunction::Count, None),
            ComparisonOp::GreaterThan,
            Expression::literal(3),
        );

        let evaluator = Evaluator::with_context(&current, &ctx);
        assert!(evaluator.eval_bool(&expr).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_aggregate_is_non_retryable() {
        let store = Arc::new(MemoryHistory::new());
        let ctx = HistoryAggregateContext::new(
            store,
            "A".to_string(),
            AggregateWindow::unbounded(0),
        );

        let err = ctx
            .aggregate(AggregateFunction::Sum, Some(FieldRef::Location))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }
}

//! The history store contract consumed by pattern rules and ML features

use crate::error::Result;
use async_trait::async_trait;
use fraudguard_core::{AggregateFunction, FieldRef, Transaction};

/// Bounds on the history rows an aggregate considers.
///
/// The window is anchored at the current transaction's timestamp
/// (`reference_ts`), not at the wall clock. When both bounds are set,
/// `max_delta_time` filters first and `max_count` then keeps the most
/// recent rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateWindow {
    /// Epoch seconds of the transaction being evaluated.
    pub reference_ts: i64,
    /// Only rows within the last `max_delta_time` seconds before the
    /// reference.
    pub max_delta_time: Option<u32>,
    /// Hard cap on considered rows, most recent first.
    pub max_count: Option<u32>,
}

impl AggregateWindow {
    pub fn unbounded(reference_ts: i64) -> Self {
        Self {
            reference_ts,
            max_delta_time: None,
            max_count: None,
        }
    }
}

/// Persistent store of observed transactions, queried per sender account.
#[async_trait]
pub trait TransactionHistory: Send + Sync {
    /// Persist a transaction; idempotent by `transaction_id`.
    async fn save(&self, txn: &Transaction) -> Result<()>;

    /// Up to `limit` transactions for the account, most recent first.
    async fn account_history(&self, account_id: &str, limit: u32) -> Result<Vec<Transaction>>;

    /// As [`account_history`](Self::account_history), restricted to the
    /// last `minutes` minutes of wall-clock time.
    async fn recent(&self, account_id: &str, minutes: u32, limit: u32) -> Result<Vec<Transaction>>;

    /// Aggregate over the account's transactions within the window.
    /// Null/empty aggregates yield 0. `field` is `None` exactly for COUNT.
    async fn aggregate(
        &self,
        function: AggregateFunction,
        field: Option<FieldRef>,
        account_id: &str,
        window: AggregateWindow,
    ) -> Result<f64>;

    /// Whether [`aggregate`](Self::aggregate) is computed server-side.
    fn supports_pushdown(&self) -> bool {
        false
    }
}

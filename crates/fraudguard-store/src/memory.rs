//! In-memory history backend
//!
//! Used by tests and by deployments running without a database. Shares the
//! fold semantics with the Redis backend.

use crate::error::Result;
use crate::fold;
use crate::history::{AggregateWindow, TransactionHistory};
use async_trait::async_trait;
use chrono::Utc;
use fraudguard_core::{AggregateFunction, FieldRef, Transaction};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-process transaction history keyed by sender account.
#[derive(Default)]
pub struct MemoryHistory {
    accounts: Mutex<HashMap<String, Vec<Transaction>>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows across all accounts.
    pub fn row_count(&self) -> usize {
        self.accounts.lock().unwrap().values().map(Vec::len).sum()
    }
}

#[async_trait]
impl TransactionHistory for MemoryHistory {
    async fn save(&self, txn: &Transaction) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let rows = accounts.entry(txn.sender_account.clone()).or_default();
        if rows
            .iter()
            .any(|t| t.transaction_id == txn.transaction_id)
        {
            return Ok(());
        }
        rows.push(txn.clone());
        Ok(())
    }

    async fn account_history(&self, account_id: &str, limit: u32) -> Result<Vec<Transaction>> {
        let accounts = self.accounts.lock().unwrap();
        let mut rows = accounts.get(account_id).cloned().unwrap_or_default();
        rows.sort_by_key(|t| std::cmp::Reverse(t.epoch_seconds()));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn recent(&self, account_id: &str, minutes: u32, limit: u32) -> Result<Vec<Transaction>> {
        let cutoff = Utc::now().timestamp() - i64::from(minutes) * 60;
        let accounts = self.accounts.lock().unwrap();
        let mut rows: Vec<Transaction> = accounts
            .get(account_id)
            .map(|rows| {
                rows.iter()
                    .filter(|t| t.epoch_seconds() >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(|t| std::cmp::Reverse(t.epoch_seconds()));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn aggregate(
        &self,
        function: AggregateFunction,
        field: Option<FieldRef>,
        account_id: &str,
        window: AggregateWindow,
    ) -> Result<f64> {
        let rows = {
            let accounts = self.accounts.lock().unwrap();
            accounts.get(account_id).cloned().unwrap_or_default()
        };
        let windowed = fold::apply_window(rows, window);
        fold::fold(function, field, &windowed)
    }
}

//! Redis history backend
//!
//! Each account's history is a sorted set scored by epoch seconds with the
//! serialized row as the member. Aggregates are folded locally with the
//! shared fold semantics; retention trims on every save.

use crate::error::{Result, StoreError};
use crate::fold;
use crate::history::{AggregateWindow, TransactionHistory};
use async_trait::async_trait;
use chrono::Utc;
use fraudguard_core::{AggregateFunction, FieldRef, Transaction};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Retention policy for stored rows: seven days.
const RETENTION_SECS: i64 = 7 * 24 * 3600;

/// History store backed by Redis sorted sets.
pub struct RedisHistory {
    conn: ConnectionManager,
}

impl RedisHistory {
    /// Connect and hold a multiplexed connection.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Unavailable(format!("failed to create client: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to connect: {e}")))?;
        tracing::info!("Connected to Redis history store");
        Ok(Self { conn })
    }

    fn key(account_id: &str) -> String {
        format!("history:{account_id}")
    }

    fn decode_members(members: Vec<String>) -> Vec<Transaction> {
        let mut rows = Vec::with_capacity(members.len());
        for member in members {
            match serde_json::from_str::<Transaction>(&member) {
                Ok(txn) => rows.push(txn),
                Err(e) => tracing::warn!(error = %e, "skipping unparseable history row"),
            }
        }
        rows
    }
}

#[async_trait]
impl TransactionHistory for RedisHistory {
    async fn save(&self, txn: &Transaction) -> Result<()> {
        let key = Self::key(&txn.sender_account);
        let member = serde_json::to_string(txn)
            .map_err(|e| StoreError::Parse(format!("failed to serialize row: {e}")))?;
        let score = txn.epoch_seconds();

        let mut conn = self.conn.clone();
        let _: i64 = conn
            .zadd(&key, member, score)
            .await
            .map_err(map_redis)?;

        // enforce retention on the way in
        let cutoff = Utc::now().timestamp() - RETENTION_SECS;
        let _: i64 = conn
            .zrembyscore(&key, "-inf", cutoff)
            .await
            .map_err(map_redis)?;

        Ok(())
    }

    async fn account_history(&self, account_id: &str, limit: u32) -> Result<Vec<Transaction>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn
            .zrevrange(Self::key(account_id), 0, i64::from(limit) as isize - 1)
            .await
            .map_err(map_redis)?;
        Ok(Self::decode_members(members))
    }

    async fn recent(&self, account_id: &str, minutes: u32, limit: u32) -> Result<Vec<Transaction>> {
        let min_score = Utc::now().timestamp() - i64::from(minutes) * 60;
        let mut conn = self.conn.clone();
        let members: Vec<String> = redis::cmd("ZREVRANGEBYSCORE")
            .arg(Self::key(account_id))
            .arg("+inf")
            .arg(min_score)
            .arg("LIMIT")
            .arg(0)
            .arg(i64::from(limit))
            .query_async(&mut conn)
            .await
            .map_err(map_redis)?;
        Ok(Self::decode_members(members))
    }

    async fn aggregate(
        &self,
        function: AggregateFunction,
        field: Option<FieldRef>,
        account_id: &str,
        window: AggregateWindow,
    ) -> Result<f64> {
        // fetch wide, window locally: the fold path must match pushdown
        let rows = self.account_history(account_id, 1000).await?;
        let windowed = fold::apply_window(rows, window);
        fold::fold(function, field, &windowed)
    }
}

fn map_redis(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

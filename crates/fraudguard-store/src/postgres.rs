//! PostgreSQL history backend
//!
//! The preferred backend: aggregates are pushed down as SQL. The schema
//! keeps the historical `times_tamp` column name; rows are stored once per
//! `transaction_id` and read most recent first.

use crate::error::{Result, StoreError};
use crate::history::{AggregateWindow, TransactionHistory};
use async_trait::async_trait;
use fraudguard_core::{
    AggregateFunction, DeviceUsed, FieldRef, PaymentChannel, Transaction, TransactionType,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;

const QUERY_ATTEMPTS: usize = 3;

const SELECT_COLUMNS: &str = "SELECT transaction_id, sender_account, \
     EXTRACT(EPOCH FROM times_tamp)::bigint AS ts, receiver_account, amount, \
     transaction_type, merchant_category, location, device_used, \
     payment_channel, ip_address, device_hash FROM transactions";

/// History store backed by a PostgreSQL pool.
pub struct PostgresHistory {
    pool: PgPool,
}

impl PostgresHistory {
    /// Connect a pool and verify the server responds.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        tracing::info!("Creating PostgreSQL connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to connect: {e}")))?;

        let store = Self { pool };
        store.ping().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        tracing::info!("PostgreSQL ping successful");
        Ok(())
    }

    /// Create the transactions table and its read index if missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS transactions (\
                 transaction_id TEXT PRIMARY KEY, \
                 sender_account TEXT NOT NULL, \
                 times_tamp TIMESTAMPTZ NOT NULL, \
                 receiver_account TEXT NOT NULL, \
                 amount DOUBLE PRECISION NOT NULL, \
                 transaction_type TEXT NOT NULL, \
                 merchant_category TEXT NOT NULL DEFAULT '', \
                 location TEXT NOT NULL DEFAULT '', \
                 device_used TEXT NOT NULL, \
                 payment_channel TEXT NOT NULL, \
                 ip_address TEXT NOT NULL DEFAULT '', \
                 device_hash TEXT NOT NULL DEFAULT '')",
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_transactions_sender_ts \
             ON transactions (sender_account, times_tamp DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn fetch_rows(&self, sql: &str, account_id: &str, args: &[i64]) -> Result<Vec<PgRow>> {
        with_retry("history query", || {
            let mut query = sqlx::query(sql).bind(account_id);
            for arg in args {
                query = query.bind(arg);
            }
            query.fetch_all(&self.pool)
        })
        .await
    }

    fn decode_rows(rows: Vec<PgRow>) -> Vec<Transaction> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            match decode_row(&row) {
                Ok(txn) => out.push(txn),
                Err(e) => tracing::warn!(error = %e, "skipping unparseable history row"),
            }
        }
        out
    }
}

#[async_trait]
impl TransactionHistory for PostgresHistory {
    async fn save(&self, txn: &Transaction) -> Result<()> {
        tracing::debug!(
            transaction_id = %txn.transaction_id,
            account = %txn.sender_account,
            "saving transaction"
        );

        with_retry("save", || {
            sqlx::query(
                "INSERT INTO transactions \
                 (transaction_id, sender_account, times_tamp, receiver_account, amount, \
                  transaction_type, merchant_category, location, device_used, \
                  payment_channel, ip_address, device_hash) \
                 VALUES ($1, $2, to_timestamp($3), $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                 ON CONFLICT (transaction_id) DO NOTHING",
            )
            .bind(&txn.transaction_id)
            .bind(&txn.sender_account)
            .bind(txn.epoch_seconds())
            .bind(&txn.receiver_account)
            .bind(txn.amount)
            .bind(txn.transaction_type.as_str())
            .bind(&txn.merchant_category)
            .bind(&txn.location)
            .bind(txn.device_used.as_str())
            .bind(txn.payment_channel.as_str())
            .bind(&txn.ip_address)
            .bind(&txn.device_hash)
            .execute(&self.pool)
        })
        .await?;

        Ok(())
    }

    async fn account_history(&self, account_id: &str, limit: u32) -> Result<Vec<Transaction>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE sender_account = $1 ORDER BY times_tamp DESC LIMIT $2"
        );
        let rows = self.fetch_rows(&sql, account_id, &[i64::from(limit)]).await?;
        Ok(Self::decode_rows(rows))
    }

    async fn recent(&self, account_id: &str, minutes: u32, limit: u32) -> Result<Vec<Transaction>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE sender_account = $1 \
             AND times_tamp >= NOW() - INTERVAL '1 minute' * $2 \
             ORDER BY times_tamp DESC LIMIT $3"
        );
        let rows = self
            .fetch_rows(&sql, account_id, &[i64::from(minutes), i64::from(limit)])
            .await?;
        Ok(Self::decode_rows(rows))
    }

    async fn aggregate(
        &self,
        function: AggregateFunction,
        field: Option<FieldRef>,
        account_id: &str,
        window: AggregateWindow,
    ) -> Result<f64> {
        let sql = build_aggregate_sql(function, field, window)?;
        tracing::debug!(sql = %sql, account = %account_id, "aggregate pushdown");

        let mut args: Vec<i64> = Vec::new();
        if let Some(delta) = window.max_delta_time {
            args.push(window.reference_ts);
            args.push(i64::from(delta));
        }
        if let Some(count) = window.max_count {
            args.push(i64::from(count));
        }

        let value = with_retry("aggregate", || {
            let mut query = sqlx::query_scalar::<_, Option<f64>>(&sql).bind(account_id);
            for arg in &args {
                query = query.bind(arg);
            }
            query.fetch_one(&self.pool)
        })
        .await?;

        // NULL means an empty set under SUM/AVG/MIN/MAX
        Ok(value.unwrap_or(0.0))
    }

    fn supports_pushdown(&self) -> bool {
        true
    }
}

/// Build the aggregate query: window the rows in a subselect (delta filter,
/// then most-recent `max_count`), aggregate on the outside.
fn build_aggregate_sql(
    function: AggregateFunction,
    field: Option<FieldRef>,
    window: AggregateWindow,
) -> Result<String> {
    let select = match function {
        AggregateFunction::Count => {
            if field.is_some() {
                return Err(StoreError::InvalidAggregate(
                    "COUNT takes no field operand".to_string(),
                ));
            }
            "COUNT(*)::double precision".to_string()
        }
        AggregateFunction::CountDistinct => {
            let field = field.ok_or_else(|| {
                StoreError::InvalidAggregate("COUNT_DISTINCT requires a field".to_string())
            })?;
            format!("COUNT(DISTINCT {})::double precision", field.column_name())
        }
        AggregateFunction::Sum | AggregateFunction::Avg | AggregateFunction::Min
        | AggregateFunction::Max => {
            match field {
                Some(FieldRef::Amount) => {}
                other => {
                    return Err(StoreError::InvalidAggregate(format!(
                        "{function:?} is only defined over the amount field, got {other:?}"
                    )))
                }
            }
            let name = match function {
                AggregateFunction::Sum => "SUM",
                AggregateFunction::Avg => "AVG",
                AggregateFunction::Min => "MIN",
                AggregateFunction::Max => "MAX",
                _ => unreachable!(),
            };
            format!("{name}(amount)::double precision")
        }
    };

    let mut inner = String::from("SELECT * FROM transactions WHERE sender_account = $1");
    let mut param = 2;
    if window.max_delta_time.is_some() {
        inner.push_str(&format!(
            " AND times_tamp >= to_timestamp(${param} - ${})",
            param + 1
        ));
        param += 2;
    }
    inner.push_str(" ORDER BY times_tamp DESC");
    if window.max_count.is_some() {
        inner.push_str(&format!(" LIMIT ${param}"));
    }

    Ok(format!("SELECT {select} FROM ({inner}) AS windowed"))
}

fn decode_row(row: &PgRow) -> Result<Transaction> {
    let get_text = |name: &str| -> Result<String> {
        row.try_get::<String, _>(name)
            .map_err(|e| StoreError::Parse(format!("{name}: {e}")))
    };

    let transaction_type = {
        let raw = get_text("transaction_type")?;
        TransactionType::parse(&raw)
            .ok_or_else(|| StoreError::Parse(format!("transaction_type: {raw}")))?
    };
    let device_used = {
        let raw = get_text("device_used")?;
        DeviceUsed::parse(&raw).ok_or_else(|| StoreError::Parse(format!("device_used: {raw}")))?
    };
    let payment_channel = {
        let raw = get_text("payment_channel")?;
        PaymentChannel::parse(&raw)
            .ok_or_else(|| StoreError::Parse(format!("payment_channel: {raw}")))?
    };

    Ok(Transaction {
        transaction_id: get_text("transaction_id")?,
        sender_account: get_text("sender_account")?,
        receiver_account: get_text("receiver_account")?,
        amount: row
            .try_get::<f64, _>("amount")
            .map_err(|e| StoreError::Parse(format!("amount: {e}")))?,
        timestamp: row
            .try_get::<i64, _>("ts")
            .map_err(|e| StoreError::Parse(format!("ts: {e}")))?
            .to_string(),
        transaction_type,
        merchant_category: get_text("merchant_category")?,
        location: get_text("location")?,
        device_used,
        payment_channel,
        ip_address: get_text("ip_address")?,
        device_hash: get_text("device_hash")?,
    })
}

async fn with_retry<T, F, Fut>(what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = sqlx::Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < QUERY_ATTEMPTS && is_transient(&e) => {
                tracing::warn!(error = %e, attempt, "{what} failed, retrying");
                tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
            }
            Err(e) => return Err(map_sqlx(e)),
        }
    }
}

fn is_transient(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
    )
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if is_transient(&e) {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Query(e.to_string())
    }
}

//! Rolling statistics over an account's prior transactions

use fraudguard_core::Transaction;

/// One day in seconds, the velocity window.
const VELOCITY_WINDOW_SECS: i64 = 86_400;

/// Derived statistics over the sender's history, all relative to the
/// transaction being scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountStats {
    /// Seconds since the most recent prior transaction, 0 if none.
    pub time_since_last_transaction: f64,
    /// Deviation of log1p(amount) from the account's running mean, in
    /// standard deviations; 0 when the deviation is undefined.
    pub spending_deviation_score: f64,
    /// Count of prior transactions in the last 24 hours.
    pub velocity_score: f64,
    /// 1 minus the fraction of history at the current location, clamped
    /// to [0, 1]; 1.0 for an account with no history.
    pub geo_anomaly_score: f64,
}

impl AccountStats {
    /// Compute over `history`, which must already be restricted to rows
    /// with timestamp < `current_ts`.
    pub fn compute(
        history: &[Transaction],
        current_ts: i64,
        current_amount: f64,
        current_location: &str,
    ) -> Self {
        if history.is_empty() {
            return AccountStats {
                time_since_last_transaction: 0.0,
                spending_deviation_score: 0.0,
                velocity_score: 0.0,
                geo_anomaly_score: 1.0,
            };
        }

        // Welford running mean/variance of log1p(amount)
        let mut n = 0u64;
        let mut mean = 0.0f64;
        let mut m2 = 0.0f64;

        let mut last_before = 0i64;
        let mut in_window = 0u64;
        let mut at_location = 0u64;
        let window_start = current_ts - VELOCITY_WINDOW_SECS;

        for txn in history {
            let ts = txn.epoch_seconds();
            let amount_log = txn.amount.max(0.0).ln_1p();

            n += 1;
            let delta = amount_log - mean;
            mean += delta / n as f64;
            m2 += delta * (amount_log - mean);

            if ts < current_ts && ts > last_before {
                last_before = ts;
            }
            if ts >= window_start && ts < current_ts {
                in_window += 1;
            }
            if txn.location == current_location {
                at_location += 1;
            }
        }

        let time_since_last_transaction = if last_before > 0 {
            (current_ts - last_before) as f64
        } else {
            0.0
        };

        let variance = m2 / n as f64;
        let stddev = if variance > 0.0 { variance.sqrt() } else { 0.0 };
        let current_log = current_amount.max(0.0).ln_1p();
        let spending_deviation_score = if stddev > 1e-12 {
            (current_log - mean) / stddev
        } else {
            0.0
        };

        let geo_anomaly_score =
            (1.0 - at_location as f64 / history.len() as f64).clamp(0.0, 1.0);

        AccountStats {
            time_since_last_transaction,
            spending_deviation_score,
            velocity_score: in_window as f64,
            geo_anomaly_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::{DeviceUsed, PaymentChannel, TransactionType};

    fn txn(id: &str, amount: f64, ts: i64, location: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            sender_account: "A".to_string(),
            receiver_account: "B".to_string(),
            amount,
            timestamp: ts.to_string(),
            transaction_type: TransactionType::Payment,
            merchant_category: "retail".to_string(),
            location: location.to_string(),
            device_used: DeviceUsed::Web,
            payment_channel: PaymentChannel::Card,
            ip_address: "10.0.0.1".to_string(),
            device_hash: "h".to_string(),
        }
    }

    #[test]
    fn test_empty_history_defaults() {
        let stats = AccountStats::compute(&[], 1_000_000, 100.0, "US");
        assert_eq!(stats.time_since_last_transaction, 0.0);
        assert_eq!(stats.spending_deviation_score, 0.0);
        assert_eq!(stats.velocity_score, 0.0);
        assert_eq!(stats.geo_anomaly_score, 1.0);
    }

    #[test]
    fn test_time_since_last_transaction() {
        let now = 1_000_000;
        let history = vec![
            txn("T1", 100.0, now - 500, "US"),
            txn("T2", 100.0, now - 50, "US"),
        ];
        let stats = AccountStats::compute(&history, now, 100.0, "US");
        assert_eq!(stats.time_since_last_transaction, 50.0);
    }

    #[test]
    fn test_velocity_counts_only_last_day() {
        let now = 1_000_000;
        let history = vec![
            txn("T1", 100.0, now - 100, "US"),
            txn("T2", 100.0, now - 86_000, "US"),
            txn("T3", 100.0, now - 90_000, "US"), // outside the window
        ];
        let stats = AccountStats::compute(&history, now, 100.0, "US");
        assert_eq!(stats.velocity_score, 2.0);
    }

    #[test]
    fn test_geo_anomaly_fraction() {
        let now = 1_000_000;
        let history = vec![
            txn("T1", 100.0, now - 10, "US"),
            txn("T2", 100.0, now - 20, "US"),
            txn("T3", 100.0, now - 30, "DE"),
            txn("T4", 100.0, now - 40, "DE"),
        ];
        let stats = AccountStats::compute(&history, now, 100.0, "US");
        assert!((stats.geo_anomaly_score - 0.5).abs() < 1e-9);

        let elsewhere = AccountStats::compute(&history, now, 100.0, "RU");
        assert_eq!(elsewhere.geo_anomaly_score, 1.0);
    }

    #[test]
    fn test_constant_amounts_have_zero_deviation() {
        let now = 1_000_000;
        let history = vec![
            txn("T1", 100.0, now - 10, "US"),
            txn("T2", 100.0, now - 20, "US"),
        ];
        let stats = AccountStats::compute(&history, now, 500.0, "US");
        // stddev of identical amounts is 0, score degrades to 0
        assert_eq!(stats.spending_deviation_score, 0.0);
    }

    #[test]
    fn test_spending_deviation_sign() {
        let now = 1_000_000;
        let history = vec![
            txn("T1", 10.0, now - 10, "US"),
            txn("T2", 1000.0, now - 20, "US"),
        ];
        let high = AccountStats::compute(&history, now, 100_000.0, "US");
        assert!(high.spending_deviation_score > 0.0);

        let low = AccountStats::compute(&history, now, 1.0, "US");
        assert!(low.spending_deviation_score < 0.0);
    }

    #[test]
    fn test_negative_amounts_clamped_before_log() {
        let now = 1_000_000;
        let history = vec![txn("T1", -5.0, now - 10, "US")];
        let stats = AccountStats::compute(&history, now, -1.0, "US");
        assert!(stats.spending_deviation_score.is_finite());
    }
}

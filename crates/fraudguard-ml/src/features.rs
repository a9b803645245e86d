//! Feature-vector assembly
//!
//! The column list loaded with the model fixes the vector layout. Numeric
//! features are set by name; categoricals one-hot into `<prefix>_<value>`
//! with a `<prefix>_nan` fallback when the value's column is absent.

use crate::stats::AccountStats;
use chrono::{DateTime, Datelike, Timelike, Utc};
use fraudguard_core::{DeviceUsed, PaymentChannel, Transaction, TransactionType};
use std::collections::HashMap;

/// Largest magnitude allowed into the model input.
const MAX_FEATURE: f64 = 3.4e37;

/// The ordered feature columns of one model.
#[derive(Debug, Clone)]
pub struct FeatureColumns {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureColumns {
    /// Build from the ordered column names; blank entries were already
    /// skipped by the artifact loader.
    pub fn new(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, index }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// Clamp a feature into the model's representable range: non-finite
/// values become 0, magnitudes above 3.4e37 are clamped.
pub fn safe_float(v: f64) -> f32 {
    if !v.is_finite() {
        return 0.0;
    }
    v.clamp(-MAX_FEATURE, MAX_FEATURE) as f32
}

/// Assemble the model input for one transaction.
pub fn build_feature_vector(
    columns: &FeatureColumns,
    txn: &Transaction,
    stats: &AccountStats,
) -> Vec<f32> {
    let mut vec = vec![0.0f32; columns.len()];

    let mut set = |name: &str, value: f64| {
        if let Some(i) = columns.position(name) {
            vec[i] = safe_float(value);
        }
    };

    set("amount", txn.amount.max(0.0).ln_1p());
    set(
        "time_since_last_transaction",
        stats.time_since_last_transaction,
    );
    set("spending_deviation_score", stats.spending_deviation_score);
    set("velocity_score", stats.velocity_score);
    set("geo_anomaly_score", stats.geo_anomaly_score);

    let (hour, day_of_week) = calendar_features(txn.epoch_seconds());
    set("hour_of_day", f64::from(hour));
    set("day_of_week", f64::from(day_of_week));

    let mut set_categorical = |prefix: &str, value: &str| {
        let name = if value.is_empty() {
            format!("{prefix}nan")
        } else {
            format!("{prefix}{value}")
        };
        if let Some(i) = columns.position(&name) {
            vec[i] = 1.0;
        } else if let Some(i) = columns.position(&format!("{prefix}nan")) {
            vec[i] = 1.0;
        }
    };

    set_categorical("transaction_type_", transaction_type_feature(txn.transaction_type));
    set_categorical("merchant_category_", &txn.merchant_category);
    set_categorical("location_", &txn.location);
    set_categorical("device_used_", device_feature(txn.device_used));
    set_categorical("payment_channel_", channel_feature(txn.payment_channel));

    vec
}

/// hour of day in [0, 23] and day of week with Monday = 0, both UTC.
pub fn calendar_features(epoch_seconds: i64) -> (u32, u32) {
    let dt: DateTime<Utc> =
        DateTime::from_timestamp(epoch_seconds, 0).unwrap_or(DateTime::UNIX_EPOCH);
    (dt.hour(), dt.weekday().num_days_from_monday())
}

fn transaction_type_feature(ty: TransactionType) -> &'static str {
    match ty {
        TransactionType::Deposit => "deposit",
        TransactionType::Payment => "payment",
        TransactionType::Transfer => "transfer",
        TransactionType::Withdrawal => "withdrawal",
    }
}

fn device_feature(device: DeviceUsed) -> &'static str {
    match device {
        DeviceUsed::Atm => "atm",
        DeviceUsed::Mobile => "mobile",
        DeviceUsed::Pos => "pos",
        DeviceUsed::Web => "web",
    }
}

// Channel spellings follow the training data: rails keep their acronyms,
// the rest are snake_case.
fn channel_feature(channel: PaymentChannel) -> &'static str {
    match channel {
        PaymentChannel::Ach => "ACH",
        PaymentChannel::Upi => "UPI",
        PaymentChannel::Card => "card",
        PaymentChannel::WireTransfer => "wire_transfer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn() -> Transaction {
        Transaction {
            transaction_id: "T1".to_string(),
            sender_account: "A".to_string(),
            receiver_account: "B".to_string(),
            amount: 600.0,
            // 2023-11-14T22:13:20 UTC, a Tuesday
            timestamp: "1700000000".to_string(),
            transaction_type: TransactionType::Transfer,
            merchant_category: "electronics".to_string(),
            location: "US".to_string(),
            device_used: DeviceUsed::Mobile,
            payment_channel: PaymentChannel::WireTransfer,
            ip_address: "10.0.0.1".to_string(),
            device_hash: "h".to_string(),
        }
    }

    fn stats() -> AccountStats {
        AccountStats {
            time_since_last_transaction: 120.0,
            spending_deviation_score: 1.5,
            velocity_score: 3.0,
            geo_anomaly_score: 0.25,
        }
    }

    fn columns(names: &[&str]) -> FeatureColumns {
        FeatureColumns::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_numeric_features_by_name() {
        let cols = columns(&[
            "amount",
            "velocity_score",
            "geo_anomaly_score",
            "hour_of_day",
            "day_of_week",
        ]);
        let vec = build_feature_vector(&cols, &txn(), &stats());

        assert!((f64::from(vec[0]) - 601.0f64.ln()).abs() < 1e-4);
        assert_eq!(vec[1], 3.0);
        assert_eq!(vec[2], 0.25);
        assert_eq!(vec[3], 22.0); // 22:13 UTC
        assert_eq!(vec[4], 1.0); // Tuesday, Monday = 0
    }

    #[test]
    fn test_one_hot_exact_column() {
        let cols = columns(&[
            "transaction_type_transfer",
            "transaction_type_payment",
            "payment_channel_wire_transfer",
        ]);
        let vec = build_feature_vector(&cols, &txn(), &stats());
        assert_eq!(vec, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_one_hot_falls_back_to_nan_column() {
        // no location_US column, but a location_nan fallback
        let cols = columns(&["location_nan", "location_DE"]);
        let vec = build_feature_vector(&cols, &txn(), &stats());
        assert_eq!(vec, vec![1.0, 0.0]);
    }

    #[test]
    fn test_one_hot_empty_value_maps_to_nan() {
        let cols = columns(&["merchant_category_nan"]);
        let mut transaction = txn();
        transaction.merchant_category = String::new();
        let vec = build_feature_vector(&cols, &transaction, &stats());
        assert_eq!(vec, vec![1.0]);
    }

    #[test]
    fn test_one_hot_silently_skips_unknown_without_nan() {
        let cols = columns(&["device_used_atm"]);
        let vec = build_feature_vector(&cols, &txn(), &stats());
        assert_eq!(vec, vec![0.0]);
    }

    #[test]
    fn test_safe_float_clamps() {
        assert_eq!(safe_float(f64::NAN), 0.0);
        assert_eq!(safe_float(f64::INFINITY), 0.0);
        assert_eq!(safe_float(f64::NEG_INFINITY), 0.0);
        assert_eq!(safe_float(1e40), 3.4e37f64 as f32);
        assert_eq!(safe_float(-1e40), -3.4e37f64 as f32);
        assert_eq!(safe_float(1.5), 1.5);
    }

    #[test]
    fn test_calendar_monday_is_zero() {
        // 2024-01-01 was a Monday; midnight UTC
        let (hour, dow) = calendar_features(1_704_067_200);
        assert_eq!(hour, 0);
        assert_eq!(dow, 0);
    }
}

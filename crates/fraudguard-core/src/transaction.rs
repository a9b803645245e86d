//! The immutable transaction record flowing through the pipeline

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How a transaction moves money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Withdrawal,
    Deposit,
    Transfer,
    Payment,
}

impl TransactionType {
    /// Wire discriminant; also what enum-typed fields evaluate to.
    pub fn discriminant(self) -> i32 {
        match self {
            TransactionType::Withdrawal => 0,
            TransactionType::Deposit => 1,
            TransactionType::Transfer => 2,
            TransactionType::Payment => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::Payment => "PAYMENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WITHDRAWAL" => Some(TransactionType::Withdrawal),
            "DEPOSIT" => Some(TransactionType::Deposit),
            "TRANSFER" => Some(TransactionType::Transfer),
            "PAYMENT" => Some(TransactionType::Payment),
            _ => None,
        }
    }
}

/// Device class the transaction originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceUsed {
    Atm,
    Mobile,
    Pos,
    Web,
}

impl DeviceUsed {
    pub fn discriminant(self) -> i32 {
        match self {
            DeviceUsed::Atm => 0,
            DeviceUsed::Mobile => 1,
            DeviceUsed::Pos => 2,
            DeviceUsed::Web => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceUsed::Atm => "ATM",
            DeviceUsed::Mobile => "MOBILE",
            DeviceUsed::Pos => "POS",
            DeviceUsed::Web => "WEB",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ATM" => Some(DeviceUsed::Atm),
            "MOBILE" => Some(DeviceUsed::Mobile),
            "POS" => Some(DeviceUsed::Pos),
            "WEB" => Some(DeviceUsed::Web),
            _ => None,
        }
    }
}

/// Payment rail the transaction used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentChannel {
    Ach,
    Upi,
    Card,
    WireTransfer,
}

impl PaymentChannel {
    pub fn discriminant(self) -> i32 {
        match self {
            PaymentChannel::Ach => 0,
            PaymentChannel::Upi => 1,
            PaymentChannel::Card => 2,
            PaymentChannel::WireTransfer => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentChannel::Ach => "ACH",
            PaymentChannel::Upi => "UPI",
            PaymentChannel::Card => "CARD",
            PaymentChannel::WireTransfer => "WIRE_TRANSFER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACH" => Some(PaymentChannel::Ach),
            "UPI" => Some(PaymentChannel::Upi),
            "CARD" => Some(PaymentChannel::Card),
            "WIRE_TRANSFER" => Some(PaymentChannel::WireTransfer),
            _ => None,
        }
    }
}

/// A single financial transaction.
///
/// `timestamp` is carried as a string: either ISO-8601 UTC or integer
/// seconds-since-epoch, depending on the upstream producer. Use
/// [`Transaction::epoch_seconds`] for the parsed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub sender_account: String,
    pub receiver_account: String,
    pub amount: f64,
    pub timestamp: String,
    pub transaction_type: TransactionType,
    pub merchant_category: String,
    pub location: String,
    pub device_used: DeviceUsed,
    pub payment_channel: PaymentChannel,
    pub ip_address: String,
    pub device_hash: String,
}

impl Transaction {
    /// Parse the timestamp to epoch seconds.
    ///
    /// A string containing `'T'` is treated as ISO-8601 UTC with any
    /// fractional part discarded; otherwise as signed decimal epoch seconds,
    /// falling back to ISO on failure. Unparseable timestamps yield 0.
    pub fn epoch_seconds(&self) -> i64 {
        let t = self.timestamp.trim();
        if t.is_empty() {
            return 0;
        }

        if t.contains('T') {
            return parse_iso_utc(t).unwrap_or_else(|| {
                tracing::debug!(timestamp = %t, "failed to parse ISO timestamp, using 0");
                0
            });
        }

        if let Ok(secs) = t.parse::<i64>() {
            return secs;
        }

        parse_iso_utc(t).unwrap_or_else(|| {
            tracing::debug!(timestamp = %t, "failed to parse timestamp, using 0");
            0
        })
    }
}

fn parse_iso_utc(s: &str) -> Option<i64> {
    // Fractional seconds and a trailing Z are discarded before parsing.
    let core = s.split('.').next().unwrap_or(s);
    let core = core.strip_suffix('Z').unwrap_or(core);
    NaiveDateTime::parse_from_str(core, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

//! Messages exchanged over the request and result topics

use crate::rule::RuleConfig;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// One unit of work: evaluate one rule of one profile against one
/// transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRequest {
    pub profile_uuid: String,
    pub profile_name: String,
    pub rule: RuleConfig,
    pub transaction: Transaction,
    /// 0-based index of the rule within its profile.
    pub number: u32,
    pub total_rule_count: u32,
}

impl RuleRequest {
    /// Messaging key on the request topic.
    pub fn messaging_key(&self) -> String {
        format!("{}{}", self.transaction.transaction_id, self.profile_uuid)
    }
}

/// Outcome class of a rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    NotFraud,
    Fraud,
    Critical,
    Error,
}

impl RuleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleStatus::NotFraud => "NOT_FRAUD",
            RuleStatus::Fraud => "FRAUD",
            RuleStatus::Critical => "CRITICAL",
            RuleStatus::Error => "ERROR",
        }
    }
}

/// The published result of one rule evaluation, keyed downstream by
/// `transaction_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub profile_uuid: String,
    pub profile_name: String,
    pub config_uuid: String,
    pub config_name: String,
    pub transaction_id: String,
    pub status: RuleStatus,
    pub description: String,
}

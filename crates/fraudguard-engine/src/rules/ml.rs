//! ML rule: model probability against a configured lower bound

use super::Evaluation;
use crate::error::Result;
use async_trait::async_trait;
use fraudguard_core::Transaction;
use fraudguard_ml::FraudScorer;
use fraudguard_store::TransactionHistory;
use std::sync::Arc;

/// The scoring seam the ML rule consumes; [`FraudScorer`] is the real
/// implementation.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn predict(
        &self,
        model_uuid: &str,
        txn: &Transaction,
        history: &dyn TransactionHistory,
    ) -> fraudguard_ml::Result<f64>;
}

#[async_trait]
impl Scorer for FraudScorer {
    async fn predict(
        &self,
        model_uuid: &str,
        txn: &Transaction,
        history: &dyn TransactionHistory,
    ) -> fraudguard_ml::Result<f64> {
        FraudScorer::predict(self, model_uuid, txn, history).await
    }
}

pub struct MlRule {
    model_uuid: String,
    lower_bound: f64,
    scorer: Arc<dyn Scorer>,
    history: Arc<dyn TransactionHistory>,
}

impl MlRule {
    pub fn new(
        model_uuid: String,
        lower_bound: f64,
        scorer: Arc<dyn Scorer>,
        history: Arc<dyn TransactionHistory>,
    ) -> Self {
        Self {
            model_uuid,
            lower_bound,
            scorer,
            history,
        }
    }

    pub async fn evaluate(&self, txn: &Transaction) -> Result<Evaluation> {
        let probability = self
            .scorer
            .predict(&self.model_uuid, txn, self.history.as_ref())
            .await?;

        Ok(Evaluation {
            is_fraud: probability >= self.lower_bound,
            description: format!(
                "ML Fraud Probability: {probability:.4} (threshold: {:.3})",
                self.lower_bound
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::{DeviceUsed, PaymentChannel, TransactionType};
    use fraudguard_store::MemoryHistory;

    pub(crate) struct FixedScorer(pub f64);

    #[async_trait]
    impl Scorer for FixedScorer {
        async fn predict(
            &self,
            _model_uuid: &str,
            _txn: &Transaction,
            _history: &dyn TransactionHistory,
        ) -> fraudguard_ml::Result<f64> {
            Ok(self.0)
        }
    }

    fn txn() -> Transaction {
        Transaction {
            transaction_id: "T1".to_string(),
            sender_account: "A".to_string(),
            receiver_account: "B".to_string(),
            amount: 600.0,
            timestamp: "1700000000".to_string(),
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
    async fn test_probability_at_bound_fires() {
        let rule = MlRule::new(
            "m-1".to_string(),
            0.5,
            Arc::new(FixedScorer(0.5)),
            Arc::new(MemoryHistory::new()),
        );
        let evaluation = rule.evaluate(&txn()).await.unwrap();
        assert!(evaluation.is_fraud);
        assert_eq!(
            evaluation.description,
            "ML Fraud Probability: 0.5000 (threshold: 0.500)"
        );
    }

    #[tokio::test]
    async fn test_probability_below_bound_does_not_fire() {
        let rule = MlRule::new(
            "m-1".to_string(),
            0.5,
            Arc::new(FixedScorer(0.32)),
            Arc::new(MemoryHistory::new()),
        );
        let evaluation = rule.evaluate(&txn()).await.unwrap();
        assert!(!evaluation.is_fraud);
        assert!(evaluation.description.contains("0.3200"));
    }
}

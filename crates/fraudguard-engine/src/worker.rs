//! Rule worker: turn one rule-request message into one published result

use crate::codec::RequestCodec;
use crate::error::EngineError;
use crate::factory::RuleFactory;
use crate::producer::ResultProducer;
use fraudguard_core::{RuleRequest, RuleResult, RuleStatus};
use fraudguard_store::TransactionHistory;
use std::sync::Arc;
use std::time::Duration;

const SAVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Consumes rule requests, applies the rule, classifies the outcome and
/// publishes a result. One call handles one message end-to-end; the
/// caller commits the offset after [`process`](RuleWorker::process)
/// returns.
pub struct RuleWorker {
    codec: Arc<dyn RequestCodec>,
    factory: RuleFactory,
    history: Option<Arc<dyn TransactionHistory>>,
    producer: ResultProducer,
}

impl RuleWorker {
    pub fn new(
        codec: Arc<dyn RequestCodec>,
        factory: RuleFactory,
        history: Option<Arc<dyn TransactionHistory>>,
        producer: ResultProducer,
    ) -> Self {
        Self {
            codec,
            factory,
            history,
            producer,
        }
    }

    /// Handle one message and publish its result.
    pub async fn process(&self, payload: &[u8]) {
        let result = self.evaluate(payload).await;
        self.producer.send(&result).await;
    }

    /// Compute the result for one message without publishing.
    pub async fn evaluate(&self, payload: &[u8]) -> RuleResult {
        let request = match self.codec.decode(payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "failed to parse rule request");
                return RuleResult {
                    profile_uuid: String::new(),
                    profile_name: String::new(),
                    config_uuid: String::new(),
                    config_name: "Failed to parse request".to_string(),
                    transaction_id: String::new(),
                    status: RuleStatus::Error,
                    description: "Failed to parse RuleRequest from Kafka message".to_string(),
                };
            }
        };

        tracing::info!(
            rule_uuid = %request.rule.uuid,
            transaction_id = %request.transaction.transaction_id,
            "processing rule"
        );

        self.save_transaction(&request).await;

        let mut result = RuleResult {
            profile_uuid: request.profile_uuid.clone(),
            profile_name: request.profile_name.clone(),
            config_uuid: request.rule.uuid.clone(),
            config_name: request.rule.name.clone(),
            transaction_id: request.transaction.transaction_id.clone(),
            status: RuleStatus::NotFraud,
            description: String::new(),
        };

        match self.apply_rule(&request).await {
            Ok(evaluation) => {
                result.description = evaluation.description;
                result.status = classify(evaluation.is_fraud, request.rule.is_critical);
                match result.status {
                    RuleStatus::Critical => tracing::error!(
                        transaction_id = %result.transaction_id,
                        rule_uuid = %request.rule.uuid,
                        "CRITICAL FRAUD detected"
                    ),
                    RuleStatus::Fraud => tracing::warn!(
                        transaction_id = %result.transaction_id,
                        rule_uuid = %request.rule.uuid,
                        "FRAUD detected"
                    ),
                    _ => tracing::info!(
                        transaction_id = %result.transaction_id,
                        rule_uuid = %request.rule.uuid,
                        "transaction is not fraud"
                    ),
                }
            }
            Err(e) => {
                tracing::error!(
                    rule_uuid = %request.rule.uuid,
                    error = %e,
                    retryable = e.is_retryable(),
                    "error evaluating rule"
                );
                result.status = RuleStatus::Error;
                result.description = format!("Error: {e}");
            }
        }

        result
    }

    /// Persist the request's transaction into history. Best-effort: a
    /// storage failure is logged and the evaluation proceeds.
    async fn save_transaction(&self, request: &RuleRequest) {
        let Some(history) = &self.history else {
            return;
        };
        match tokio::time::timeout(SAVE_TIMEOUT, history.save(&request.transaction)).await {
            Ok(Ok(())) => tracing::debug!(
                transaction_id = %request.transaction.transaction_id,
                "saved transaction to history"
            ),
            Ok(Err(e)) => tracing::error!(
                transaction_id = %request.transaction.transaction_id,
                error = %e,
                "failed to save transaction to history"
            ),
            Err(_) => tracing::error!(
                transaction_id = %request.transaction.transaction_id,
                "timed out saving transaction to history"
            ),
        }
    }

    async fn apply_rule(
        &self,
        request: &RuleRequest,
    ) -> Result<crate::rules::Evaluation, EngineError> {
        let rule = self.factory.build(&request.rule)?;
        rule.evaluate(&request.transaction).await
    }
}

fn classify(is_fraud: bool, is_critical: bool) -> RuleStatus {
    match (is_fraud, is_critical) {
        (true, true) => RuleStatus::Critical,
        (true, false) => RuleStatus::Fraud,
        (false, _) => RuleStatus::NotFraud,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(classify(true, true), RuleStatus::Critical);
        assert_eq!(classify(true, false), RuleStatus::Fraud);
        assert_eq!(classify(false, true), RuleStatus::NotFraud);
        assert_eq!(classify(false, false), RuleStatus::NotFraud);
    }
}

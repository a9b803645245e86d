//! Per-profile rule-request production

use fraudguard_core::{Profile, RuleRequest, Transaction};
use fraudguard_engine::{MessagePublisher, PublishError};
use fraudguard_proto::wire::encode_rule_request;

/// Outcome of the last send in a profile's batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Success,
    /// The broker may accept the message on redelivery; the batch went on.
    Retryable,
    /// The broker rejected the message; the batch stopped.
    NonRetryable,
    /// The request could not be serialized; the batch stopped.
    Serialization,
}

/// Publish one rule request per rule of `profile` for `transaction`,
/// keyed by `transaction_id ++ profile_uuid`.
///
/// Retryable publish failures are counted and the batch proceeds to the
/// next pair; serialization and non-retryable failures stop the batch.
/// Returns how many pairs were published and the last status.
pub async fn produce_rule_requests(
    publisher: &dyn MessagePublisher,
    topic: &str,
    profile: &Profile,
    transaction: &Transaction,
) -> (usize, SendStatus) {
    let key = format!("{}{}", transaction.transaction_id, profile.uuid);
    let total_rule_count = profile.rules.len() as u32;

    let mut published = 0;
    let mut last_status = SendStatus::Success;

    for (number, rule) in profile.rules.iter().enumerate() {
        let request = RuleRequest {
            profile_uuid: profile.uuid.clone(),
            profile_name: profile.name.clone(),
            rule: rule.clone(),
            transaction: transaction.clone(),
            number: number as u32,
            total_rule_count,
        };

        let payload = encode_rule_request(&request);
        if payload.is_empty() {
            tracing::error!(
                profile_uuid = %profile.uuid,
                rule_uuid = %rule.uuid,
                "serialized rule request is empty, stopping batch"
            );
            return (published, SendStatus::Serialization);
        }

        match publisher.publish(topic, &key, payload).await {
            Ok(()) => {
                published += 1;
                last_status = SendStatus::Success;
            }
            Err(PublishError::Retryable(message)) => {
                tracing::warn!(
                    profile_uuid = %profile.uuid,
                    rule_uuid = %rule.uuid,
                    error = %message,
                    "retryable publish failure, continuing batch"
                );
                last_status = SendStatus::Retryable;
            }
            Err(PublishError::NonRetryable(message)) => {
                tracing::error!(
                    profile_uuid = %profile.uuid,
                    rule_uuid = %rule.uuid,
                    error = %message,
                    "publish failure, stopping batch"
                );
                return (published, SendStatus::NonRetryable);
            }
        }
    }

    (published, last_status)
}

//! Result producer: serialize and publish rule results

use crate::broker::MessagePublisher;
use crate::codec::ResultCodec;
use fraudguard_core::RuleResult;
use std::sync::Arc;

/// Publishes results keyed by `transaction_id`. Failures are logged, not
/// propagated: the request's offset commits after the attempt either way,
/// and a redelivery recomputes and republishes.
pub struct ResultProducer {
    publisher: Arc<dyn MessagePublisher>,
    codec: Arc<dyn ResultCodec>,
    topic: String,
    reporter_topic: Option<String>,
}

impl ResultProducer {
    pub fn new(
        publisher: Arc<dyn MessagePublisher>,
        codec: Arc<dyn ResultCodec>,
        topic: String,
    ) -> Self {
        Self {
            publisher,
            codec,
            topic,
            reporter_topic: None,
        }
    }

    /// Mirror every result onto a second topic for the reporter.
    pub fn with_reporter_topic(mut self, topic: Option<String>) -> Self {
        self.reporter_topic = topic;
        self
    }

    pub async fn send(&self, result: &RuleResult) {
        let payload = match self.codec.encode(result) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize rule result");
                return;
            }
        };

        self.publish(&self.topic, result, payload.clone()).await;
        if let Some(reporter) = &self.reporter_topic {
            self.publish(reporter, result, payload).await;
        }
    }

    async fn publish(&self, topic: &str, result: &RuleResult, payload: Vec<u8>) {
        match self
            .publisher
            .publish(topic, &result.transaction_id, payload)
            .await
        {
            Ok(()) => tracing::info!(
                topic,
                transaction_id = %result.transaction_id,
                "sent rule result"
            ),
            Err(e) => tracing::error!(
                topic,
                transaction_id = %result.transaction_id,
                error = %e,
                "failed to send rule result"
            ),
        }
    }
}

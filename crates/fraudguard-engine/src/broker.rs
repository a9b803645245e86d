//! Broker client seam
//!
//! The pipeline talks to its message broker through these traits; the
//! concrete client library stays outside the core. `MockBroker` records
//! publishes for tests, the `kafka` feature supplies an rdkafka-backed
//! pair for deployments.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

/// Publish failure, classified the way the broker client reports it.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    /// The broker may accept the message later (queue full, timeout).
    #[error("retryable publish failure: {0}")]
    Retryable(String),

    /// The message will never be accepted as-is.
    #[error("publish failure: {0}")]
    NonRetryable(String),
}

impl PublishError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PublishError::Retryable(_))
    }
}

/// Consume-side failure; fatal for the worker, the supervisor restarts it.
#[derive(Error, Debug)]
#[error("broker unavailable: {0}")]
pub struct BrokerUnavailable(pub String);

/// A message taken off the request topic.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}

/// Keyed publish onto a topic.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>)
        -> Result<(), PublishError>;
}

/// Polling consumer with explicit offset commits.
#[async_trait]
pub trait MessageConsumer: Send {
    /// Next message, or `None` once the subscription is closed.
    async fn next(&mut self) -> Result<Option<InboundMessage>, BrokerUnavailable>;

    /// Commit the message's offset; called only after the result publish
    /// attempt returned (at-least-once).
    async fn commit(&mut self, message: &InboundMessage) -> Result<(), BrokerUnavailable>;
}

/// Recorded publish for test assertions.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

/// In-memory broker double: records every publish and can be primed to
/// fail.
#[derive(Default)]
pub struct MockBroker {
    published: Mutex<Vec<PublishedMessage>>,
    failures: Mutex<VecDeque<PublishError>>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for the next publish call.
    pub fn fail_next(&self, error: PublishError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    pub fn message_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl MessagePublisher for MockBroker {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: Vec<u8>,
    ) -> Result<(), PublishError> {
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            payload,
        });
        Ok(())
    }
}

#[cfg(feature = "kafka")]
pub mod kafka {
    //! rdkafka-backed broker clients

    use super::{BrokerUnavailable, InboundMessage, MessageConsumer, MessagePublisher, PublishError};
    use async_trait::async_trait;
    use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
    use rdkafka::error::KafkaError;
    use rdkafka::message::Message;
    use rdkafka::producer::{FutureProducer, FutureRecord};
    use rdkafka::types::RDKafkaErrorCode;
    use rdkafka::{ClientConfig, Offset, TopicPartitionList};
    use std::time::Duration;

    /// Producer wrapper that classifies failures for the dispatch path.
    pub struct KafkaPublisher {
        producer: FutureProducer,
        send_timeout: Duration,
    }

    impl KafkaPublisher {
        pub fn new(bootstrap_servers: &str) -> Result<Self, KafkaError> {
            let producer = ClientConfig::new()
                .set("bootstrap.servers", bootstrap_servers)
                .set("message.timeout.ms", "5000")
                .create()?;
            Ok(Self {
                producer,
                send_timeout: Duration::from_secs(5),
            })
        }
    }

    #[async_trait]
    impl MessagePublisher for KafkaPublisher {
        async fn publish(
            &self,
            topic: &str,
            key: &str,
            payload: Vec<u8>,
        ) -> Result<(), PublishError> {
            let record = FutureRecord::to(topic).key(key).payload(&payload);
            match self.producer.send(record, self.send_timeout).await {
                Ok(_) => Ok(()),
                Err((e, _)) => Err(classify(e)),
            }
        }
    }

    fn classify(e: KafkaError) -> PublishError {
        match e.rdkafka_error_code() {
            Some(
                RDKafkaErrorCode::QueueFull
                | RDKafkaErrorCode::MessageTimedOut
                | RDKafkaErrorCode::BrokerTransportFailure
                | RDKafkaErrorCode::AllBrokersDown,
            ) => PublishError::Retryable(e.to_string()),
            _ => PublishError::NonRetryable(e.to_string()),
        }
    }

    /// Consumer wrapper with manual offset commits.
    pub struct KafkaConsumer {
        inner: StreamConsumer,
    }

    impl KafkaConsumer {
        pub fn new(
            bootstrap_servers: &str,
            group_id: &str,
            topic: &str,
        ) -> Result<Self, KafkaError> {
            let inner: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", bootstrap_servers)
                .set("group.id", group_id)
                .set("enable.auto.commit", "false")
                .set("auto.offset.reset", "earliest")
                .create()?;
            inner.subscribe(&[topic])?;
            Ok(Self { inner })
        }
    }

    #[async_trait]
    impl MessageConsumer for KafkaConsumer {
        async fn next(&mut self) -> Result<Option<InboundMessage>, BrokerUnavailable> {
            match self.inner.recv().await {
                Ok(message) => Ok(Some(InboundMessage {
                    topic: message.topic().to_string(),
                    partition: message.partition(),
                    offset: message.offset(),
                    payload: message.payload().unwrap_or_default().to_vec(),
                })),
                Err(e) => Err(BrokerUnavailable(e.to_string())),
            }
        }

        async fn commit(&mut self, message: &InboundMessage) -> Result<(), BrokerUnavailable> {
            let mut offsets = TopicPartitionList::new();
            offsets
                .add_partition_offset(
                    &message.topic,
                    message.partition,
                    Offset::Offset(message.offset + 1),
                )
                .map_err(|e| BrokerUnavailable(e.to_string()))?;
            self.inner
                .commit(&offsets, CommitMode::Async)
                .map_err(|e| BrokerUnavailable(e.to_string()))
        }
    }
}

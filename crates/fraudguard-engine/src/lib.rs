//! FraudGuard Engine - rule evaluation and the rule worker
//!
//! The four rule kinds share the core expression evaluator; the factory
//! builds the right kind from a rule configuration and validates its
//! prerequisites. The worker consumes rule requests, applies the rule,
//! classifies the outcome and hands the result to the producer.

pub mod aggregate;
pub mod broker;
pub mod codec;
pub mod error;
pub mod factory;
pub mod producer;
pub mod rules;
pub mod worker;

pub use aggregate::HistoryAggregateContext;
pub use broker::{
    BrokerUnavailable, InboundMessage, MessageConsumer, MessagePublisher, MockBroker, PublishError,
};
pub use codec::{JsonRequestCodec, JsonResultCodec, RequestCodec, ResultCodec};
pub use error::{EngineError, Result};
pub use factory::RuleFactory;
pub use producer::ResultProducer;
pub use rules::{Evaluation, Rule, Scorer};
pub use worker::RuleWorker;

#[cfg(feature = "kafka")]
pub use broker::kafka::{KafkaConsumer, KafkaPublisher};

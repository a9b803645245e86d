//! FraudGuard Director - dispatch and fan-out
//!
//! Receives live profile snapshots and transactions over gRPC, cross-joins
//! them and publishes one rule request per (profile, rule, transaction)
//! onto the request topic.

pub mod config;
pub mod director;
pub mod dispatch;
pub mod grpc;

pub use config::DirectorConfig;
pub use director::{Director, DispatchSummary};
pub use dispatch::{produce_rule_requests, SendStatus};

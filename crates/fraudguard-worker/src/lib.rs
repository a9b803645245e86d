//! FraudGuard Worker - the rule evaluation service
//!
//! Wires the history store, ML scorer, factory and result producer into a
//! consume loop with at-least-once offset discipline.

pub mod codecs;
pub mod config;
pub mod run;

pub use codecs::{ProtoRequestCodec, ProtoResultCodec};
pub use config::{HistoryBackend, ResultFormat, WorkerConfig};
pub use run::run_consume_loop;

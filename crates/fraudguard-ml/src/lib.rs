//! FraudGuard ML - gradient-boosted fraud scoring
//!
//! A model artifact set is located by UUID under a configured directory:
//! an ordered feature-column list, a required primary booster (XGBoost
//! JSON) and an optional secondary booster (LightGBM, behind the
//! `lightgbm` feature). The scorer assembles a feature vector from the
//! transaction plus rolling statistics over the sender's history and
//! returns the primary booster's probability.

pub mod artifacts;
pub mod error;
pub mod features;
pub mod scorer;
pub mod stats;

pub use artifacts::ModelArtifacts;
pub use error::{MlError, Result};
pub use scorer::FraudScorer;
pub use stats::AccountStats;

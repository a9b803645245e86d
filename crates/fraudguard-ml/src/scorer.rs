//! The fraud scorer and its model cache

use crate::artifacts::ModelArtifacts;
use crate::error::{MlError, Result};
use crate::features::build_feature_vector;
use crate::stats::AccountStats;
use fraudguard_core::Transaction;
use fraudguard_store::TransactionHistory;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::OnceCell;

/// How many history rows feed the rolling statistics.
const HISTORY_FETCH_LIMIT: u32 = 1000;

const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

type ModelCell = Arc<OnceCell<Arc<ModelArtifacts>>>;

/// Stateless per request; caches loaded artifacts per model UUID.
///
/// Loads are single-writer per UUID: the per-model cell makes a second
/// loader of the same model await the first, while predictions against
/// already-loaded models never wait behind a load.
pub struct FraudScorer {
    config_dir: PathBuf,
    load_timeout: Duration,
    cache: RwLock<HashMap<String, ModelCell>>,
}

impl FraudScorer {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Fetch the model for `uuid`, loading it on first use.
    pub async fn model(&self, uuid: &str) -> Result<Arc<ModelArtifacts>> {
        let cell = {
            let mut cache = self.cache.write().expect("model cache poisoned");
            cache.entry(uuid.to_string()).or_default().clone()
        };

        let loaded = tokio::time::timeout(
            self.load_timeout,
            cell.get_or_try_init(|| {
                let dir = self.config_dir.clone();
                let uuid = uuid.to_string();
                async move {
                    tokio::task::spawn_blocking(move || {
                        ModelArtifacts::load(&dir, &uuid).map(Arc::new)
                    })
                    .await
                    .map_err(|e| MlError::Artifact(format!("model load task failed: {e}")))?
                }
            }),
        )
        .await
        .map_err(|_| MlError::Timeout(format!("loading model {uuid}")))??;

        Ok(loaded.clone())
    }

    /// Whether `uuid` is already loaded.
    pub fn is_loaded(&self, uuid: &str) -> bool {
        self.cache
            .read()
            .expect("model cache poisoned")
            .get(uuid)
            .is_some_and(|cell| cell.initialized())
    }

    /// Score a transaction: probability of fraud in [0, 1].
    pub async fn predict(
        &self,
        model_uuid: &str,
        txn: &Transaction,
        history: &dyn TransactionHistory,
    ) -> Result<f64> {
        let model = self.model(model_uuid).await?;

        let current_ts = txn.epoch_seconds();
        let rows = history
            .account_history(&txn.sender_account, HISTORY_FETCH_LIMIT)
            .await?;
        let prior: Vec<Transaction> = rows
            .into_iter()
            .filter(|t| t.epoch_seconds() < current_ts)
            .collect();
        if prior.is_empty() {
            tracing::debug!(account = %txn.sender_account, "no prior history for account");
        }

        let stats = AccountStats::compute(&prior, current_ts, txn.amount, &txn.location);

        #[cfg(feature = "lightgbm")]
        if let Some(stage1) = model.predict_secondary(secondary_features(txn, &stats)) {
            tracing::debug!(model_uuid, stage1, "secondary booster score");
        }

        let features = build_feature_vector(&model.columns, txn, &stats);
        let probability = model.predict(features)?;

        tracing::info!(
            transaction_id = %txn.transaction_id,
            model_uuid,
            probability,
            "fraud probability"
        );
        Ok(probability)
    }
}

/// The secondary booster scores a fixed 12-slot layout: the five numeric
/// features, five reserved zeros, then the calendar pair.
#[cfg(feature = "lightgbm")]
fn secondary_features(txn: &Transaction, stats: &AccountStats) -> Vec<f64> {
    use crate::features::calendar_features;

    let mut features = vec![
        txn.amount.max(0.0).ln_1p(),
        stats.time_since_last_transaction,
        stats.spending_deviation_score,
        stats.velocity_score,
        stats.geo_anomaly_score,
    ];
    features.extend(std::iter::repeat(0.0).take(5));

    let (hour, day_of_week) = calendar_features(txn.epoch_seconds());
    features.push(f64::from(hour));
    features.push(f64::from(day_of_week));
    features
}

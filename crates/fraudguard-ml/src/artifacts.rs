//! Model artifact loading
//!
//! Artifacts live under one directory, named by model UUID:
//! `{uuid}_columns.txt` (ordered feature names), `{uuid}_json.json`
//! (required primary booster, XGBoost JSON) and `{uuid}_lgbm.txt`
//! (optional secondary booster, compiled in with the `lightgbm` feature).

use crate::error::{MlError, Result};
use crate::features::FeatureColumns;
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use std::path::{Path, PathBuf};

/// One loaded model: its column layout and boosters.
pub struct ModelArtifacts {
    pub columns: FeatureColumns,
    booster: GBDT,
    #[cfg(feature = "lightgbm")]
    secondary: Option<lightgbm::Booster>,
}

pub fn columns_path(dir: &Path, uuid: &str) -> PathBuf {
    dir.join(format!("{uuid}_columns.txt"))
}

pub fn primary_path(dir: &Path, uuid: &str) -> PathBuf {
    dir.join(format!("{uuid}_json.json"))
}

#[cfg(feature = "lightgbm")]
pub fn secondary_path(dir: &Path, uuid: &str) -> PathBuf {
    dir.join(format!("{uuid}_lgbm.txt"))
}

impl ModelArtifacts {
    /// Load the artifact set for `uuid`. Blocking: run on a blocking
    /// thread from async contexts.
    pub fn load(dir: &Path, uuid: &str) -> Result<Self> {
        let columns = load_columns(&columns_path(dir, uuid))?;
        tracing::info!(uuid, features = columns.len(), "loaded feature columns");

        let primary = primary_path(dir, uuid);
        if !primary.is_file() {
            return Err(MlError::ModelUnavailable(format!(
                "model file not found: {}",
                primary.display()
            )));
        }
        let booster = GBDT::from_xgboost_json_used_feature(
            primary.to_str().ok_or_else(|| {
                MlError::Artifact(format!("non-UTF-8 model path: {}", primary.display()))
            })?,
        )
        .map_err(|e| {
            MlError::ModelUnavailable(format!("failed to load {}: {e}", primary.display()))
        })?;
        tracing::info!(uuid, path = %primary.display(), "loaded primary booster");

        #[cfg(feature = "lightgbm")]
        let secondary = {
            let path = secondary_path(dir, uuid);
            if path.is_file() {
                match lightgbm::Booster::from_file(path.to_str().unwrap_or_default()) {
                    Ok(model) => {
                        tracing::info!(uuid, path = %path.display(), "loaded secondary booster");
                        Some(model)
                    }
                    Err(e) => {
                        tracing::warn!(uuid, error = %e, "failed to load secondary booster");
                        None
                    }
                }
            } else {
                tracing::info!(uuid, "secondary booster not present, skipping");
                None
            }
        };

        Ok(Self {
            columns,
            booster,
            #[cfg(feature = "lightgbm")]
            secondary,
        })
    }

    /// Score the primary booster on a finished feature vector.
    pub fn predict(&self, features: Vec<f32>) -> Result<f64> {
        let input = vec![Data::new_test_data(features, None)];
        let predictions = self.booster.predict(&input);
        predictions
            .first()
            .copied()
            .map(f64::from)
            .ok_or_else(|| MlError::Prediction("booster returned no prediction".to_string()))
    }

    /// Score the secondary booster if present; observability only.
    #[cfg(feature = "lightgbm")]
    pub fn predict_secondary(&self, features: Vec<f64>) -> Option<f64> {
        let secondary = self.secondary.as_ref()?;
        match secondary.predict(vec![features]) {
            Ok(scores) => scores.first().and_then(|row| row.first()).copied(),
            Err(e) => {
                tracing::warn!(error = %e, "secondary booster prediction failed");
                None
            }
        }
    }
}

fn load_columns(path: &Path) -> Result<FeatureColumns> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        MlError::ModelUnavailable(format!("cannot open feature columns {}: {e}", path.display()))
    })?;

    let names: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if names.is_empty() {
        return Err(MlError::Artifact(format!(
            "no features found in {}",
            path.display()
        )));
    }

    Ok(FeatureColumns::new(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_columns_parse_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = columns_path(dir.path(), "m-1");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "amount\n\n  velocity_score  \n\nlocation_US").unwrap();

        let columns = load_columns(&path).unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns.position("amount"), Some(0));
        assert_eq!(columns.position("velocity_score"), Some(1));
        assert_eq!(columns.position("location_US"), Some(2));
    }

    #[test]
    fn test_empty_columns_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = columns_path(dir.path(), "m-1");
        std::fs::write(&path, "\n\n").unwrap();

        assert!(matches!(
            load_columns(&path),
            Err(MlError::Artifact(_))
        ));
    }

    #[test]
    fn test_missing_columns_file_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ModelArtifacts::load(dir.path(), "missing"),
            Err(MlError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_primary_booster_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(columns_path(dir.path(), "m-1"), "amount\n").unwrap();

        assert!(matches!(
            ModelArtifacts::load(dir.path(), "m-1"),
            Err(MlError::ModelUnavailable(_))
        ));
    }
}

//! Worker configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which backend serves transaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    Postgres,
    Redis,
    Memory,
}

/// Serialization of published rule results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    Json,
    Binary,
}

/// Broker connection settings. Credentials come from the environment
/// (`FRAUDGUARD_BROKER__*`), never from files checked into the repo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,

    #[serde(default = "default_group_id")]
    pub group_id: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: default_bootstrap_servers(),
            group_id: default_group_id(),
        }
    }
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".to_string()
}

fn default_group_id() -> String {
    "fraudguard-workers".to_string()
}

/// Rule worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Topic for incoming rule requests.
    #[serde(default = "default_request_topic")]
    pub request_topic: String,

    /// Topic for outgoing rule results.
    #[serde(default = "default_response_topic")]
    pub response_topic: String,

    /// Optional topic mirroring results for the reporter.
    #[serde(default)]
    pub reporter_topic: Option<String>,

    /// Result serialization, `json` or `binary`.
    #[serde(default = "default_result_format")]
    pub response_format: ResultFormat,

    /// Directory holding the ML model artifacts.
    #[serde(default = "default_model_dir")]
    pub ml_model_config_dir: PathBuf,

    /// History backend selection.
    #[serde(default = "default_history_backend")]
    pub history_backend: HistoryBackend,

    /// PostgreSQL connection string, required for the postgres backend.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection string, required for the redis backend.
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default)]
    pub broker: BrokerConfig,
}

fn default_request_topic() -> String {
    "Request".to_string()
}

fn default_response_topic() -> String {
    "Response".to_string()
}

fn default_result_format() -> ResultFormat {
    ResultFormat::Json
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("model_configs")
}

fn default_history_backend() -> HistoryBackend {
    HistoryBackend::Postgres
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            request_topic: default_request_topic(),
            response_topic: default_response_topic(),
            reporter_topic: None,
            response_format: default_result_format(),
            ml_model_config_dir: default_model_dir(),
            history_backend: default_history_backend(),
            database_url: None,
            redis_url: None,
            broker: BrokerConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Load from `config/worker.*` layered with `FRAUDGUARD_`-prefixed
    /// environment variables.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let loaded = config::Config::builder()
            .add_source(config::File::with_name("config/worker").required(false))
            .add_source(config::Environment::with_prefix("FRAUDGUARD").separator("__"))
            .build();

        match loaded {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("failed to deserialize config: {e}")),
            Err(_) => {
                tracing::info!("no config file found, using default configuration");
                Ok(Self::default())
            }
        }
    }
}

//! Director configuration

use serde::{Deserialize, Serialize};

/// Broker connection settings. Credentials come from the environment
/// (`FRAUDGUARD_BROKER__*`), never from files checked into the repo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: default_bootstrap_servers(),
        }
    }
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".to_string()
}

/// Director service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// gRPC bind host.
    #[serde(default = "default_host")]
    pub host: String,

    /// gRPC bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Topic for outgoing rule requests.
    #[serde(default = "default_request_topic")]
    pub request_topic: String,

    #[serde(default)]
    pub broker: BrokerConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    50051
}

fn default_request_topic() -> String {
    "Request".to_string()
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_topic: default_request_topic(),
            broker: BrokerConfig::default(),
        }
    }
}

impl DirectorConfig {
    /// Load from `config/director.*` layered with `FRAUDGUARD_`-prefixed
    /// environment variables.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let loaded = config::Config::builder()
            .add_source(config::File::with_name("config/director").required(false))
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

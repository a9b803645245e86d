//! FraudGuard Director service

use anyhow::Result;
use fraudguard_director::{Director, DirectorConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = DirectorConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let publisher = build_publisher(&config)?;
    let director = Arc::new(Director::new(publisher, config.request_topic.clone()));
    info!(topic = %config.request_topic, "director initialized");

    let addr = format!("{}:{}", config.host, config.port).parse()?;
    fraudguard_director::grpc::serve(director, addr).await?;

    Ok(())
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fraudguard_director=info,fraudguard_engine=info,fraudguard_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    Ok(())
}

#[cfg(feature = "kafka")]
fn build_publisher(
    config: &DirectorConfig,
) -> Result<Arc<dyn fraudguard_engine::MessagePublisher>> {
    let publisher = fraudguard_engine::KafkaPublisher::new(&config.broker.bootstrap_servers)?;
    info!(servers = %config.broker.bootstrap_servers, "kafka producer ready");
    Ok(Arc::new(publisher))
}

#[cfg(not(feature = "kafka"))]
fn build_publisher(
    _config: &DirectorConfig,
) -> Result<Arc<dyn fraudguard_engine::MessagePublisher>> {
    anyhow::bail!("built without a broker client; rebuild with --features kafka")
}

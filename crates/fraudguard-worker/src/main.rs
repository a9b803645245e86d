//! FraudGuard Worker service

use anyhow::Result;
use fraudguard_engine::{JsonResultCodec, ResultCodec, ResultProducer, RuleFactory, RuleWorker};
use fraudguard_ml::FraudScorer;
use fraudguard_store::{MemoryHistory, PostgresHistory, RedisHistory, TransactionHistory};
use fraudguard_worker::{
    run_consume_loop, HistoryBackend, ProtoRequestCodec, ProtoResultCodec, ResultFormat,
    WorkerConfig,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = WorkerConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let history = build_history(&config).await;
    if history.is_none() {
        warn!("transaction history disabled; pattern and ML rules will fail as configuration errors");
    }

    let scorer: Arc<dyn fraudguard_engine::Scorer> =
        Arc::new(FraudScorer::new(config.ml_model_config_dir.clone()));
    let factory = RuleFactory::new(history.clone(), history.is_some().then_some(scorer));

    let publisher = build_publisher(&config)?;
    let codec: Arc<dyn ResultCodec> = match config.response_format {
        ResultFormat::Json => Arc::new(JsonResultCodec),
        ResultFormat::Binary => Arc::new(ProtoResultCodec),
    };
    let producer = ResultProducer::new(publisher, codec, config.response_topic.clone())
        .with_reporter_topic(config.reporter_topic.clone());

    let worker = RuleWorker::new(Arc::new(ProtoRequestCodec), factory, history, producer);
    info!(
        request_topic = %config.request_topic,
        response_topic = %config.response_topic,
        "rule worker initialized"
    );

    let consumer = build_consumer(&config)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    run_consume_loop(consumer, worker, shutdown_rx).await
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fraudguard_worker=info,fraudguard_engine=info,fraudguard_ml=info,fraudguard_store=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    Ok(())
}

/// Bring up the configured history backend. The worker runs degraded
/// without one rather than refusing to start.
async fn build_history(config: &WorkerConfig) -> Option<Arc<dyn TransactionHistory>> {
    match config.history_backend {
        HistoryBackend::Postgres => {
            let Some(url) = &config.database_url else {
                warn!("postgres backend selected but database_url is not set");
                return None;
            };
            match PostgresHistory::connect(url, 10).await {
                Ok(store) => {
                    if let Err(e) = store.ensure_schema().await {
                        warn!(error = %e, "failed to ensure transactions schema");
                    }
                    info!("transaction history initialized with PostgreSQL");
                    Some(Arc::new(store))
                }
                Err(e) => {
                    warn!(error = %e, "PostgreSQL not available, history disabled");
                    None
                }
            }
        }
        HistoryBackend::Redis => {
            let Some(url) = &config.redis_url else {
                warn!("redis backend selected but redis_url is not set");
                return None;
            };
            match RedisHistory::connect(url).await {
                Ok(store) => {
                    info!("transaction history initialized with Redis");
                    Some(Arc::new(store))
                }
                Err(e) => {
                    warn!(error = %e, "Redis not available, history disabled");
                    None
                }
            }
        }
        HistoryBackend::Memory => {
            info!("transaction history initialized in memory");
            Some(Arc::new(MemoryHistory::new()))
        }
    }
}

async fn wait_for_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

#[cfg(feature = "kafka")]
fn build_publisher(config: &WorkerConfig) -> Result<Arc<dyn fraudguard_engine::MessagePublisher>> {
    let publisher = fraudguard_engine::KafkaPublisher::new(&config.broker.bootstrap_servers)?;
    Ok(Arc::new(publisher))
}

#[cfg(not(feature = "kafka"))]
fn build_publisher(
    _config: &WorkerConfig,
) -> Result<Arc<dyn fraudguard_engine::MessagePublisher>> {
    anyhow::bail!("built without a broker client; rebuild with --features kafka")
}

#[cfg(feature = "kafka")]
fn build_consumer(config: &WorkerConfig) -> Result<fraudguard_engine::KafkaConsumer> {
    Ok(fraudguard_engine::KafkaConsumer::new(
        &config.broker.bootstrap_servers,
        &config.broker.group_id,
        &config.request_topic,
    )?)
}

#[cfg(not(feature = "kafka"))]
fn build_consumer(_config: &WorkerConfig) -> Result<NullConsumer> {
    anyhow::bail!("built without a broker client; rebuild with --features kafka")
}

/// Placeholder so the non-kafka build type-checks; never constructed.
#[cfg(not(feature = "kafka"))]
struct NullConsumer;

#[cfg(not(feature = "kafka"))]
#[async_trait::async_trait]
impl fraudguard_engine::MessageConsumer for NullConsumer {
    async fn next(
        &mut self,
    ) -> std::result::Result<Option<fraudguard_engine::InboundMessage>, fraudguard_engine::BrokerUnavailable>
    {
        Ok(None)
    }

    async fn commit(
        &mut self,
        _message: &fraudguard_engine::InboundMessage,
    ) -> std::result::Result<(), fraudguard_engine::BrokerUnavailable> {
        Ok(())
    }
}

//! The consume loop

use fraudguard_engine::{MessageConsumer, RuleWorker};
use tokio::sync::watch;

/// Poll the request topic until shutdown is signalled or the broker goes
/// away. Each message is handled end-to-end and its offset committed only
/// after the result publish attempt returned (at-least-once). On shutdown
/// the in-flight message drains before polling stops.
pub async fn run_consume_loop(
    mut consumer: impl MessageConsumer,
    worker: RuleWorker,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    loop {
        let message = tokio::select! {
            biased;
            _ = shutdown.changed() => {
                tracing::info!("shutdown signalled, draining");
                return Ok(());
            }
            message = consumer.next() => message,
        };

        let message = match message {
            Ok(Some(message)) => message,
            Ok(None) => {
                tracing::info!("request subscription closed");
                return Ok(());
            }
            // fatal: the supervisor restarts the worker
            Err(e) => return Err(anyhow::anyhow!("broker consume failed: {e}")),
        };

        worker.process(&message.payload).await;

        if let Err(e) = consumer.commit(&message).await {
            tracing::error!(error = %e, "failed to commit offset");
        }
    }
}

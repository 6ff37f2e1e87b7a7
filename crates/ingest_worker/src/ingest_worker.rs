use crate::amqp::create_log_event_processor;
use crate::domain::{IngestService, RetryTracker};
use common::{AmqpConsumer, DeadLetterPublisher, LogRepository};
use lapin::Consumer;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct IngestWorkerConfig {
    /// Total processing attempts per payload before dead-letter routing
    pub max_delivery_attempts: u32,
    /// Deadline for each store append in seconds
    pub store_append_timeout_secs: u64,
}

/// The message ingestion pipeline, packaged as one runner process.
///
/// The caller registers the broker consumer and constructs the store
/// repository and dead-letter publisher; startup ordering lives in the
/// binary, not here.
pub struct IngestWorker {
    consumer: AmqpConsumer,
}

impl IngestWorker {
    pub fn new(
        consumer: Consumer,
        repository: Arc<dyn LogRepository>,
        dead_letters: Arc<dyn DeadLetterPublisher>,
        config: IngestWorkerConfig,
    ) -> Self {
        info!(
            max_delivery_attempts = config.max_delivery_attempts,
            "Initializing ingest worker"
        );

        let service = Arc::new(IngestService::new(
            repository,
            Duration::from_secs(config.store_append_timeout_secs),
        ));
        let retries = Arc::new(RetryTracker::new(config.max_delivery_attempts));
        let processor = create_log_event_processor(service, retries, dead_letters);

        Self {
            consumer: AmqpConsumer::new(consumer, processor),
        }
    }

    pub fn into_runner_process(
        self,
    ) -> Box<
        dyn FnOnce(
                CancellationToken,
            )
                -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>>
            + Send,
    > {
        Box::new({
            let consumer = self.consumer;
            move |ctx| Box::pin(async move { consumer.run(ctx).await })
        })
    }
}

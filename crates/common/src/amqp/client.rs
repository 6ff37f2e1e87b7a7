use crate::domain::{DeadLetterPublisher, DomainError, DomainResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// AMQP connection wrapper.
///
/// Owns one connection and one channel. The channel runs with publisher
/// confirms enabled so dead-letter publishes are acknowledged by the broker
/// before the original delivery is acked.
pub struct AmqpClient {
    connection: Connection,
    channel: Channel,
}

impl AmqpClient {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        info!(timeout_ms = timeout.as_millis() as u64, "Connecting to AMQP broker");

        let connection = tokio::time::timeout(
            timeout,
            Connection::connect(url, ConnectionProperties::default()),
        )
        .await
        .context("Timed out connecting to AMQP broker")?
        .context("Failed to connect to AMQP broker")?;

        let channel = connection
            .create_channel()
            .await
            .context("Failed to open AMQP channel")?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .context("Failed to enable publisher confirms")?;

        info!("Successfully connected to AMQP broker");
        Ok(Self { connection, channel })
    }

    /// Declare a durable, non-exclusive, non-auto-deleted queue.
    pub async fn declare_durable_queue(&self, name: &str) -> Result<()> {
        self.channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .with_context(|| format!("Failed to declare queue '{}'", name))?;

        info!(queue = %name, "Declared durable queue");
        Ok(())
    }

    /// Register a manual-acknowledgment consumer on a queue.
    pub async fn register_consumer(&self, queue: &str, consumer_tag: &str) -> Result<Consumer> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .with_context(|| format!("Failed to register consumer on queue '{}'", queue))?;

        info!(queue = %queue, consumer_tag = %consumer_tag, "Registered consumer");
        Ok(consumer)
    }

    /// Create a DeadLetterPublisher trait object targeting `queue`.
    pub fn create_dead_letter_publisher(&self, queue: &str) -> Arc<dyn DeadLetterPublisher> {
        Arc::new(AmqpDeadLetterPublisher {
            channel: self.channel.clone(),
            queue: queue.to_string(),
        })
    }

    pub async fn close(self) -> Result<()> {
        info!("Closing AMQP connection");
        self.connection
            .close(200, "shutting down")
            .await
            .context("Failed to close AMQP connection")?;
        Ok(())
    }
}

/// Concrete implementation of DeadLetterPublisher over an AMQP channel.
///
/// Publishes directly to the dead-letter queue through the default exchange
/// with persistent delivery mode, and waits for the broker confirmation.
pub struct AmqpDeadLetterPublisher {
    channel: Channel,
    queue: String,
}

#[async_trait]
impl DeadLetterPublisher for AmqpDeadLetterPublisher {
    async fn publish(&self, payload: &[u8]) -> DomainResult<()> {
        let confirmation = self
            .channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .context("Failed to publish to dead-letter queue")?
            .await
            .context("Failed to receive publisher confirmation")?;

        if let Confirmation::Nack(_) = confirmation {
            return Err(DomainError::RepositoryError(anyhow::anyhow!(
                "Broker rejected dead-letter publish to queue '{}'",
                self.queue
            )));
        }

        debug!(queue = %self.queue, payload_size = payload.len(), "Published payload to dead-letter queue");
        Ok(())
    }
}

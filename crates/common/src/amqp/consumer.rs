use futures::{future::BoxFuture, StreamExt};
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicNackOptions};
use lapin::Consumer;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Terminal outcome for one delivery, decided by the processor.
///
/// Exactly one of these is reflected back to the broker per delivery.
#[derive(Debug)]
pub enum Disposition {
    /// Fully processed; permanently remove the message from the queue.
    Ack,
    /// Processing failed; return the message to the queue for redelivery,
    /// with an optional reason for the logs.
    Requeue(Option<String>),
}

/// Type alias for the delivery processor function.
/// Takes one raw payload and decides its disposition. The processor owns
/// validation, persistence and the redelivery budget; it never fails, since
/// every failure mode maps onto a disposition.
pub type DeliveryProcessor = Box<dyn Fn(Vec<u8>) -> BoxFuture<'static, Disposition> + Send + Sync>;

/// AMQP consumer loop that processes deliveries one at a time, in the order
/// the broker yields them.
///
/// The loop handles delivery receipt and acknowledgments; payload handling
/// is delegated to the processor function. On cancellation it stops pulling
/// new deliveries but the in-flight delivery always reaches a terminal
/// acknowledgment first.
pub struct AmqpConsumer {
    consumer: Consumer,
    processor: DeliveryProcessor,
}

impl AmqpConsumer {
    pub fn new(consumer: Consumer, processor: DeliveryProcessor) -> Self {
        Self {
            consumer,
            processor,
        }
    }

    pub async fn run(mut self, ctx: CancellationToken) -> anyhow::Result<()> {
        info!("Starting consume loop");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("Received shutdown signal, stopping consumer");
                    break;
                }
                next = self.consumer.next() => {
                    match next {
                        Some(Ok(delivery)) => self.handle_delivery(delivery).await,
                        Some(Err(e)) => {
                            error!(error = %e, "Error receiving delivery");
                            // Continue consuming despite errors
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                        None => {
                            // Without a delivery stream this process can do no
                            // further work; let the supervisor decide.
                            anyhow::bail!("Delivery stream closed by broker");
                        }
                    }
                }
            }
        }

        info!("Consumer stopped gracefully");
        Ok(())
    }

    async fn handle_delivery(&self, delivery: Delivery) {
        debug!(
            payload_size = delivery.data.len(),
            redelivered = delivery.redelivered,
            "Received delivery"
        );

        match (self.processor)(delivery.data.clone()).await {
            Disposition::Ack => {
                if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
                    error!(error = %e, "Failed to acknowledge delivery");
                }
            }
            Disposition::Requeue(reason) => {
                match &reason {
                    Some(reason) => warn!(reason = %reason, "Returning delivery to the queue"),
                    None => warn!("Returning delivery to the queue"),
                }

                let options = BasicNackOptions {
                    requeue: true,
                    ..Default::default()
                };
                if let Err(e) = delivery.nack(options).await {
                    error!(error = %e, "Failed to return delivery to the queue");
                }
            }
        }
    }
}

// Note: unit tests for the consume loop are not practical because lapin
// deliveries cannot be constructed without a live channel. The loop is
// exercised end-to-end against a real broker; disposition logic is unit
// tested in the processor that produces it.

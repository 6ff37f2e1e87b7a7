use crate::domain::{IngestService, RetryDecision, RetryTracker};
use common::{DeadLetterPublisher, DeliveryProcessor, Disposition};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Create a DeliveryProcessor that drives each payload through the ingest
/// service and maps failures onto the redelivery budget.
///
/// Success clears the payload's budget and acks. Failure consumes one
/// attempt: below the bound the delivery is requeued; at the bound the raw
/// payload is published to the dead-letter queue and the original delivery
/// is acked once the publish is confirmed. A failed dead-letter publish
/// falls back to requeue so the delivery is never dropped.
pub fn create_log_event_processor(
    service: Arc<IngestService>,
    retries: Arc<RetryTracker>,
    dead_letters: Arc<dyn DeadLetterPublisher>,
) -> DeliveryProcessor {
    Box::new(move |payload: Vec<u8>| {
        let service = Arc::clone(&service);
        let retries = Arc::clone(&retries);
        let dead_letters = Arc::clone(&dead_letters);

        Box::pin(async move {
            let err = match service.process_payload(&payload).await {
                Ok(()) => {
                    retries.clear(&payload);
                    debug!("successfully persisted log event");
                    return Disposition::Ack;
                }
                Err(e) => e,
            };

            match retries.record_failure(&payload) {
                RetryDecision::Requeue { attempts } => {
                    warn!(error = %err, attempts, "failed to process log event, requeueing");
                    Disposition::Requeue(Some(err.to_string()))
                }
                RetryDecision::DeadLetter { attempts } => {
                    warn!(
                        error = %err,
                        attempts,
                        "redelivery budget exhausted, routing to dead-letter queue"
                    );
                    match dead_letters.publish(&payload).await {
                        Ok(()) => {
                            retries.clear(&payload);
                            Disposition::Ack
                        }
                        Err(publish_err) => {
                            // The delivery must not be dropped; give it
                            // another redelivery cycle instead.
                            error!(
                                error = %publish_err,
                                "failed to publish to dead-letter queue, requeueing"
                            );
                            Disposition::Requeue(Some(publish_err.to_string()))
                        }
                    }
                }
            }
        })
    })
}

use common::{DeliveryProcessor, Disposition};
use ingest_worker::domain::{IngestService, RetryTracker};
use ingest_worker::create_log_event_processor;
use std::sync::Arc;
use std::time::Duration;

// In-memory fakes for pipeline testing
mod fakes {
    use async_trait::async_trait;
    use common::{DeadLetterPublisher, DomainResult, LogRepository};
    use std::sync::Mutex;

    /// Append-only list with a plannable number of leading failures.
    pub struct InMemoryLogRepository {
        entries: Mutex<Vec<String>>,
        fail_next: Mutex<u32>,
    }

    impl InMemoryLogRepository {
        pub fn new() -> Self {
            Self {
                entries: Mutex::new(Vec::new()),
                fail_next: Mutex::new(0),
            }
        }

        /// Make the next `count` append calls fail.
        pub fn fail_next_appends(&self, count: u32) {
            *self.fail_next.lock().unwrap() = count;
        }

        pub fn entries(&self) -> Vec<String> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LogRepository for InMemoryLogRepository {
        async fn append(&self, raw: &str) -> DomainResult<()> {
            let mut fail_next = self.fail_next.lock().unwrap();
            if *fail_next > 0 {
                *fail_next -= 1;
                return Err(anyhow::anyhow!("store unreachable").into());
            }

            self.entries.lock().unwrap().push(raw.to_string());
            Ok(())
        }
    }

    pub struct InMemoryDeadLetterQueue {
        entries: Mutex<Vec<Vec<u8>>>,
    }

    impl InMemoryDeadLetterQueue {
        pub fn new() -> Self {
            Self {
                entries: Mutex::new(Vec::new()),
            }
        }

        pub fn entries(&self) -> Vec<Vec<u8>> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeadLetterPublisher for InMemoryDeadLetterQueue {
        async fn publish(&self, payload: &[u8]) -> DomainResult<()> {
            self.entries.lock().unwrap().push(payload.to_vec());
            Ok(())
        }
    }
}

use fakes::{InMemoryDeadLetterQueue, InMemoryLogRepository};

const WELL_FORMED: &str = r#"{"UserId":"u1","Message":"hello","RequestName":"r","RequestId":"1","Severity":"info","Metadata":"{}"}"#;

fn build_processor(
    repository: Arc<InMemoryLogRepository>,
    dead_letters: Arc<InMemoryDeadLetterQueue>,
    max_attempts: u32,
) -> DeliveryProcessor {
    let service = Arc::new(IngestService::new(repository, Duration::from_secs(5)));
    let retries = Arc::new(RetryTracker::new(max_attempts));
    create_log_event_processor(service, retries, dead_letters)
}

#[tokio::test]
async fn test_well_formed_payload_is_stored_verbatim_and_acked() {
    let repository = Arc::new(InMemoryLogRepository::new());
    let dead_letters = Arc::new(InMemoryDeadLetterQueue::new());
    let processor = build_processor(repository.clone(), dead_letters.clone(), 5);

    let disposition = processor(WELL_FORMED.as_bytes().to_vec()).await;

    assert!(matches!(disposition, Disposition::Ack));
    assert_eq!(repository.entries(), vec![WELL_FORMED.to_string()]);
    assert!(dead_letters.entries().is_empty());
}

#[tokio::test]
async fn test_malformed_payload_leaves_store_unchanged_and_requeues() {
    let repository = Arc::new(InMemoryLogRepository::new());
    let dead_letters = Arc::new(InMemoryDeadLetterQueue::new());
    let processor = build_processor(repository.clone(), dead_letters.clone(), 5);

    // The broker redelivers a requeued message; each attempt below the
    // budget requeues again.
    let first = processor(b"not-json".to_vec()).await;
    let second = processor(b"not-json".to_vec()).await;

    assert!(matches!(first, Disposition::Requeue(_)));
    assert!(matches!(second, Disposition::Requeue(_)));
    assert!(repository.entries().is_empty());
}

#[tokio::test]
async fn test_append_failure_then_redelivery_stores_exactly_one_element() {
    let repository = Arc::new(InMemoryLogRepository::new());
    let dead_letters = Arc::new(InMemoryDeadLetterQueue::new());
    let processor = build_processor(repository.clone(), dead_letters.clone(), 5);
    repository.fail_next_appends(1);

    // First attempt hits the store failure and is requeued; the redelivered
    // attempt succeeds.
    let first = processor(WELL_FORMED.as_bytes().to_vec()).await;
    let second = processor(WELL_FORMED.as_bytes().to_vec()).await;

    assert!(matches!(first, Disposition::Requeue(_)));
    assert!(matches!(second, Disposition::Ack));
    assert_eq!(repository.entries(), vec![WELL_FORMED.to_string()]);
}

#[tokio::test]
async fn test_redelivery_after_successful_append_stores_a_duplicate() {
    // A crash between append and ack redelivers an already-persisted
    // payload. The stored list is a duplicate-tolerant log: two copies is
    // the documented outcome, not a bug.
    let repository = Arc::new(InMemoryLogRepository::new());
    let dead_letters = Arc::new(InMemoryDeadLetterQueue::new());
    let processor = build_processor(repository.clone(), dead_letters.clone(), 5);

    processor(WELL_FORMED.as_bytes().to_vec()).await;
    processor(WELL_FORMED.as_bytes().to_vec()).await;

    assert_eq!(
        repository.entries(),
        vec![WELL_FORMED.to_string(), WELL_FORMED.to_string()]
    );
}

#[tokio::test]
async fn test_permanently_malformed_payload_is_dead_lettered_after_the_budget() {
    let repository = Arc::new(InMemoryLogRepository::new());
    let dead_letters = Arc::new(InMemoryDeadLetterQueue::new());
    let processor = build_processor(repository.clone(), dead_letters.clone(), 3);

    let first = processor(b"not-json".to_vec()).await;
    let second = processor(b"not-json".to_vec()).await;
    let third = processor(b"not-json".to_vec()).await;

    assert!(matches!(first, Disposition::Requeue(_)));
    assert!(matches!(second, Disposition::Requeue(_)));
    // Budget exhausted: the payload lands on the dead-letter queue verbatim
    // and the original delivery is acked off the primary queue.
    assert!(matches!(third, Disposition::Ack));
    assert_eq!(dead_letters.entries(), vec![b"not-json".to_vec()]);
    assert!(repository.entries().is_empty());
}

#[tokio::test]
async fn test_success_clears_the_redelivery_budget() {
    let repository = Arc::new(InMemoryLogRepository::new());
    let dead_letters = Arc::new(InMemoryDeadLetterQueue::new());
    let processor = build_processor(repository.clone(), dead_letters.clone(), 2);

    // One failure, then success: the budget entry for this payload is
    // cleared, so a later failure starts a fresh count instead of
    // dead-lettering.
    repository.fail_next_appends(1);
    processor(WELL_FORMED.as_bytes().to_vec()).await;
    processor(WELL_FORMED.as_bytes().to_vec()).await;

    repository.fail_next_appends(1);
    let after_success = processor(WELL_FORMED.as_bytes().to_vec()).await;

    assert!(matches!(after_success, Disposition::Requeue(_)));
    assert!(dead_letters.entries().is_empty());
}

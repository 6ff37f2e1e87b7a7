use common::{DomainError, DomainResult, LogMessage, LogRepository};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Domain service for the validate-then-persist decision on one payload.
///
/// Flow:
/// 1. Parse the payload as JSON into the LogMessage shape (validation only)
/// 2. Append the original raw bytes to the store under a deadline
///
/// The parsed struct is discarded after validation; the store receives the
/// payload untouched. The append is never retried here; retry is delegated
/// entirely to broker redelivery.
pub struct IngestService {
    repository: Arc<dyn LogRepository>,
    append_timeout: Duration,
}

impl IngestService {
    pub fn new(repository: Arc<dyn LogRepository>, append_timeout: Duration) -> Self {
        Self {
            repository,
            append_timeout,
        }
    }

    #[instrument(skip(self, payload), fields(payload_size = payload.len()))]
    pub async fn process_payload(&self, payload: &[u8]) -> DomainResult<()> {
        let raw = std::str::from_utf8(payload)?;
        let log_message = LogMessage::parse(raw)?;

        debug!(
            request_id = %log_message.request_id,
            severity = %log_message.severity,
            "parsed log message"
        );

        match tokio::time::timeout(self.append_timeout, self.repository.append(raw)).await {
            Ok(result) => result?,
            Err(_) => return Err(DomainError::StoreTimeout(self.append_timeout)),
        }

        debug!("appended raw payload to store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::MockLogRepository;

    const WELL_FORMED: &[u8] = br#"{"UserId":"u1","Message":"hello","RequestName":"r","RequestId":"1","Severity":"info","Metadata":"{}"}"#;

    #[tokio::test]
    async fn test_well_formed_payload_appends_exact_raw_bytes() {
        // Arrange
        let mut mock_repo = MockLogRepository::new();
        mock_repo
            .expect_append()
            .withf(|raw: &str| raw.as_bytes() == WELL_FORMED)
            .times(1)
            .return_once(|_| Ok(()));

        let service = IngestService::new(Arc::new(mock_repo), Duration::from_secs(5));

        // Act
        let result = service.process_payload(WELL_FORMED).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_payload_performs_no_store_mutation() {
        // Arrange - no expectations: any append call fails the test
        let mock_repo = MockLogRepository::new();
        let service = IngestService::new(Arc::new(mock_repo), Duration::from_secs(5));

        // Act
        let result = service.process_payload(b"not-json").await;

        // Assert
        assert!(matches!(result, Err(DomainError::MalformedPayload(_))));
    }

    #[tokio::test]
    async fn test_non_utf8_payload_performs_no_store_mutation() {
        let mock_repo = MockLogRepository::new();
        let service = IngestService::new(Arc::new(mock_repo), Duration::from_secs(5));

        let result = service.process_payload(&[0xff, 0xfe, 0x01]).await;

        assert!(matches!(result, Err(DomainError::InvalidEncoding(_))));
    }

    #[tokio::test]
    async fn test_append_failure_propagates_without_internal_retry() {
        // Arrange
        let mut mock_repo = MockLogRepository::new();
        mock_repo
            .expect_append()
            .times(1)
            .return_once(|_| Err(DomainError::RepositoryError(anyhow::anyhow!("store unreachable"))));

        let service = IngestService::new(Arc::new(mock_repo), Duration::from_secs(5));

        // Act
        let result = service.process_payload(WELL_FORMED).await;

        // Assert
        assert!(matches!(result, Err(DomainError::RepositoryError(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_append_times_out_as_recoverable_error() {
        struct SlowRepository;

        #[async_trait]
        impl LogRepository for SlowRepository {
            async fn append(&self, _raw: &str) -> DomainResult<()> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }

        let service = IngestService::new(Arc::new(SlowRepository), Duration::from_secs(5));

        let result = service.process_payload(WELL_FORMED).await;

        assert!(matches!(result, Err(DomainError::StoreTimeout(_))));
    }
}

use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Append-only sink for raw log payloads.
///
/// Implementations append each payload string to a single stored list in
/// processing order. At-least-once contract: callers acknowledge a delivery
/// only after `append` has returned Ok, so the list is duplicate-tolerant
/// (a redelivered payload appends a second copy).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Append one raw payload to the stored list.
    async fn append(&self, raw: &str) -> DomainResult<()>;
}

/// Destination for deliveries that exhausted their redelivery budget.
///
/// Implementations must persist the exact payload bytes; a confirmed publish
/// here is what permits acknowledging the original delivery.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeadLetterPublisher: Send + Sync {
    /// Publish one raw payload to the dead-letter queue.
    async fn publish(&self, payload: &[u8]) -> DomainResult<()>;
}

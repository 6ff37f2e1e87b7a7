use async_trait::async_trait;
use common::{DomainResult, LogRepository, RedisClient};
use tracing::debug;

/// LogRepository backed by a Redis list at a fixed key.
pub struct RedisLogRepository {
    client: RedisClient,
    key: String,
}

impl RedisLogRepository {
    pub fn new(client: RedisClient, key: String) -> Self {
        Self { client, key }
    }
}

#[async_trait]
impl LogRepository for RedisLogRepository {
    async fn append(&self, raw: &str) -> DomainResult<()> {
        let len = self.client.rpush(&self.key, raw).await?;
        debug!(key = %self.key, list_len = len, "appended payload to store");
        Ok(())
    }
}

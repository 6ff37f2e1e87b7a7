use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Secret locations
    /// Path to the file holding the AMQP broker URL
    #[serde(default = "default_amqp_url_secret_path")]
    pub amqp_url_secret_path: String,

    /// Path to the file holding the Redis address (host:port)
    #[serde(default = "default_redis_addr_secret_path")]
    pub redis_addr_secret_path: String,

    /// Path to the file holding the Redis password
    #[serde(default = "default_redis_password_secret_path")]
    pub redis_password_secret_path: String,

    // Queue configuration
    /// Durable queue to consume log events from
    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    /// Durable queue for deliveries that exhaust their redelivery budget
    #[serde(default = "default_dead_letter_queue_name")]
    pub dead_letter_queue_name: String,

    /// Consumer tag reported to the broker
    #[serde(default = "default_consumer_tag")]
    pub consumer_tag: String,

    // Store configuration
    /// Redis list key the raw payloads are appended to
    #[serde(default = "default_store_key")]
    pub store_key: String,

    /// Deadline for each store append in seconds
    #[serde(default = "default_store_append_timeout_secs")]
    pub store_append_timeout_secs: u64,

    // Pipeline configuration
    /// Total processing attempts per payload before dead-letter routing
    #[serde(default = "default_max_delivery_attempts")]
    pub max_delivery_attempts: u32,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    /// Time allowed for in-flight work and cleanup on shutdown in seconds
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

// Secret defaults
fn default_amqp_url_secret_path() -> String {
    "/secrets/rabbitmq-url".to_string()
}

fn default_redis_addr_secret_path() -> String {
    "/secrets/redis-addr".to_string()
}

fn default_redis_password_secret_path() -> String {
    "/secrets/redis-password".to_string()
}

// Queue defaults
fn default_queue_name() -> String {
    "logs".to_string()
}

fn default_dead_letter_queue_name() -> String {
    "logs.dead-letter".to_string()
}

fn default_consumer_tag() -> String {
    "logsink".to_string()
}

// Store defaults
fn default_store_key() -> String {
    "rabbitmq_messages".to_string()
}

fn default_store_append_timeout_secs() -> u64 {
    10
}

// Pipeline defaults
fn default_max_delivery_attempts() -> u32 {
    5
}

fn default_startup_timeout_secs() -> u64 {
    30
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("LOGSINK"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure tests run serially and don't interfere with each other
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        std::env::remove_var("LOGSINK_QUEUE_NAME");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.queue_name, "logs");
        assert_eq!(config.dead_letter_queue_name, "logs.dead-letter");
        assert_eq!(config.store_key, "rabbitmq_messages");
        assert_eq!(config.max_delivery_attempts, 5);
        assert_eq!(config.amqp_url_secret_path, "/secrets/rabbitmq-url");
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        std::env::set_var("LOGSINK_QUEUE_NAME", "audit-logs");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.queue_name, "audit-logs");

        // Clean up
        std::env::remove_var("LOGSINK_QUEUE_NAME");
    }
}

mod config;

use common::{init_telemetry, read_secret, AmqpClient, RedisClient, TelemetryConfig};
use config::ServiceConfig;
use ingest_worker::{IngestWorker, IngestWorkerConfig, RedisLogRepository};
use logsink_runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&TelemetryConfig {
        log_level: config.log_level.clone(),
    }) {
        eprintln!("Failed to initialize telemetry: {}", e);
        std::process::exit(1);
    }

    info!(queue = %config.queue_name, "Starting logsink service");

    let (amqp_client, consumer, redis_client) = match initialize_connections(&config).await {
        Ok(deps) => deps,
        Err(e) => {
            error!("Failed to initialize connections: {:#}", e);
            std::process::exit(1);
        }
    };

    let repository = Arc::new(RedisLogRepository::new(
        redis_client,
        config.store_key.clone(),
    ));
    let dead_letters = amqp_client.create_dead_letter_publisher(&config.dead_letter_queue_name);

    let worker = IngestWorker::new(
        consumer,
        repository,
        dead_letters,
        IngestWorkerConfig {
            max_delivery_attempts: config.max_delivery_attempts,
            store_append_timeout_secs: config.store_append_timeout_secs,
        },
    );

    let runner = Runner::new()
        .with_named_process("ingest_worker", worker.into_runner_process())
        .with_closer(move || async move {
            // The store handle drops with the worker; the broker connection
            // is released last, in reverse-acquisition order.
            info!("Releasing connections");
            amqp_client.close().await
        })
        .with_closer_timeout(Duration::from_secs(config.shutdown_timeout_secs));

    runner.run().await;
}

/// Strict startup sequence: secrets, broker connection, queue declares,
/// consumer registration, store connection, liveness probe. Any failure
/// aborts the process before the pipeline exists.
async fn initialize_connections(
    config: &ServiceConfig,
) -> anyhow::Result<(AmqpClient, lapin::Consumer, RedisClient)> {
    info!("Loading secrets...");
    let amqp_url = read_secret(&config.amqp_url_secret_path)?;
    let redis_addr = read_secret(&config.redis_addr_secret_path)?;
    let redis_password = read_secret(&config.redis_password_secret_path)?;

    info!("Initializing AMQP...");
    let amqp_client = AmqpClient::connect(
        &amqp_url,
        Duration::from_secs(config.startup_timeout_secs),
    )
    .await?;
    amqp_client.declare_durable_queue(&config.queue_name).await?;
    amqp_client
        .declare_durable_queue(&config.dead_letter_queue_name)
        .await?;
    let consumer = amqp_client
        .register_consumer(&config.queue_name, &config.consumer_tag)
        .await?;

    info!("Initializing Redis...");
    let redis_client = RedisClient::connect(&redis_addr, &redis_password).await?;
    redis_client.ping().await?;

    Ok((amqp_client, consumer, redis_client))
}

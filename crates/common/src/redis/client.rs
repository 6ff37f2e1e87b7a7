use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::{debug, info};

/// Redis connection wrapper.
///
/// Connects over TLS (server name taken from the host part of the address)
/// with password authentication, and hands out a reconnect-capable
/// `ConnectionManager` clone per command.
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(addr: &str, password: &str) -> Result<Self> {
        let (host, port) = split_addr(addr)?;
        info!(host = %host, port, "Connecting to Redis");

        let info = ConnectionInfo {
            addr: ConnectionAddr::TcpTls {
                host: host.to_string(),
                port,
                insecure: false,
                tls_params: None,
            },
            redis: RedisConnectionInfo {
                password: Some(password.to_string()),
                ..Default::default()
            },
        };

        let client = redis::Client::open(info).context("Invalid Redis connection info")?;
        let manager = client
            .get_connection_manager()
            .await
            .context("Failed to connect to Redis")?;

        info!("Successfully connected to Redis");
        Ok(Self { manager })
    }

    /// Liveness probe: one PING round-trip.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis PING failed")?;

        debug!(response = %pong, "Redis liveness probe succeeded");
        Ok(())
    }

    /// Append a string to the list at `key`, returning the new list length.
    pub async fn rpush(&self, key: &str, value: &str) -> Result<i64> {
        let mut conn = self.manager.clone();
        let len: i64 = conn
            .rpush(key, value)
            .await
            .with_context(|| format!("Failed to append to Redis list '{}'", key))?;
        Ok(len)
    }
}

fn split_addr(addr: &str) -> Result<(&str, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .with_context(|| format!("Redis address '{}' is not in host:port form", addr))?;
    let port: u16 = port
        .parse()
        .with_context(|| format!("Invalid Redis port in address '{}'", addr))?;
    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_addr() {
        assert_eq!(split_addr("redis.internal:6380").unwrap(), ("redis.internal", 6380));
    }

    #[test]
    fn test_split_addr_without_port_fails() {
        assert!(split_addr("redis.internal").is_err());
    }

    #[test]
    fn test_split_addr_with_bad_port_fails() {
        assert!(split_addr("redis.internal:notaport").is_err());
    }
}

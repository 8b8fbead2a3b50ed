//! Redis cache backend
//!
//! Uses `redis::aio::ConnectionManager` for a multiplexed connection with
//! automatic reconnection, shared by all requests.

use super::TodoCache;
use crate::config::CacheConfig;
use crate::error::CacheError;
use ::redis::aio::ConnectionManager;
use ::redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct RedisCache {
    connection_manager: ConnectionManager,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection_manager", &"ConnectionManager")
            .finish()
    }
}

impl RedisCache {
    /// Connect and verify the server answers PING
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        info!(
            host = %config.redis_host,
            port = config.redis_port,
            auth = config.redis_password.is_some(),
            "Connecting to Redis"
        );

        let client = ::redis::Client::open(connection_info(config))
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {}", e)))?;

        let mut connection_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let pong: String = ::redis::cmd("PING")
            .query_async(&mut connection_manager)
            .await?;
        if pong != "PONG" {
            return Err(CacheError::Connection(format!(
                "Unexpected PING reply: {}",
                pong
            )));
        }

        info!("Redis connection established");
        Ok(Self { connection_manager })
    }
}

fn connection_info(config: &CacheConfig) -> ConnectionInfo {
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(config.redis_host.clone(), config.redis_port),
        redis: RedisConnectionInfo {
            password: config.redis_password.clone(),
            ..Default::default()
        },
    }
}

/// Redis expiry is whole seconds; round up and never go below one
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl
        .as_secs()
        .saturating_add(u64::from(ttl.subsec_nanos() > 0));
    secs.max(1)
}

#[async_trait]
impl TodoCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection_manager.clone();
        let result: Option<String> = ::redis::cmd("GET").arg(key).query_async(&mut conn).await?;

        if result.is_some() {
            debug!(key = key, "Cache HIT");
        } else {
            debug!(key = key, "Cache MISS");
        }

        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection_manager.clone();
        let ttl_seconds = ttl_seconds(ttl);

        let _: () = ::redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;

        debug!(key = key, ttl_seconds = ttl_seconds, "Cache SET");
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection_manager.clone();
        let removed: u64 = ::redis::cmd("DEL").arg(key).query_async(&mut conn).await?;

        debug!(key = key, removed = removed, "Cache DEL");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

//! Collection cache
//!
//! Redis in production; a DashMap-backed TTL map for single-process runs.

pub mod memory;
pub mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

use crate::config::{CacheBackend, CacheConfig};
use crate::error::CacheError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Key/value cache with per-entry expiry
#[async_trait]
pub trait TodoCache: Send + Sync {
    /// Cached value, or `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value`, replacing any previous one, expiring after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Drop `key`; absent keys are not an error
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;

    fn backend_name(&self) -> &'static str;
}

/// Connect the configured cache backend
pub async fn open(config: &CacheConfig) -> Result<Arc<dyn TodoCache>, CacheError> {
    match config.backend {
        CacheBackend::Redis => Ok(Arc::new(RedisCache::connect(config).await?)),
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::new())),
    }
}

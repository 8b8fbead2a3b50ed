//! In-memory cache using DashMap

use super::TodoCache;
use crate::error::CacheError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Simple in-memory cache with TTL support
pub struct MemoryCache {
    data: Arc<DashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryCache {
    /// Must be called inside a Tokio runtime (spawns the sweep task)
    pub fn new() -> Self {
        let cache = Self {
            data: Arc::new(DashMap::new()),
        };

        cache.start_cleanup_task();

        cache
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let entry = self.data.get(key)?;
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.data.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    fn start_cleanup_task(&self) {
        // Weak so the task ends once the cache is dropped
        let data = Arc::downgrade(&self.data);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;

                let Some(data) = data.upgrade() else {
                    break;
                };
                let now = Instant::now();
                data.retain(|_, entry| entry.expires_at > now);
            }
        });
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TodoCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.lookup(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Backend(format!("TTL {:?} out of range", ttl)))?;

        self.data.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.data.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);

        // Test set and get
        cache.set("key1", "[1,2,3]", ttl).await.unwrap();
        assert_eq!(cache.get("key1").await.unwrap().as_deref(), Some("[1,2,3]"));

        // Test non-existent key
        assert_eq!(cache.get("nonexistent").await.unwrap(), None);

        // Test overwrite
        cache.set("key1", "[]", ttl).await.unwrap();
        assert_eq!(cache.get("key1").await.unwrap().as_deref(), Some("[]"));

        // Test invalidate, twice
        cache.invalidate("key1").await.unwrap();
        cache.invalidate("key1").await.unwrap();
        assert_eq!(cache.get("key1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ttl() {
        let cache = MemoryCache::new();

        // Set with very short TTL
        cache
            .set("key1", "value", Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(cache.get("key1").await.unwrap().as_deref(), Some("value"));

        // Wait for expiration
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("key1").await.unwrap(), None);
        assert!(cache.data.get("key1").is_none());
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_is_an_error() {
        let cache = MemoryCache::new();

        let err = cache
            .set("key1", "value", Duration::from_secs(u64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Backend(_)));
        assert_eq!(cache.get("key1").await.unwrap(), None);
    }
}

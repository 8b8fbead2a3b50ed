//! Todo service
//!
//! Cache-aside over the whole collection: reads go through a single cache
//! key, every successful write deletes that key before returning. Cache
//! failures never fail a request; they are logged and the store is used
//! directly.

use crate::cache::TodoCache;
use crate::error::{CacheError, StoreError};
use crate::storage::TodoStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use todo_types::{Todo, TodoId};
use tracing::{debug, info, warn};

/// Cache key holding the serialized collection
pub const COLLECTION_KEY: &str = "todos";

pub struct TodoService {
    store: Arc<dyn TodoStore>,
    cache: Arc<dyn TodoCache>,
    ttl: Duration,
    op_timeout: Duration,
}

impl TodoService {
    pub fn new(
        store: Arc<dyn TodoStore>,
        cache: Arc<dyn TodoCache>,
        ttl: Duration,
        op_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            ttl,
            op_timeout,
        }
    }

    /// All todos, served from cache when a fresh snapshot exists
    pub async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        if let Some(todos) = self.cached_snapshot().await {
            return Ok(todos);
        }

        let todos = self.with_store_timeout(self.store.list_all()).await?;
        self.populate(&todos).await;

        Ok(todos)
    }

    pub async fn create(&self, text: &str) -> Result<Todo, StoreError> {
        let todo = self.with_store_timeout(self.store.insert(text)).await?;
        info!(id = todo.id, "Todo created");

        self.after_commit().await;
        Ok(todo)
    }

    /// Deleting an unknown id succeeds and changes nothing
    pub async fn delete(&self, id: TodoId) -> Result<(), StoreError> {
        let removed = self.with_store_timeout(self.store.delete(id)).await?;
        if removed {
            info!(id = id, "Todo deleted");
        } else {
            debug!(id = id, "Delete matched no todo");
        }

        self.after_commit().await;
        Ok(())
    }

    pub async fn health(&self) -> Result<(), StoreError> {
        self.with_store_timeout(self.store.ping()).await
    }

    async fn cached_snapshot(&self) -> Option<Vec<Todo>> {
        let payload = match self
            .with_cache_timeout(self.cache.get(COLLECTION_KEY))
            .await
        {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(key = COLLECTION_KEY, "Collection cache miss");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Cache read failed, falling back to store");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(todos) => {
                debug!(key = COLLECTION_KEY, "Collection cache hit");
                Some(todos)
            }
            Err(e) => {
                warn!(error = %e, "Discarding undecodable cache entry");
                self.invalidate().await;
                None
            }
        }
    }

    async fn populate(&self, todos: &[Todo]) {
        let payload = match serde_json::to_string(todos) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize collection for cache");
                return;
            }
        };

        if let Err(e) = self
            .with_cache_timeout(self.cache.set(COLLECTION_KEY, &payload, self.ttl))
            .await
        {
            warn!(error = %e, "Cache write failed");
        }
    }

    /// Runs after a store mutation succeeded; never fails the mutation
    async fn after_commit(&self) {
        self.invalidate().await;
    }

    async fn invalidate(&self) {
        if let Err(e) = self
            .with_cache_timeout(self.cache.invalidate(COLLECTION_KEY))
            .await
        {
            warn!(error = %e, key = COLLECTION_KEY, "Cache invalidation failed");
        }
    }

    async fn with_store_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.op_timeout))?
    }

    async fn with_cache_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout(self.op_timeout))?
    }
}

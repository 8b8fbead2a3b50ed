//! Storage layer
//!
//! The todo table lives in PostgreSQL in production and in SQLite (file or
//! in-memory) for local runs and tests. Both gateways provision their schema
//! when opened.

pub mod postgres;
pub mod schema;
pub mod sqlite;

pub use postgres::PgTodoStore;
pub use sqlite::SqliteTodoStore;

use crate::config::{DatabaseConfig, StoreBackend};
use crate::error::StoreError;
use async_trait::async_trait;
use std::sync::Arc;
use todo_types::{Todo, TodoId};

/// Persistence gateway for todo items
///
/// Each call is a single round trip; nothing is retried here.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Every stored item, in store-defined order
    async fn list_all(&self) -> Result<Vec<Todo>, StoreError>;

    /// Insert a row and return it with its assigned id
    async fn insert(&self, text: &str) -> Result<Todo, StoreError>;

    /// Delete the row with `id`; returns whether a row was removed
    async fn delete(&self, id: TodoId) -> Result<bool, StoreError>;

    /// Cheap liveness check
    async fn ping(&self) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}

/// `SQLITE_PATH` value selecting a private in-memory database
pub const SQLITE_MEMORY_PATH: &str = ":memory:";

/// Open the configured store, provisioning database and table first
pub async fn open(config: &DatabaseConfig) -> Result<Arc<dyn TodoStore>, StoreError> {
    match config.backend {
        StoreBackend::Postgres => Ok(Arc::new(PgTodoStore::connect(config).await?)),
        StoreBackend::Sqlite if config.sqlite_path.as_os_str() == SQLITE_MEMORY_PATH => {
            Ok(Arc::new(SqliteTodoStore::in_memory().await?))
        }
        StoreBackend::Sqlite => Ok(Arc::new(
            SqliteTodoStore::open(&config.sqlite_path, config.max_connections).await?,
        )),
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TodoRow {
    id: i64,
    text: String,
}

impl From<TodoRow> for Todo {
    fn from(r: TodoRow) -> Self {
        Todo {
            id: r.id,
            text: r.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sqlite_config(sqlite_path: PathBuf) -> DatabaseConfig {
        DatabaseConfig {
            backend: StoreBackend::Sqlite,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "unused".to_string(),
            name: "TodoDb".to_string(),
            max_connections: 1,
            sqlite_path,
        }
    }

    #[tokio::test]
    async fn test_open_fails_when_database_cannot_be_created() {
        let blocker = std::env::temp_dir().join(format!(
            "todo-server-blocker-{}",
            std::process::id()
        ));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = open(&sqlite_config(blocker.join("todos.db"))).await;
        let _ = std::fs::remove_file(&blocker);

        match result {
            Err(StoreError::Io(_)) | Err(StoreError::Database(_)) => {}
            Err(e) => panic!("unexpected error kind: {}", e),
            Ok(store) => panic!("opened {} store under a file", store.backend_name()),
        }
    }

    #[tokio::test]
    async fn test_open_in_memory_provisions_table() {
        let store = open(&sqlite_config(PathBuf::from(SQLITE_MEMORY_PATH)))
            .await
            .unwrap();

        assert_eq!(store.backend_name(), "sqlite");
        assert!(store.list_all().await.unwrap().is_empty());
    }
}

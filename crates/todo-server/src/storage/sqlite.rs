//! SQLite todo gateway (embedded, no external dependencies)

use super::{schema, TodoRow, TodoStore};
use crate::error::StoreError;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use todo_types::{Todo, TodoId};
use tracing::{debug, info};

pub struct SqliteTodoStore {
    pool: SqlitePool,
}

impl SqliteTodoStore {
    /// Open (creating if missing) the database file and provision the table
    pub async fn open(database_path: &Path, max_connections: u32) -> Result<Self, StoreError> {
        info!("Opening SQLite database at: {}", database_path.display());

        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database
    ///
    /// Every SQLite memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(schema::SQLITE_CREATE_TODOS)
            .execute(&pool)
            .await?;
        info!("SQLite schema ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn list_all(&self) -> Result<Vec<Todo>, StoreError> {
        let rows: Vec<TodoRow> = sqlx::query_as("SELECT id, text FROM todos")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn insert(&self, text: &str) -> Result<Todo, StoreError> {
        let row: TodoRow =
            sqlx::query_as("INSERT INTO todos (text) VALUES (?1) RETURNING id, text")
                .bind(text)
                .fetch_one(&self.pool)
                .await?;

        debug!(id = row.id, "Inserted todo");
        Ok(row.into())
    }

    async fn delete(&self, id: TodoId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_returns_assigned_id() {
        let store = SqliteTodoStore::in_memory().await.unwrap();

        let first = store.insert("buy milk").await.unwrap();
        let second = store.insert("walk dog").await.unwrap();

        assert_eq!(first, Todo::new(1, "buy milk"));
        assert_eq!(second, Todo::new(2, "walk dog"));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = SqliteTodoStore::in_memory().await.unwrap();
        let a = store.insert("a").await.unwrap();
        let b = store.insert("b").await.unwrap();

        let mut all = store.list_all().await.unwrap();
        all.sort_by_key(|t| t.id);
        assert_eq!(all, vec![a.clone(), b.clone()]);

        assert!(store.delete(a.id).await.unwrap());
        assert_eq!(store.list_all().await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = SqliteTodoStore::in_memory().await.unwrap();
        store.insert("keep").await.unwrap();

        assert!(!store.delete(999).await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_never_reused() {
        let store = SqliteTodoStore::in_memory().await.unwrap();
        store.insert("one").await.unwrap();
        let two = store.insert("two").await.unwrap();
        store.delete(two.id).await.unwrap();

        let three = store.insert("three").await.unwrap();
        assert_eq!(three.id, 3);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("todo-server-test-{}", std::process::id()));
        let path = dir.join("nested").join("todos.db");

        let store = SqliteTodoStore::open(&path, 2).await.unwrap();
        store.insert("survives reopen").await.unwrap();
        store.pool.close().await;

        let reopened = SqliteTodoStore::open(&path, 2).await.unwrap();
        let all = reopened.list_all().await.unwrap();
        assert_eq!(all, vec![Todo::new(1, "survives reopen")]);
        reopened.pool.close().await;

        let _ = std::fs::remove_dir_all(&dir);
    }
}

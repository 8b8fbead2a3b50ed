//! PostgreSQL todo gateway

use super::{schema, TodoRow, TodoStore};
use crate::config::DatabaseConfig;
use crate::error::StoreError;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use todo_types::{Todo, TodoId};
use tracing::{debug, info};

pub struct PgTodoStore {
    pool: PgPool,
}

/// Server connection options without a database selected
pub(crate) fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
}

impl PgTodoStore {
    /// Provision the database and table, then open a pool on it
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            "Connecting to PostgreSQL"
        );

        schema::ensure_postgres_database(config).await?;

        let options = connect_options(config).database(&config.name);
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the table if missing
    pub async fn from_pool(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::query(schema::POSTGRES_CREATE_TODOS)
            .execute(&pool)
            .await?;
        info!("PostgreSQL schema ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn list_all(&self) -> Result<Vec<Todo>, StoreError> {
        let rows: Vec<TodoRow> = sqlx::query_as("SELECT id, text FROM todos")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn insert(&self, text: &str) -> Result<Todo, StoreError> {
        let row: TodoRow =
            sqlx::query_as("INSERT INTO todos (text) VALUES ($1) RETURNING id, text")
                .bind(text)
                .fetch_one(&self.pool)
                .await?;

        debug!(id = row.id, "Inserted todo");
        Ok(row.into())
    }

    async fn delete(&self, id: TodoId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
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
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;
    use std::path::PathBuf;

    #[test]
    fn test_connect_options_carry_credentials() {
        let config = DatabaseConfig {
            backend: StoreBackend::Postgres,
            host: "db.internal".to_string(),
            port: 6543,
            user: "todo".to_string(),
            password: "pw".to_string(),
            name: "TodoDb".to_string(),
            max_connections: 4,
            sqlite_path: PathBuf::from("unused.db"),
        };

        let options = connect_options(&config);
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "todo");

        let target = options.database(&config.name);
        assert_eq!(target.get_database(), Some("TodoDb"));
    }
}

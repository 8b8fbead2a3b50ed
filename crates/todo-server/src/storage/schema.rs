//! Schema provisioning
//!
//! Runs once at startup, before any route is registered. Only creates what is
//! missing: never drops or alters existing structures.

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::info;

/// Database every Postgres server has, used to create the target database
pub const MAINTENANCE_DATABASE: &str = "postgres";

pub const POSTGRES_CREATE_TODOS: &str = r#"
    CREATE TABLE IF NOT EXISTS todos (
        id BIGSERIAL PRIMARY KEY,
        text VARCHAR(255) NOT NULL
    )
"#;

// AUTOINCREMENT keeps ids from being reused after the max row is deleted.
pub const SQLITE_CREATE_TODOS: &str = r#"
    CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text VARCHAR(255) NOT NULL
    )
"#;

// SQLSTATE duplicate_database
const DUPLICATE_DATABASE: &str = "42P04";

/// Quote a Postgres identifier, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Create the configured Postgres database if it does not exist
///
/// Losing a creation race to another instance counts as success.
pub async fn ensure_postgres_database(config: &DatabaseConfig) -> Result<(), StoreError> {
    if config.name.is_empty() {
        return Err(StoreError::Schema("database name is empty".to_string()));
    }

    let options = super::postgres::connect_options(config).database(MAINTENANCE_DATABASE);
    let mut conn = PgConnection::connect_with(&options).await?;

    let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(&config.name)
        .fetch_optional(&mut conn)
        .await?;

    if exists.is_some() {
        info!(database = %config.name, "Database already exists");
        conn.close().await?;
        return Ok(());
    }

    let statement = format!("CREATE DATABASE {}", quote_identifier(&config.name));
    match sqlx::query(&statement).execute(&mut conn).await {
        Ok(_) => info!(database = %config.name, "Database created"),
        // Another instance created it between our check and create
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(DUPLICATE_DATABASE) => {
            info!(database = %config.name, "Database created concurrently");
        }
        Err(e) => return Err(e.into()),
    }

    conn.close().await?;
    Ok(())
}

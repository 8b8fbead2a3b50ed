//! Server configuration
//!
//! Settings come from environment variables layered over built-in defaults.
//! Keys are flat and case-insensitive: `DB_HOST` maps to `db_host`.

use config::{Config as ConfigLoader, ConfigError as LoaderError, Environment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: i64 = 5432;
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "your_password";
const DEFAULT_DB_NAME: &str = "TodoDb";
const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
const DEFAULT_SQLITE_PATH: &str = "data/todos.db";
const DEFAULT_REDIS_HOST: &str = "localhost";
const DEFAULT_REDIS_PORT: i64 = 6379;
const DEFAULT_CACHE_TTL_SECS: i64 = 60;
const DEFAULT_OP_TIMEOUT_MS: i64 = 5000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] LoaderError),

    #[error("Invalid bind address '{0}'")]
    BindAddress(String),

    #[error("Unknown database backend '{0}' (expected 'postgres' or 'sqlite')")]
    StoreBackend(String),

    #[error("Unknown cache backend '{0}' (expected 'redis' or 'memory')")]
    CacheBackend(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Relational store backing the todo table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(ConfigError::StoreBackend(other.to_string())),
        }
    }
}

/// Cache holding the collection snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(ConfigError::CacheBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub sqlite_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: Option<String>,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    /// Upper bound for any single store or cache round trip
    pub op_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    bind_address: String,
    db_backend: String,
    db_host: String,
    db_port: u16,
    db_user: String,
    db_password: String,
    db_name: String,
    db_max_connections: u32,
    sqlite_path: String,
    cache_backend: String,
    redis_host: String,
    redis_port: u16,
    #[serde(default)]
    redis_password: Option<String>,
    cache_ttl_secs: u64,
    op_timeout_ms: u64,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default())
    }

    /// Load configuration from an explicit set of variables
    #[cfg(test)]
    pub fn from_vars(vars: config::Map<String, String>) -> Result<Self, ConfigError> {
        Self::load(Environment::default().source(Some(vars)))
    }

    fn load(env: Environment) -> Result<Self, ConfigError> {
        let raw: RawSettings = ConfigLoader::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("db_backend", "postgres")?
            .set_default("db_host", DEFAULT_DB_HOST)?
            .set_default("db_port", DEFAULT_DB_PORT)?
            .set_default("db_user", DEFAULT_DB_USER)?
            .set_default("db_password", DEFAULT_DB_PASSWORD)?
            .set_default("db_name", DEFAULT_DB_NAME)?
            .set_default("db_max_connections", DEFAULT_DB_MAX_CONNECTIONS)?
            .set_default("sqlite_path", DEFAULT_SQLITE_PATH)?
            .set_default("cache_backend", "redis")?
            .set_default("redis_host", DEFAULT_REDIS_HOST)?
            .set_default("redis_port", DEFAULT_REDIS_PORT)?
            .set_default("cache_ttl_secs", DEFAULT_CACHE_TTL_SECS)?
            .set_default("op_timeout_ms", DEFAULT_OP_TIMEOUT_MS)?
            .add_source(env)
            .build()?
            .try_deserialize()?;

        raw.try_into()
    }
}

impl TryFrom<RawSettings> for Config {
    type Error = ConfigError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let bind_address = raw
            .bind_address
            .parse()
            .map_err(|_| ConfigError::BindAddress(raw.bind_address.clone()))?;

        if raw.cache_ttl_secs == 0 {
            return Err(ConfigError::Zero("CACHE_TTL_SECS"));
        }
        if raw.op_timeout_ms == 0 {
            return Err(ConfigError::Zero("OP_TIMEOUT_MS"));
        }
        if raw.db_max_connections == 0 {
            return Err(ConfigError::Zero("DB_MAX_CONNECTIONS"));
        }

        Ok(Config {
            bind_address,
            database: DatabaseConfig {
                backend: raw.db_backend.parse()?,
                host: raw.db_host,
                port: raw.db_port,
                user: raw.db_user,
                password: raw.db_password,
                name: raw.db_name,
                max_connections: raw.db_max_connections,
                sqlite_path: PathBuf::from(raw.sqlite_path),
            },
            cache: CacheConfig {
                backend: raw.cache_backend.parse()?,
                redis_host: raw.redis_host,
                redis_port: raw.redis_port,
                redis_password: raw.redis_password.filter(|p| !p.is_empty()),
                ttl: Duration::from_secs(raw.cache_ttl_secs),
            },
            op_timeout: Duration::from_millis(raw.op_timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(Map::new()).unwrap();

        assert_eq!(config.bind_address.port(), 5000);
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "TodoDb");
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.redis_port, 6379);
        assert_eq!(config.cache.redis_password, None);
        assert_eq!(config.cache.ttl, Duration::from_secs(60));
        assert_eq!(config.op_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_vars(vars(&[
            ("DB_BACKEND", "sqlite"),
            ("DB_HOST", "db.internal"),
            ("DB_NAME", "Todos"),
            ("SQLITE_PATH", "/tmp/todos.db"),
            ("CACHE_BACKEND", "memory"),
            ("REDIS_HOST", "cache.internal"),
            ("REDIS_PORT", "6380"),
            ("REDIS_PASSWORD", "s3cret"),
            ("CACHE_TTL_SECS", "5"),
            ("BIND_ADDRESS", "127.0.0.1:8080"),
        ]))
        .unwrap();

        assert_eq!(config.database.backend, StoreBackend::Sqlite);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.name, "Todos");
        assert_eq!(config.database.sqlite_path, PathBuf::from("/tmp/todos.db"));
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.redis_host, "cache.internal");
        assert_eq!(config.cache.redis_port, 6380);
        assert_eq!(config.cache.redis_password.as_deref(), Some("s3cret"));
        assert_eq!(config.cache.ttl, Duration::from_secs(5));
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_empty_redis_password_is_unset() {
        let config = Config::from_vars(vars(&[("REDIS_PASSWORD", "")])).unwrap();
        assert_eq!(config.cache.redis_password, None);
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let err = Config::from_vars(vars(&[("CACHE_BACKEND", "memcached")])).unwrap_err();
        assert!(matches!(err, ConfigError::CacheBackend(name) if name == "memcached"));
    }

    #[test]
    fn test_rejects_zero_ttl() {
        let err = Config::from_vars(vars(&[("CACHE_TTL_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Zero("CACHE_TTL_SECS")));
    }
}

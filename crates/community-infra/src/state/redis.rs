//! Redis state store, for clients that share their state across machines.
//!
//! Slots are plain string keys under a configurable prefix, so several
//! clients (or test runs) can share one Redis database.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use community_core::ports::{StateStore, StateStoreError};

const DEFAULT_URL: &str = "redis://localhost:6379";
const DEFAULT_PREFIX: &str = "community:";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// Prepended to every slot key, e.g. `community:fast-community-user`.
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            key_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl RedisConfig {
    /// `REDIS_URL`, `REDIS_CONNECT_TIMEOUT_SECS` and `REDIS_KEY_PREFIX`,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let connect_timeout = std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.connect_timeout);

        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout,
            key_prefix: std::env::var("REDIS_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }
}

/// Session and token slots kept in Redis strings.
///
/// The connection manager reconnects on its own after a dropped link.
pub struct RedisStateStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisStateStore {
    pub async fn new(config: RedisConfig) -> Result<Self, StateStoreError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| StateStoreError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                StateStoreError::Connection(format!(
                    "no answer from {} within {:?}",
                    config.url, config.connect_timeout
                ))
            })?
            .map_err(|e| StateStoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, prefix = %config.key_prefix, "Using Redis state store");

        Ok(Self {
            conn,
            key_prefix: config.key_prefix,
        })
    }

    fn slot(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    fn failed(op: &'static str, key: &str, e: redis::RedisError) -> StateStoreError {
        tracing::warn!(key = %key, error = %e, "Redis {op} failed");
        StateStoreError::Operation(e.to_string())
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateStoreError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(self.slot(key))
            .await
            .map_err(|e| Self::failed("GET", key, e))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StateStoreError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(self.slot(key), value)
            .await
            .map_err(|e| Self::failed("SET", key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), StateStoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.slot(key))
            .await
            .map_err(|e| Self::failed("DEL", key, e))
    }
}

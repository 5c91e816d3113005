//! Redis cache store

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::info;

use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

use super::in_memory::MAX_ENTRY_TTL;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    /// `SCAN MATCH` pattern for a store pattern; the prefix is always literal
    fn match_pattern(&self, pattern: &str) -> String {
        let pattern = escape_glob(pattern, true);

        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", escape_glob(prefix, false), pattern),
            None => pattern,
        }
    }
}

/// Escapes redis glob syntax; `*` stays a wildcard when `keep_star` is set
fn escape_glob(input: &str, keep_star: bool) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '*' if keep_star => escaped.push(c),
            '*' | '?' | '[' | ']' | '\\' | '^' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }

    escaped
}

/// Redis-backed cache store
///
/// Every redis failure surfaces as [`DomainError::StoreUnavailable`];
/// retries are left to the caller.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

fn unavailable(action: &str, key: &str, e: redis::RedisError) -> DomainError {
    DomainError::store_unavailable(format!("Failed to {} '{}': {}", action, key, e))
}

/// Redis expiry in milliseconds, between one and [`MAX_ENTRY_TTL`]
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.min(MAX_ENTRY_TTL).as_millis())
        .unwrap_or(u64::MAX)
        .max(1)
}

impl RedisCache {
    /// Connects to Redis, bounded by the configured connection timeout
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            DomainError::configuration(format!("Failed to create Redis client: {}", e))
        })?;

        let connection =
            tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
                .await
                .map_err(|_| {
                    DomainError::store_unavailable(format!(
                        "Timed out connecting to Redis after {:?}",
                        config.connection_timeout
                    ))
                })?
                .map_err(|e| {
                    DomainError::store_unavailable(format!("Failed to connect to Redis: {}", e))
                })?;

        info!(url = %config.url, prefix = ?config.key_prefix, "Connected to Redis");

        Ok(Self { connection, config })
    }

    /// Creates a Redis cache with default configuration
    pub async fn with_url(url: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(RedisCacheConfig::new(url)).await
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| unavailable("scan keys with pattern", pattern, e))?;

            found.extend(keys);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(found)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        conn.get(&prefixed_key)
            .await
            .map_err(|e| unavailable("get key", key, e))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        let _: () = conn
            .pset_ex(&prefixed_key, value, ttl_millis(ttl))
            .await
            .map_err(|e| unavailable("set key", key, e))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = conn
            .del(&prefixed_key)
            .await
            .map_err(|e| unavailable("delete key", key, e))?;

        Ok(deleted > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let keys = self.scan_keys(&self.config.match_pattern(pattern)).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection.clone();
        let deleted: usize = conn
            .del(&keys)
            .await
            .map_err(|e| unavailable("delete keys matching", pattern, e))?;

        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        conn.exists(&prefixed_key)
            .await
            .map_err(|e| unavailable("check existence of key", key, e))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_ms: i64 = conn
            .pttl(&prefixed_key)
            .await
            .map_err(|e| unavailable("get TTL for key", key, e))?;

        // -2: key missing, -1: no expiry
        if ttl_ms < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_millis(ttl_ms as u64)))
        }
    }

    async fn clear(&self) -> Result<(), DomainError> {
        // Without a prefix the whole database belongs to this store
        match &self.config.key_prefix {
            Some(_) => {
                self.delete_pattern("*").await?;
            }
            None => {
                let mut conn = self.connection.clone();
                redis::cmd("FLUSHDB")
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(|e| unavailable("flush", "database", e))?;
            }
        }

        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        match &self.config.key_prefix {
            Some(_) => Ok(self.scan_keys(&self.config.match_pattern("*")).await?.len()),
            None => {
                let mut conn = self.connection.clone();
                redis::cmd("DBSIZE")
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| unavailable("get size of", "database", e))
            }
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("ping", &self.config.url, e))?;

        Ok(())
    }
}

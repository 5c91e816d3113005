//! In-memory cache store using moka

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::Expiry;
use tokio::time::Instant;

use crate::domain::cache::{pattern_regex, CacheStore};
use crate::domain::DomainError;

/// Longest TTL an entry is kept for; larger TTLs are clamped to it
pub const MAX_ENTRY_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Time to idle - entries not accessed for this duration are evicted
    pub time_to_idle: Option<Duration>,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            time_to_idle: None,
        }
    }
}

impl InMemoryCacheConfig {
    /// Creates a new configuration with specified max capacity
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Sets the time-to-idle duration
    pub fn with_time_to_idle(mut self, tti: Duration) -> Self {
        self.time_to_idle = Some(tti);
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized JSON value
    data: String,
    /// TTL the entry was written with, clamped to [`MAX_ENTRY_TTL`]
    ttl: Duration,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: &str, ttl: Duration) -> Self {
        let ttl = ttl.min(MAX_ENTRY_TTL);

        Self {
            data: data.to_string(),
            ttl,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Lets moka evict each entry after its own TTL
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Thread-safe in-memory store backed by moka
///
/// Features:
/// - TTL per entry, checked on every read and enforced by moka eviction
/// - Bounded capacity with moka's TinyLFU eviction
/// - Optional time-to-idle eviction
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    config: InMemoryCacheConfig,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let mut builder = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry);

        if let Some(tti) = config.time_to_idle {
            builder = builder.time_to_idle(tti);
        }

        Self {
            cache: builder.build(),
            config,
        }
    }

    /// The configuration this store was built with
    pub fn config(&self) -> &InMemoryCacheConfig {
        &self.config
    }

    /// Returns the live entry, dropping it if it has expired
    async fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.cache.get(key).await?;

        if entry.is_expired() {
            self.cache.remove(key).await;
            return None;
        }

        Some(entry)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.live_entry(key).await.map(|entry| entry.data))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        self.cache
            .insert(key.to_string(), CacheEntry::new(value, ttl))
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let regex = pattern_regex(pattern)?;

        self.cache.run_pending_tasks().await;

        let cache_clone = self.cache.clone();
        let keys_to_delete: Vec<String> = tokio::task::spawn_blocking(move || {
            cache_clone
                .iter()
                .filter(|(k, _)| regex.is_match(k.as_str()))
                .map(|(k, _)| k.to_string())
                .collect()
        })
        .await
        .map_err(|e| DomainError::store_unavailable(format!("Failed to iterate cache: {}", e)))?;

        let mut deleted = 0;

        for key in keys_to_delete {
            if self.cache.remove(&key).await.is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.live_entry(key).await.is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        Ok(self.live_entry(key).await.map(|entry| entry.remaining()))
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheStoreExt;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = InMemoryCache::new();

        let result: Option<String> = cache.get("missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.delete("key1").await.unwrap());
        assert!(!cache.delete("key1").await.unwrap());

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiration() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(3600))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert!(cache.exists("key1").await.unwrap());

        tokio::time::advance(Duration::from_secs(1)).await;
        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_ttl_is_clamped() {
        let cache = InMemoryCache::new();

        cache
            .set("forever", &"value", Duration::MAX)
            .await
            .unwrap();

        let result: Option<String> = cache.get("forever").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
        assert_eq!(cache.ttl("forever").await.unwrap(), Some(MAX_ENTRY_TTL));

        tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;
        assert!(cache.exists("forever").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_remaining() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(15)).await;

        let remaining = cache.ttl("key1").await.unwrap();
        assert_eq!(remaining, Some(Duration::from_secs(45)));
        assert!(cache.ttl("missing").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_expiration() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &1, Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        cache
            .set("key1", &2, Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        let result: Option<i32> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some(2));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("key2", &"value2", Duration::from_secs(60))
            .await
            .unwrap();

        cache.clear().await.unwrap();

        let size = cache.size().await.unwrap();
        assert_eq!(size, 0);
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = InMemoryCache::new();

        cache
            .set("views:user:1", &"data1", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("views:user:2", &"data2", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("other:key", &"data3", Duration::from_secs(60))
            .await
            .unwrap();

        let deleted = cache.delete_pattern("views:*").await.unwrap();
        assert_eq!(deleted, 2);

        let size = cache.size().await.unwrap();
        assert_eq!(size, 1);
        assert!(cache.exists("other:key").await.unwrap());
    }

    #[tokio::test]
    async fn test_ping_always_succeeds() {
        let cache = InMemoryCache::new();
        assert!(cache.ping().await.is_ok());
    }

    #[test]
    fn test_config() {
        let config = InMemoryCacheConfig::default()
            .with_max_capacity(100)
            .with_time_to_idle(Duration::from_secs(60));

        let cache = InMemoryCache::with_config(config);

        assert_eq!(cache.config().max_capacity, 100);
        assert_eq!(cache.config().time_to_idle, Some(Duration::from_secs(60)));
    }
}

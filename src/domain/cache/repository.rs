//! Cache store trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Key-value store with per-entry TTL that the cache facade delegates to
///
/// Values are JSON strings so the trait stays dyn-compatible.
/// Use [`CacheStoreExt`] for typed get/set operations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Gets a raw JSON value, `None` when absent or expired
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw JSON value that expires after `ttl`
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a value from the store
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Deletes every key matching `pattern`
    ///
    /// `*` matches any run of characters; every other character, including
    /// `?`, `[` and `]`, matches itself.
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError>;

    /// Checks if a live entry exists for the key
    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Gets the remaining TTL for a key
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError>;

    /// Clears all entries owned by this store
    async fn clear(&self) -> Result<(), DomainError>;

    /// Returns approximate number of entries
    async fn size(&self) -> Result<usize, DomainError>;

    /// Verifies the store can be reached
    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Extension trait providing typed get/set operations
pub trait CacheStoreExt: CacheStore {
    /// Gets a typed value from the store
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::serialization(format!(
                            "Failed to deserialize cache value: {}",
                            e
                        ))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Sets a typed value with a TTL
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::serialization(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

impl<T: CacheStore + ?Sized> CacheStoreExt for T {}

/// Compiles a `*` glob into an anchored regex
pub(crate) fn pattern_regex(pattern: &str) -> Result<Regex, DomainError> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");

    Regex::new(&format!("^{}$", escaped))
        .map_err(|e| DomainError::validation(format!("Invalid pattern: {}", e)))
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct MockEntry {
        data: String,
        ttl: Duration,
        expired: bool,
    }

    /// In-process store for tests with error injection and forced expiry
    #[derive(Debug, Default)]
    pub struct MockCache {
        entries: Mutex<HashMap<String, MockEntry>>,
        error: Mutex<Option<String>>,
        writes: AtomicUsize,
    }

    impl MockCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_entry<V: Serialize>(self, key: &str, value: &V, ttl: Duration) -> Self {
            let data = serde_json::to_string(value).unwrap();
            self.entries.lock().unwrap().insert(
                key.to_string(),
                MockEntry {
                    data,
                    ttl,
                    expired: false,
                },
            );
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            self.set_error(error);
            self
        }

        /// Makes every following call fail as if the store were down
        pub fn set_error(&self, error: impl Into<String>) {
            *self.error.lock().unwrap() = Some(error.into());
        }

        /// Marks the entry as expired without removing it
        pub fn expire(&self, key: &str) {
            if let Some(entry) = self.entries.lock().unwrap().get_mut(key) {
                entry.expired = true;
            }
        }

        /// Number of successful `set_raw` calls
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// TTL the entry was written with, regardless of expiry
        pub fn stored_ttl(&self, key: &str) -> Option<Duration> {
            self.entries.lock().unwrap().get(key).map(|e| e.ttl)
        }

        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::store_unavailable(error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheStore for MockCache {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.check_error()?;
            let entries = self.entries.lock().unwrap();

            Ok(entries
                .get(key)
                .filter(|e| !e.expired)
                .map(|e| e.data.clone()))
        }

        async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
            self.check_error()?;
            self.entries.lock().unwrap().insert(
                key.to_string(),
                MockEntry {
                    data: value.to_string(),
                    ttl,
                    expired: false,
                },
            );
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
            self.check_error()?;
            let regex = pattern_regex(pattern)?;

            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|k, _| !regex.is_match(k));

            Ok(before - entries.len())
        }

        async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
            self.check_error()?;
            let entries = self.entries.lock().unwrap();

            Ok(entries.get(key).filter(|e| !e.expired).map(|e| e.ttl))
        }

        async fn clear(&self) -> Result<(), DomainError> {
            self.check_error()?;
            self.entries.lock().unwrap().clear();
            Ok(())
        }

        async fn size(&self) -> Result<usize, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().len())
        }

        async fn ping(&self) -> Result<(), DomainError> {
            self.check_error()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_cache_set_get() {
            let cache = MockCache::new();
            cache
                .set("key1", &"value1", Duration::from_secs(60))
                .await
                .unwrap();

            let result: Option<String> = cache.get("key1").await.unwrap();
            assert_eq!(result, Some("value1".to_string()));
            assert_eq!(cache.write_count(), 1);
        }

        #[tokio::test]
        async fn test_mock_cache_expire() {
            let cache = MockCache::new().with_entry("key1", &1, Duration::from_secs(60));

            cache.expire("key1");

            let result: Option<i32> = cache.get("key1").await.unwrap();
            assert!(result.is_none());
            assert!(!cache.exists("key1").await.unwrap());
        }

        #[tokio::test]
        async fn test_mock_cache_with_error() {
            let cache = MockCache::new().with_error("connection refused");

            let result: Result<Option<String>, _> = cache.get("key").await;
            assert!(matches!(result, Err(DomainError::StoreUnavailable { .. })));
            assert!(cache.ping().await.is_err());
        }

        #[tokio::test]
        async fn test_mock_cache_delete_pattern() {
            let cache = MockCache::new();
            cache
                .set("user:1:profile", &"data1", Duration::from_secs(60))
                .await
                .unwrap();
            cache
                .set("user:2:profile", &"data2", Duration::from_secs(60))
                .await
                .unwrap();
            cache
                .set("other:key", &"data3", Duration::from_secs(60))
                .await
                .unwrap();

            let deleted = cache.delete_pattern("user:*:profile").await.unwrap();
            assert_eq!(deleted, 2);
            assert_eq!(cache.keys(), vec!["other:key".to_string()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_regex_anchored() {
        let regex = pattern_regex("views:*").unwrap();

        assert!(regex.is_match("views:user:1"));
        assert!(!regex.is_match("other:views:user:1"));
    }

    #[test]
    fn test_pattern_regex_escapes_metacharacters() {
        let regex = pattern_regex("a.b:*").unwrap();

        assert!(regex.is_match("a.b:c"));
        assert!(!regex.is_match("axb:c"));
    }

    #[tokio::test]
    async fn test_mockall_store_default_exists() {
        let mut store = MockCacheStore::new();
        store
            .expect_exists()
            .returning(|_| Err(DomainError::store_unavailable("down")));

        let result = store.exists("key").await;
        assert!(result.is_err());
    }
}

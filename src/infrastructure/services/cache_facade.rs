//! Memoizing cache facade

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::domain::cache::{
    CacheKey, CacheStore, CacheStoreExt, Cacheable, ExpirationPolicy, DIGEST_LEN, KEY_SEPARATOR,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::{
    record_cache_lookup, record_compute_duration, LookupOutcome,
};

/// Configuration for the cache facade
#[derive(Debug, Clone)]
pub struct CacheFacadeConfig {
    /// Namespace prepended to every key
    pub namespace: Option<String>,
    /// Policy used when the caller does not pass a TTL
    pub default_expiration: ExpirationPolicy,
    /// Keys longer than this are shortened with a digest
    pub max_key_length: Option<usize>,
    /// Whether caching is enabled
    pub enabled: bool,
}

impl Default for CacheFacadeConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            default_expiration: ExpirationPolicy::default(),
            max_key_length: Some(250),
            enabled: true,
        }
    }
}

impl CacheFacadeConfig {
    /// Sets the key namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Overrides the default expiration policy
    pub fn with_default_expiration(mut self, policy: impl Into<ExpirationPolicy>) -> Self {
        self.default_expiration = policy.into();
        self
    }

    /// Sets the maximum stored key length, `None` disables shortening
    pub fn with_max_key_length(mut self, max: Option<usize>) -> Self {
        self.max_key_length = max;
        self
    }

    /// Disables caching; every call computes
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Smallest `max_key_length` for which shortened keys stay within the
    /// limit and keep the namespace as their first component
    pub fn min_key_length(&self) -> usize {
        let namespace = self
            .namespace
            .as_ref()
            .map_or(0, |ns| ns.len() + KEY_SEPARATOR.len());

        namespace + 1 + KEY_SEPARATOR.len() + DIGEST_LEN
    }

    /// Checks the namespace and key length limit
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(namespace) = &self.namespace {
            if namespace.trim().is_empty() {
                return Err(DomainError::configuration("namespace must not be blank"));
            }
        }

        if let Some(max) = self.max_key_length {
            let min = self.min_key_length();

            if max < min {
                return Err(DomainError::configuration(format!(
                    "max_key_length {} is below the minimum of {} for this namespace",
                    max, min
                )));
            }
        }

        Ok(())
    }
}

/// Returns a stored value for a key or computes, stores and returns it
///
/// The facade holds no state besides the store handle and its
/// configuration. Two concurrent misses for the same key may both compute
/// and both write; the store decides which write wins.
#[derive(Debug, Clone)]
pub struct CacheFacade {
    store: Arc<dyn CacheStore>,
    config: CacheFacadeConfig,
}

impl CacheFacade {
    /// Creates a facade with the default configuration
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_config(store, CacheFacadeConfig::default())
    }

    /// Creates a facade with a custom configuration
    pub fn with_config(store: Arc<dyn CacheStore>, config: CacheFacadeConfig) -> Self {
        Self { store, config }
    }

    /// The store this facade delegates to
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Policy applied by [`CacheFacade::get_or_set_cache_default`]
    pub fn default_expiration(&self) -> ExpirationPolicy {
        self.config.default_expiration
    }

    /// Checks if caching is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Key actually sent to the store
    pub fn storage_key(&self, key: &CacheKey) -> Result<String, DomainError> {
        let key = match &self.config.namespace {
            Some(namespace) => key.with_namespace(namespace)?,
            None => key.clone(),
        };

        Ok(key.normalized(self.config.max_key_length))
    }

    /// Returns the value cached under `key`, or runs `compute` and caches its
    /// result for `ttl`
    ///
    /// `compute` runs only on a miss. Its error is returned unchanged and
    /// nothing is written. Store failures are converted into the caller's
    /// error type through `From<DomainError>`.
    pub async fn get_or_set_cache<V, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        V: Serialize + DeserializeOwned + Send + Sync,
        E: From<DomainError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if ttl.is_zero() {
            return Err(DomainError::validation("ttl must be a positive duration").into());
        }

        if !self.config.enabled {
            record_cache_lookup(LookupOutcome::Bypassed);
            return compute().await;
        }

        let storage_key = self.storage_key(key)?;

        if let Some(value) = self.lookup(&storage_key).await? {
            debug!(key = %storage_key, "Cache hit");
            record_cache_lookup(LookupOutcome::Hit);
            return Ok(value);
        }

        debug!(key = %storage_key, ttl_secs = ttl.as_secs(), "Cache miss, computing value");

        let started = Instant::now();
        let value = compute().await.inspect_err(|_| {
            record_cache_lookup(LookupOutcome::ComputeFailed);
        })?;
        record_compute_duration(started.elapsed());

        self.store
            .set(&storage_key, &value, ttl)
            .await
            .inspect_err(|e| {
                warn!(key = %storage_key, error = %e, "Failed to store computed value");
                record_cache_lookup(LookupOutcome::StoreFailed);
            })?;

        record_cache_lookup(LookupOutcome::Miss);

        Ok(value)
    }

    /// Like [`CacheFacade::get_or_set_cache`] with the default expiration
    pub async fn get_or_set_cache_default<V, E, F, Fut>(
        &self,
        key: &CacheKey,
        compute: F,
    ) -> Result<V, E>
    where
        V: Serialize + DeserializeOwned + Send + Sync,
        E: From<DomainError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let ttl = self.config.default_expiration.resolve()?;
        self.get_or_set_cache(key, ttl, compute).await
    }

    /// Caches `compute` under the key and expiration derived from `source`
    pub async fn fetch<S, V, E, F, Fut>(&self, source: &S, compute: F) -> Result<V, E>
    where
        S: Cacheable + ?Sized,
        V: Serialize + DeserializeOwned + Send + Sync,
        E: From<DomainError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = source.cache_key()?;
        let ttl = source.expiration_policy().resolve()?;
        self.get_or_set_cache(&key, ttl, compute).await
    }

    /// Reads a cached value without computing
    pub async fn read<V>(&self, key: &CacheKey) -> Result<Option<V>, DomainError>
    where
        V: DeserializeOwned + Send,
    {
        let storage_key = self.storage_key(key)?;
        self.store.get(&storage_key).await
    }

    /// Writes a value unconditionally
    pub async fn write<V>(&self, key: &CacheKey, value: &V, ttl: Duration) -> Result<(), DomainError>
    where
        V: Serialize + Send + Sync,
    {
        if ttl.is_zero() {
            return Err(DomainError::validation("ttl must be a positive duration"));
        }

        let storage_key = self.storage_key(key)?;
        self.store.set(&storage_key, value, ttl).await
    }

    /// Removes the entry for `key`
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool, DomainError> {
        let storage_key = self.storage_key(key)?;
        self.store.delete(&storage_key).await
    }

    /// Removes every entry under the configured namespace
    pub async fn invalidate_namespace(&self) -> Result<usize, DomainError> {
        let namespace = self.config.namespace.as_deref().ok_or_else(|| {
            DomainError::configuration("No namespace configured for this cache facade")
        })?;

        self.store.delete_pattern(&format!("{}:*", namespace)).await
    }

    async fn lookup<V>(&self, storage_key: &str) -> Result<Option<V>, DomainError>
    where
        V: DeserializeOwned,
    {
        let raw = self.store.get_raw(storage_key).await.inspect_err(|_| {
            record_cache_lookup(LookupOutcome::StoreFailed);
        })?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = %storage_key, error = %e, "Cached value has an unexpected shape, recomputing");
                Ok(None)
            }
        }
    }
}

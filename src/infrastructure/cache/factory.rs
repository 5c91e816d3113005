//! Store construction from [`CacheSettings`]

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::CacheSettings;
use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Backend selected by `cache.cache_type`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheType {
    #[default]
    InMemory,
    Redis,
}

impl CacheType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InMemory => "in_memory",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            other => Err(DomainError::configuration(format!(
                "unsupported cache_type '{}', expected in_memory or redis",
                other
            ))),
        }
    }
}

/// Builds the store handle described by `settings`
///
/// Redis stores connect eagerly, so an unreachable server fails here with
/// [`DomainError::StoreUnavailable`] rather than on first use.
pub async fn create_store(settings: &CacheSettings) -> Result<Arc<dyn CacheStore>, DomainError> {
    let cache_type: CacheType = settings.cache_type.parse()?;

    debug!(cache_type = %cache_type, "Creating cache store");

    let store: Arc<dyn CacheStore> = match cache_type {
        CacheType::InMemory => Arc::new(InMemoryCache::with_config(in_memory_config(settings)?)),
        CacheType::Redis => Arc::new(RedisCache::new(redis_config(settings)?).await?),
    };

    Ok(store)
}

fn in_memory_config(settings: &CacheSettings) -> Result<InMemoryCacheConfig, DomainError> {
    let config = InMemoryCacheConfig::default().with_max_capacity(settings.max_capacity);

    match settings.time_to_idle_secs {
        Some(0) => Err(DomainError::configuration(
            "time_to_idle_secs must be greater than zero",
        )),
        Some(secs) => Ok(config.with_time_to_idle(Duration::from_secs(secs))),
        None => Ok(config),
    }
}

fn redis_config(settings: &CacheSettings) -> Result<RedisCacheConfig, DomainError> {
    let url = settings
        .redis_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| DomainError::configuration("redis_url is required when cache_type is redis"))?;

    if settings.connection_timeout_secs == 0 {
        return Err(DomainError::configuration(
            "connection_timeout_secs must be greater than zero",
        ));
    }

    let config = RedisCacheConfig::new(url)
        .with_connection_timeout(Duration::from_secs(settings.connection_timeout_secs));

    Ok(match &settings.key_prefix {
        Some(prefix) => config.with_key_prefix(prefix.clone()),
        None => config,
    })
}

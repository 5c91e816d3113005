//! Cache Facade
//!
//! A key-derived memoizing cache in front of a TTL key-value store:
//! - Deterministic cache keys, including record-backed keys
//! - Fixed or count-scaled expiration policies
//! - In-memory (moka) and Redis stores selected by configuration
//! - Caller errors pass through untouched

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;
pub use domain::{CacheKey, CacheStore, Cacheable, DomainError, ExpirationPolicy};
pub use infrastructure::services::{CacheFacade, CacheFacadeConfig};

use std::time::Duration;

use crate::config::CacheSettings;
use infrastructure::cache::create_store;
use tracing::info;

/// Create a facade over an in-memory store with default configuration
pub async fn create_facade() -> Result<CacheFacade, DomainError> {
    create_facade_with_config(&AppConfig::default()).await
}

/// Create the store handle and the facade from configuration
///
/// The facade configuration is checked before the store is created, so a
/// bad setting never opens a connection. The returned facade owns the only
/// handle to the store; dropping it releases the store.
pub async fn create_facade_with_config(config: &AppConfig) -> Result<CacheFacade, DomainError> {
    let facade_config = facade_config_from_settings(&config.cache)?;
    let store = create_store(&config.cache).await?;

    info!(
        cache_type = %config.cache.cache_type,
        namespace = ?facade_config.namespace,
        enabled = facade_config.enabled,
        "Cache facade ready"
    );

    Ok(CacheFacade::with_config(store, facade_config))
}

fn facade_config_from_settings(settings: &CacheSettings) -> Result<CacheFacadeConfig, DomainError> {
    let default_expiration =
        ExpirationPolicy::fixed(Duration::from_secs(settings.default_ttl_secs));

    default_expiration
        .resolve()
        .map_err(|_| DomainError::configuration("default_ttl_secs must be greater than zero"))?;

    let mut config = CacheFacadeConfig::default()
        .with_default_expiration(default_expiration)
        .with_max_key_length(settings.max_key_length);

    if let Some(namespace) = &settings.namespace {
        config = config.with_namespace(namespace.clone());
    }

    if !settings.enabled {
        config = config.disabled();
    }

    config.validate()?;

    Ok(config)
}

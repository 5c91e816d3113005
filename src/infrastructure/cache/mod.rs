//! Cache infrastructure - Store implementations

mod factory;
mod in_memory;
mod redis;

pub use factory::{create_store, CacheType};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig, MAX_ENTRY_TTL};
pub use self::redis::{RedisCache, RedisCacheConfig};

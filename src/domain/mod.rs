//! Domain layer - Cache keys, expiration policies and errors

pub mod cache;
pub mod error;

pub use cache::{
    CacheKey, CacheKeyBuilder, CacheKeyPart, CacheStore, CacheStoreExt, Cacheable,
    ExpirationPolicy, DEFAULT_EXPIRES_IN,
};
pub use error::DomainError;

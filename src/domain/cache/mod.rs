//! Cache domain - Keys, expiration policies and the store abstraction

mod cacheable;
mod expiration;
mod key;
mod repository;

pub use cacheable::Cacheable;
pub use expiration::{ExpirationPolicy, DEFAULT_EXPIRES_IN};
pub use key::{CacheKey, CacheKeyBuilder, CacheKeyPart, DIGEST_LEN, KEY_SEPARATOR};
pub use repository::{CacheStore, CacheStoreExt};

pub(crate) use repository::pattern_regex;

#[cfg(test)]
pub use repository::mock::MockCache;
#[cfg(test)]
pub use repository::MockCacheStore;

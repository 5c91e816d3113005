use super::{CacheKey, ExpirationPolicy};
use crate::domain::DomainError;

/// A type that knows how to address its own cached result
///
/// Implementors derive a deterministic key from their state and may
/// override how long the computed value should live.
pub trait Cacheable {
    /// Derives the cache key from the current state
    fn cache_key(&self) -> Result<CacheKey, DomainError>;

    /// Expiration for values cached under [`Cacheable::cache_key`]
    fn expiration_policy(&self) -> ExpirationPolicy {
        ExpirationPolicy::default()
    }
}

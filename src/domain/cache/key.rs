//! Cache key derivation

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};

use crate::domain::DomainError;

/// Separator placed between key components
pub const KEY_SEPARATOR: &str = ":";

/// Length of [`CacheKey::digest`], hex-encoded SHA-256
pub const DIGEST_LEN: usize = 64;

/// Trait for values that can become a single cache key component
pub trait CacheKeyPart {
    /// Returns the component string for this value
    fn to_key_part(&self) -> String;
}

impl CacheKeyPart for str {
    fn to_key_part(&self) -> String {
        self.to_string()
    }
}

impl CacheKeyPart for String {
    fn to_key_part(&self) -> String {
        self.clone()
    }
}

impl<T: CacheKeyPart + ?Sized> CacheKeyPart for &T {
    fn to_key_part(&self) -> String {
        (**self).to_key_part()
    }
}

macro_rules! integer_key_part {
    ($($ty:ty),*) => {
        $(
            impl CacheKeyPart for $ty {
                fn to_key_part(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_key_part!(u16, u32, u64, usize, i16, i32, i64);

impl CacheKeyPart for NaiveDate {
    fn to_key_part(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

/// Timestamps are rendered with microsecond precision so that two updates
/// within the same second still produce different keys.
impl CacheKeyPart for DateTime<Utc> {
    fn to_key_part(&self) -> String {
        self.format("%Y%m%d%H%M%S%6f").to_string()
    }
}

/// A deterministic cache key made of one or more components
///
/// Components are joined with [`KEY_SEPARATOR`] into the lookup string.
/// Construction fails when there are no components or when a component
/// is blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    components: Vec<String>,
    joined: String,
}

impl CacheKey {
    /// Creates a key from the given components
    pub fn new<I, P>(parts: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = P>,
        P: CacheKeyPart,
    {
        let components = parts.into_iter().map(|p| p.to_key_part()).collect();
        Self::from_components(components)
    }

    /// Starts building a key component by component
    pub fn builder() -> CacheKeyBuilder {
        CacheKeyBuilder::default()
    }

    /// Creates a record-backed key from a record name, its identity and its
    /// last modification time
    pub fn for_record(
        name: &str,
        id: impl CacheKeyPart,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Self::builder()
            .part(name)
            .part(id)
            .part(updated_at)
            .build()
    }

    fn from_components(components: Vec<String>) -> Result<Self, DomainError> {
        if components.is_empty() {
            return Err(DomainError::invalid_key("cache key has no components"));
        }

        if let Some(index) = components.iter().position(|c| c.trim().is_empty()) {
            return Err(DomainError::invalid_key(format!(
                "cache key component {} is blank",
                index
            )));
        }

        let joined = components.join(KEY_SEPARATOR);

        Ok(Self { components, joined })
    }

    /// Returns a copy of this key with `namespace` as its first component
    pub fn with_namespace(&self, namespace: &str) -> Result<Self, DomainError> {
        let mut components = Vec::with_capacity(self.components.len() + 1);
        components.push(namespace.to_string());
        components.extend(self.components.iter().cloned());

        Self::from_components(components)
    }

    /// Returns the individual components
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Returns the joined lookup string
    pub fn as_str(&self) -> &str {
        &self.joined
    }

    /// Returns the hex-encoded SHA-256 digest of the lookup string
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.joined.as_bytes()))
    }

    /// Returns the lookup string bounded to `max_len` bytes
    ///
    /// Keys within the limit are returned unchanged. Longer keys keep a
    /// readable prefix followed by the digest of the full key. The digest is
    /// never truncated: a `max_len` below `DIGEST_LEN + 2` yields the bare
    /// digest, which is longer than `max_len` when it is below `DIGEST_LEN`.
    pub fn normalized(&self, max_len: Option<usize>) -> String {
        let Some(max_len) = max_len else {
            return self.joined.clone();
        };

        if self.joined.len() <= max_len {
            return self.joined.clone();
        }

        let digest = self.digest();
        let keep = max_len.saturating_sub(digest.len() + KEY_SEPARATOR.len());

        if keep == 0 {
            return digest;
        }

        let mut end = keep;
        while !self.joined.is_char_boundary(end) {
            end -= 1;
        }

        format!("{}{}{}", &self.joined[..end], KEY_SEPARATOR, digest)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined)
    }
}

/// Builder collecting heterogeneous key components
#[derive(Debug, Clone, Default)]
pub struct CacheKeyBuilder {
    components: Vec<String>,
}

impl CacheKeyBuilder {
    /// Appends a component
    pub fn part(mut self, part: impl CacheKeyPart) -> Self {
        self.components.push(part.to_key_part());
        self
    }

    /// Validates and builds the key
    pub fn build(self) -> Result<CacheKey, DomainError> {
        CacheKey::from_components(self.components)
    }
}

//! Expiration policies for cached values

use std::time::Duration;

use crate::domain::DomainError;

/// Expiration used when nothing more specific is configured
pub const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(3600);

/// How long a freshly computed value stays valid
///
/// A policy is resolved at call time; nothing is retained between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationPolicy {
    /// Constant duration
    Fixed(Duration),
    /// `count * per_item`, never less than `floor`
    Scaled {
        count: u64,
        per_item: Duration,
        floor: Duration,
    },
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_EXPIRES_IN)
    }
}

impl ExpirationPolicy {
    /// Creates a fixed policy
    pub const fn fixed(duration: Duration) -> Self {
        Self::Fixed(duration)
    }

    /// Creates a policy that grows with `count`
    pub const fn scaled(count: u64, per_item: Duration, floor: Duration) -> Self {
        Self::Scaled {
            count,
            per_item,
            floor,
        }
    }

    /// One minute per item, at least one hour
    pub const fn minute_per_item(count: u64) -> Self {
        Self::scaled(count, Duration::from_secs(60), DEFAULT_EXPIRES_IN)
    }

    /// Resolves the policy to a concrete, positive duration
    pub fn resolve(&self) -> Result<Duration, DomainError> {
        let duration = match *self {
            Self::Fixed(duration) => duration,
            Self::Scaled {
                count,
                per_item,
                floor,
            } => {
                let factor = u32::try_from(count).unwrap_or(u32::MAX);
                per_item.saturating_mul(factor).max(floor)
            }
        };

        if duration.is_zero() {
            return Err(DomainError::validation(
                "expiration must resolve to a positive duration",
            ));
        }

        Ok(duration)
    }
}

impl From<Duration> for ExpirationPolicy {
    fn from(duration: Duration) -> Self {
        Self::Fixed(duration)
    }
}

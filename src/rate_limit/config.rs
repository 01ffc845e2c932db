//! Rate Limit Configuration
//!
//! Limits and maintenance intervals for the admission gate.

use serde::{Deserialize, Serialize};

use super::quota::DAY_WINDOW_MS;

/// Default limits
pub const DEFAULT_PER_ADDRESS_PER_HOUR: u32 = 5; // generations per address per hour
pub const DEFAULT_PER_SESSION_PER_DAY: u32 = 5; // generations per session per day
pub const DEFAULT_PER_ADDRESS_PER_DAY: u32 = 15; // hard ceiling per address per day
pub const DEFAULT_ENTRY_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Error returned when limits are inconsistent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitConfigError {
    /// A quota limit of zero would reject every request
    #[error("{0} must be > 0")]
    ZeroLimit(&'static str),

    /// Eviction would drop events a daily quota still needs
    #[error("entry TTL ({0}s) must cover the daily window ({1}s)")]
    TtlShorterThanWindow(u64, u64),

    /// Cleanup interval of zero means eviction on every request
    #[error("cleanup interval must be > 0")]
    ZeroCleanupInterval,
}

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Max generations per address in a trailing hour
    pub per_address_per_hour: u32,

    /// Max generations per session token in a trailing day
    pub per_session_per_day: u32,

    /// Max generations per address in a trailing day
    pub per_address_per_day: u32,

    /// Ledger entries older than this are evicted (seconds)
    pub entry_ttl_secs: u64,

    /// Minimum time between eviction passes (seconds)
    pub cleanup_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_address_per_hour: DEFAULT_PER_ADDRESS_PER_HOUR,
            per_session_per_day: DEFAULT_PER_SESSION_PER_DAY,
            per_address_per_day: DEFAULT_PER_ADDRESS_PER_DAY,
            entry_ttl_secs: DEFAULT_ENTRY_TTL_SECS,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
        }
    }
}

impl RateLimitConfig {
    pub(crate) fn entry_ttl_ms(&self) -> u64 {
        self.entry_ttl_secs.saturating_mul(1000)
    }

    pub(crate) fn cleanup_interval_ms(&self) -> u64 {
        self.cleanup_interval_secs.saturating_mul(1000)
    }

    /// Check that the limits can be enforced as configured
    pub fn validate(&self) -> Result<(), RateLimitConfigError> {
        if self.per_address_per_hour == 0 {
            return Err(RateLimitConfigError::ZeroLimit("per_address_per_hour"));
        }
        if self.per_address_per_day == 0 {
            return Err(RateLimitConfigError::ZeroLimit("per_address_per_day"));
        }
        if self.per_session_per_day == 0 {
            return Err(RateLimitConfigError::ZeroLimit("per_session_per_day"));
        }
        if self.entry_ttl_ms() < DAY_WINDOW_MS {
            return Err(RateLimitConfigError::TtlShorterThanWindow(
                self.entry_ttl_secs,
                DAY_WINDOW_MS / 1000,
            ));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(RateLimitConfigError::ZeroCleanupInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.per_address_per_hour, 5);
        assert_eq!(config.per_session_per_day, 5);
        assert_eq!(config.per_address_per_day, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_durations() {
        let config = RateLimitConfig::default();
        assert_eq!(config.entry_ttl_ms(), DAY_WINDOW_MS);
        assert_eq!(config.cleanup_interval_ms(), 60_000);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = RateLimitConfig {
            per_session_per_day: 0,
            ..RateLimitConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(RateLimitConfigError::ZeroLimit("per_session_per_day"))
        );
    }

    #[test]
    fn test_short_ttl_rejected() {
        let config = RateLimitConfig {
            entry_ttl_secs: 3600,
            ..RateLimitConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RateLimitConfigError::TtlShorterThanWindow(3600, 86_400))
        ));
    }

    #[test]
    fn test_zero_cleanup_interval_rejected() {
        let config = RateLimitConfig {
            cleanup_interval_secs: 0,
            ..RateLimitConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(RateLimitConfigError::ZeroCleanupInterval)
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = RateLimitConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RateLimitConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}

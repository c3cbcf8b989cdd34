//! # Monitor Configuration
//!
//! Timing and concurrency settings for the refresh loop.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;
use thiserror::Error;

/// Default time between the end of one round and the start of the next.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Default bound on a whole round (directory fetch + calculations).
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of concurrent calculations.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 1;

/// What to publish when every listed participant failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRoundPolicy {
    /// Keep the previous snapshot.
    #[default]
    PreserveLastGood,
    /// Replace the snapshot with an empty one.
    PublishEmpty,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Refresh interval must be positive.
    #[error("refresh_interval must be greater than zero")]
    ZeroInterval,
    /// Round timeout must be positive.
    #[error("round_timeout must be greater than zero")]
    ZeroTimeout,
    /// At least one calculation must be allowed.
    #[error("concurrency_limit must be at least 1")]
    ZeroConcurrency,
}

/// Reputation monitor configuration.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Wait between rounds.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "refresh_interval_ms")]
    pub refresh_interval: Duration,

    /// Deadline for a whole round.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "round_timeout_ms")]
    pub round_timeout: Duration,

    /// Maximum calculations in flight.
    pub concurrency_limit: usize,

    /// Behaviour when a round produces no records.
    pub empty_round_policy: EmptyRoundPolicy,

    /// Run the first round immediately instead of after one interval.
    pub refresh_on_start: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            round_timeout: DEFAULT_ROUND_TIMEOUT,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            empty_round_policy: EmptyRoundPolicy::default(),
            refresh_on_start: false,
        }
    }
}

impl MonitorConfig {
    /// Create a config for testing (short interval, parallel pool).
    pub fn for_testing() -> Self {
        Self {
            refresh_interval: Duration::from_secs(1),
            round_timeout: Duration::from_millis(500),
            concurrency_limit: 4,
            empty_round_policy: EmptyRoundPolicy::PreserveLastGood,
            refresh_on_start: false,
        }
    }

    /// Reject values the refresh loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.round_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.refresh_interval, Duration::from_secs(10));
        assert_eq!(config.round_timeout, Duration::from_secs(5));
        assert_eq!(config.concurrency_limit, 1);
        assert_eq!(config.empty_round_policy, EmptyRoundPolicy::PreserveLastGood);
        assert!(!config.refresh_on_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_config() {
        let config = MonitorConfig::for_testing();
        assert_eq!(config.concurrency_limit, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = MonitorConfig::default();
        config.concurrency_limit = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));

        let mut config = MonitorConfig::default();
        config.refresh_interval = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::ZeroInterval));

        let mut config = MonitorConfig::default();
        config.round_timeout = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: MonitorConfig = serde_json::from_str(
            r#"{"refresh_interval_ms": 2500, "empty_round_policy": "publish_empty"}"#,
        )
        .unwrap();
        assert_eq!(config.refresh_interval, Duration::from_millis(2500));
        assert_eq!(config.round_timeout, DEFAULT_ROUND_TIMEOUT);
        assert_eq!(config.empty_round_policy, EmptyRoundPolicy::PublishEmpty);
    }
}

//! Configuration for the resource-cluster scaler loop.
//!
//! One `ScalerConfig` per cluster; it is loaded once at startup and handed to
//! the scaler via dependency injection.

use crate::ids::ClusterId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cluster id must not be empty")]
    EmptyClusterId,

    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },

    #[error("inbox capacity must be greater than zero")]
    ZeroInboxCapacity,
}

/// Configuration for one `ScalerLoop` instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerConfig {
    /// Cluster this scaler is responsible for.
    pub cluster_id: ClusterId,

    /// Fixed delay between cluster-usage pulls.
    pub scaler_pull_threshold: Duration,

    /// Fixed delay between rule-set refreshes from storage.
    pub rule_set_refresh_threshold: Duration,

    /// Channel capacity for the scaler inbox.
    pub inbox_capacity: usize,
}

impl ScalerConfig {
    pub fn new(cluster_id: ClusterId) -> Self {
        Self {
            cluster_id,
            scaler_pull_threshold: Duration::from_secs(60),
            rule_set_refresh_threshold: Duration::from_secs(300),
            inbox_capacity: 128,
        }
    }

    pub fn with_pull_threshold(mut self, threshold: Duration) -> Self {
        self.scaler_pull_threshold = threshold;
        self
    }

    pub fn with_rule_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.rule_set_refresh_threshold = threshold;
        self
    }

    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster_id.as_str().is_empty() {
            return Err(ConfigError::EmptyClusterId);
        }
        if self.scaler_pull_threshold.is_zero() {
            return Err(ConfigError::ZeroInterval {
                field: "scaler_pull_threshold",
            });
        }
        if self.rule_set_refresh_threshold.is_zero() {
            return Err(ConfigError::ZeroInterval {
                field: "rule_set_refresh_threshold",
            });
        }
        if self.inbox_capacity == 0 {
            return Err(ConfigError::ZeroInboxCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScalerConfig::new(ClusterId::new("cluster-1"));
        assert!(config.validate().is_ok());
        assert_eq!(config.scaler_pull_threshold, Duration::from_secs(60));
        assert_eq!(config.rule_set_refresh_threshold, Duration::from_secs(300));
    }

    #[test]
    fn rejects_empty_cluster_id() {
        let config = ScalerConfig::new(ClusterId::new(""));
        assert_eq!(config.validate(), Err(ConfigError::EmptyClusterId));
    }

    #[test]
    fn rejects_zero_intervals() {
        let config =
            ScalerConfig::new(ClusterId::new("c")).with_pull_threshold(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval { .. })
        ));

        let config = ScalerConfig::new(ClusterId::new("c"))
            .with_rule_refresh_threshold(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval { .. })
        ));
    }

    #[test]
    fn rejects_zero_inbox_capacity() {
        let config = ScalerConfig::new(ClusterId::new("c")).with_inbox_capacity(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroInboxCapacity));
    }
}

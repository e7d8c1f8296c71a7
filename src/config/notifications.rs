//! Notification retry and retention policy

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Notification retry/retention configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Maximum delivery attempts per notification (initial send + retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Interval between retry sweeps in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Days to keep processed webhook event records
    #[serde(default = "default_retention_days")]
    pub webhook_retention_days: i64,
}

impl NotificationsConfig {
    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate notification configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_retries == 0 || self.max_retries > 10 {
            return Err(ValidationError::InvalidRetryBound);
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            sweep_interval_secs: default_sweep_interval(),
            webhook_retention_days: default_retention_days(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_retention_days() -> i64 {
    30
}

//! Position source configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bound on the delivery-channel readiness barrier; a channel that
    /// fails to come up within this window fails the start call
    pub ready_timeout_ms: u64,
    /// Floor for requested update intervals; requests below it (including
    /// 0, meaning "as often as the platform allows") are raised to it
    pub min_update_interval_ms: u32,
}

impl Config {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ready_timeout_ms == 0 {
            return Err(CoreError::Config(
                "ready_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.min_update_interval_ms == 0 {
            return Err(CoreError::Config(
                "min_update_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 5_000,
            min_update_interval_ms: pinpoint_session::MIN_UPDATE_INTERVAL_MS,
        }
    }
}

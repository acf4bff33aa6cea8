use std::time::Duration;

use serde::Deserialize;

use crate::error::EngineError;

pub const DEFAULT_MIN_DELAY_SECONDS: f64 = 0.1;
pub const DEFAULT_MAX_DELAY_SECONDS: f64 = 5.0;
pub const DEFAULT_PAUSE_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_MAX_CONSECUTIVE_DISPATCH_FAILURES: u32 = 3;

/// Construction-time options for [`crate::Engine`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_delay_seconds: f64,
    pub max_delay_seconds: f64,
    pub pause_poll_interval_ms: u64,
    pub max_consecutive_dispatch_failures: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_delay_seconds: DEFAULT_MIN_DELAY_SECONDS,
            max_delay_seconds: DEFAULT_MAX_DELAY_SECONDS,
            pause_poll_interval_ms: DEFAULT_PAUSE_POLL_INTERVAL_MS,
            max_consecutive_dispatch_failures: DEFAULT_MAX_CONSECUTIVE_DISPATCH_FAILURES,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.min_delay_seconds.is_finite() || self.min_delay_seconds <= 0.0 {
            return Err(EngineError::configuration(format!(
                "min_delay_seconds must be a positive number, got {}",
                self.min_delay_seconds
            )));
        }
        if !self.max_delay_seconds.is_finite() || self.max_delay_seconds < self.min_delay_seconds {
            return Err(EngineError::configuration(format!(
                "max_delay_seconds ({}) must be finite and not below min_delay_seconds ({})",
                self.max_delay_seconds, self.min_delay_seconds
            )));
        }
        if Duration::try_from_secs_f64(self.max_delay_seconds).is_err() {
            return Err(EngineError::configuration(format!(
                "max_delay_seconds ({}) is too large for a step delay",
                self.max_delay_seconds
            )));
        }
        if self.pause_poll_interval_ms == 0 {
            return Err(EngineError::configuration(
                "pause_poll_interval_ms must be greater than zero",
            ));
        }
        if self.max_consecutive_dispatch_failures == 0 {
            return Err(EngineError::configuration(
                "max_consecutive_dispatch_failures must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn pause_poll_interval(&self) -> Duration {
        Duration::from_millis(self.pause_poll_interval_ms)
    }

    pub fn clamp_delay(&self, delay_seconds: f64) -> f64 {
        delay_seconds.clamp(self.min_delay_seconds, self.max_delay_seconds)
    }
}

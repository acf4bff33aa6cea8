use std::time::Duration;

use shared::{domain::Coordinate, error::DispatchError};
use tracing::{error, info, warn};

use crate::control::StopReason;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub total: usize,
    pub attempted: usize,
    pub dispatched: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Observer for session progress. Nothing returned from here feeds back
/// into the pacing loop. Step indices are 0-based.
pub trait SessionReporter: Send + Sync {
    fn on_step(&self, index: usize, total: usize, coordinate: Coordinate);
    fn on_dispatch_error(
        &self,
        index: usize,
        total: usize,
        coordinate: Coordinate,
        error: &DispatchError,
    );
    fn on_pause(&self);
    fn on_resume(&self);
    fn on_speed_change(&self, delay_seconds: f64);
    fn on_complete(&self, stats: &SessionStats);
    fn on_stopped(&self, reason: StopReason, stats: &SessionStats);
}

/// Renders session events as log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl SessionReporter for TracingReporter {
    fn on_step(&self, index: usize, total: usize, coordinate: Coordinate) {
        info!(
            step = index + 1,
            total,
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            "moved to waypoint"
        );
    }

    fn on_dispatch_error(
        &self,
        index: usize,
        total: usize,
        coordinate: Coordinate,
        error: &DispatchError,
    ) {
        warn!(step = index + 1, total, %coordinate, %error, "failed to set location");
    }

    fn on_pause(&self) {
        info!("simulation paused");
    }

    fn on_resume(&self) {
        info!("simulation resumed");
    }

    fn on_speed_change(&self, delay_seconds: f64) {
        info!(delay_seconds, "step delay changed");
    }

    fn on_complete(&self, stats: &SessionStats) {
        info!(
            dispatched = stats.dispatched,
            failed = stats.failed,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "location simulation completed"
        );
    }

    fn on_stopped(&self, reason: StopReason, stats: &SessionStats) {
        if reason.is_user_initiated() {
            info!(%reason, attempted = stats.attempted, total = stats.total, "location simulation stopped");
        } else {
            error!(%reason, attempted = stats.attempted, failed = stats.failed, "location simulation aborted");
        }
    }
}

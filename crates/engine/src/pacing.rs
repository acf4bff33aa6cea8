use std::time::Duration;

use shared::domain::{Coordinate, PlatformTarget};
use tokio::time::Instant;
use tracing::debug;

use crate::{
    config::EngineConfig,
    control::{ControlState, StopReason, WaitOutcome},
    dispatch::PlatformDispatcher,
    reporter::{SessionReporter, SessionStats},
    sequence::WaypointSequence,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopState {
    Running,
    PausedWait,
    StepDelay,
    Stopped,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    Completed,
    Stopped(StopReason),
}

/// One walk through a waypoint sequence. The cursor only moves forward and
/// only this type moves it.
pub(crate) struct Session {
    sequence: WaypointSequence,
    control: ControlState,
    target: PlatformTarget,
    cursor: usize,
    consecutive_failures: u32,
    stats: SessionStats,
}

impl Session {
    pub(crate) fn new(
        sequence: WaypointSequence,
        control: ControlState,
        target: PlatformTarget,
    ) -> Self {
        let stats = SessionStats {
            total: sequence.len(),
            ..SessionStats::default()
        };
        Self {
            sequence,
            control,
            target,
            cursor: 0,
            consecutive_failures: 0,
            stats,
        }
    }

    pub(crate) async fn drive(
        mut self,
        config: &EngineConfig,
        dispatcher: &dyn PlatformDispatcher,
        reporter: &dyn SessionReporter,
    ) -> (Termination, SessionStats) {
        let started = Instant::now();
        let mut state = LoopState::Running;

        loop {
            let next = match state {
                LoopState::Running => self.step(config, dispatcher, reporter).await,
                LoopState::PausedWait => {
                    match self
                        .control
                        .sleep_unless_stopped(config.pause_poll_interval())
                        .await
                    {
                        WaitOutcome::Stopped => LoopState::Stopped,
                        WaitOutcome::Elapsed if self.control.snapshot().paused => {
                            LoopState::PausedWait
                        }
                        WaitOutcome::Elapsed => LoopState::Running,
                    }
                }
                LoopState::StepDelay => {
                    // Read once; a speed change lands on the next wait.
                    let delay = Duration::from_secs_f64(self.control.snapshot().delay_seconds);
                    match self.control.sleep_unless_stopped(delay).await {
                        WaitOutcome::Stopped => LoopState::Stopped,
                        WaitOutcome::Elapsed => {
                            self.cursor += 1;
                            LoopState::Running
                        }
                    }
                }
                LoopState::Stopped => {
                    self.stats.elapsed = started.elapsed();
                    let reason = self
                        .control
                        .snapshot()
                        .stop_reason
                        .unwrap_or(StopReason::UserRequested);
                    reporter.on_stopped(reason, &self.stats);
                    return (Termination::Stopped(reason), self.stats);
                }
                LoopState::Completed => {
                    self.stats.elapsed = started.elapsed();
                    self.control.finish();
                    reporter.on_complete(&self.stats);
                    return (Termination::Completed, self.stats);
                }
            };

            if next != state {
                debug!(from = ?state, to = ?next, cursor = self.cursor, "pacing state change");
            }
            state = next;
        }
    }

    async fn step(
        &mut self,
        config: &EngineConfig,
        dispatcher: &dyn PlatformDispatcher,
        reporter: &dyn SessionReporter,
    ) -> LoopState {
        let snapshot = self.control.snapshot();
        if snapshot.stopped {
            return LoopState::Stopped;
        }
        if snapshot.paused {
            return LoopState::PausedWait;
        }

        let coordinate = self.sequence[self.cursor];
        self.dispatch(coordinate, dispatcher, reporter).await;

        if self.consecutive_failures >= config.max_consecutive_dispatch_failures {
            debug!(
                consecutive_failures = self.consecutive_failures,
                step = self.cursor + 1,
                "too many consecutive dispatch failures; stopping session"
            );
            self.control.stop_with(StopReason::FatalDispatchFailures);
            return LoopState::Stopped;
        }

        if self.cursor + 1 >= self.sequence.len() {
            LoopState::Completed
        } else {
            LoopState::StepDelay
        }
    }

    async fn dispatch(
        &mut self,
        coordinate: Coordinate,
        dispatcher: &dyn PlatformDispatcher,
        reporter: &dyn SessionReporter,
    ) {
        let total = self.sequence.len();
        self.stats.attempted += 1;

        match dispatcher.set_location(&self.target, coordinate).await {
            Ok(()) => {
                self.consecutive_failures = 0;
                self.stats.dispatched += 1;
                reporter.on_step(self.cursor, total, coordinate);
            }
            Err(error) => {
                self.consecutive_failures += 1;
                self.stats.failed += 1;
                debug!(
                    step = self.cursor + 1,
                    total,
                    %error,
                    consecutive_failures = self.consecutive_failures,
                    "dispatch failed"
                );
                reporter.on_dispatch_error(self.cursor, total, coordinate, &error);
            }
        }
    }
}

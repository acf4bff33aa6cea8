// Shared control state for a running simulation session.
//
// The input listener writes it and the pacing loop reads it. Every field
// lives in one watched record, so each operation is an atomic
// read-modify-write and a snapshot is never torn. Waiters are woken through
// the watch channel, which is what makes the pacing waits cancellable.

use std::{fmt, sync::Arc, time::Duration};

use tokio::sync::watch;

use crate::{config::EngineConfig, error::EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    UserRequested,
    Interrupted,
    /// The dispatcher failed too many times in a row.
    FatalDispatchFailures,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::UserRequested => "stopped-by-user",
            StopReason::Interrupted => "interrupted",
            StopReason::FatalDispatchFailures => "fatal-dispatch-failures",
        }
    }

    pub fn is_user_initiated(&self) -> bool {
        matches!(self, StopReason::UserRequested | StopReason::Interrupted)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    pub paused: bool,
    pub delay_seconds: f64,
    pub stopped: bool,
    /// `None` after a sequence finishes normally.
    pub stop_reason: Option<StopReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Stopped,
}

#[derive(Clone)]
pub struct ControlState {
    record: Arc<watch::Sender<ControlSnapshot>>,
    min_delay_seconds: f64,
    max_delay_seconds: f64,
}

impl ControlState {
    pub fn new(initial_delay_seconds: f64, config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        if !initial_delay_seconds.is_finite() || initial_delay_seconds <= 0.0 {
            return Err(EngineError::configuration(format!(
                "initial delay must be a positive number of seconds, got {initial_delay_seconds}"
            )));
        }

        let (record, _) = watch::channel(ControlSnapshot {
            paused: false,
            delay_seconds: config.clamp_delay(initial_delay_seconds),
            stopped: false,
            stop_reason: None,
        });

        Ok(Self {
            record: Arc::new(record),
            min_delay_seconds: config.min_delay_seconds,
            max_delay_seconds: config.max_delay_seconds,
        })
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        *self.record.borrow()
    }

    pub fn is_stopped(&self) -> bool {
        self.record.borrow().stopped
    }

    pub fn pause(&self) -> bool {
        self.record.send_if_modified(|state| {
            if state.paused {
                return false;
            }
            state.paused = true;
            true
        })
    }

    pub fn resume(&self) -> bool {
        self.record.send_if_modified(|state| {
            if !state.paused {
                return false;
            }
            state.paused = false;
            true
        })
    }

    // Speed changes halve or double the delay within bounds and return the
    // new delay only when it moved.
    pub fn speed_up(&self) -> Option<f64> {
        let min = self.min_delay_seconds;
        self.adjust_delay(|delay| (delay / 2.0).max(min))
    }

    pub fn slow_down(&self) -> Option<f64> {
        let max = self.max_delay_seconds;
        self.adjust_delay(|delay| (delay * 2.0).min(max))
    }

    pub fn stop(&self) -> bool {
        self.stop_with(StopReason::UserRequested)
    }

    /// Marks the session stopped. The first reason recorded wins.
    pub fn stop_with(&self, reason: StopReason) -> bool {
        self.record.send_if_modified(|state| {
            if state.stopped {
                return false;
            }
            state.stopped = true;
            state.stop_reason = Some(reason);
            true
        })
    }

    /// Sets the stop flag without a reason once the sequence is exhausted,
    /// releasing anything waiting on the session.
    pub(crate) fn finish(&self) {
        self.record.send_if_modified(|state| {
            if state.stopped {
                return false;
            }
            state.stopped = true;
            true
        });
    }

    pub async fn wait_until_stopped(&self) {
        let mut updates = self.record.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = updates.wait_for(|state| state.stopped).await;
    }

    pub async fn sleep_unless_stopped(&self, duration: Duration) -> WaitOutcome {
        tokio::select! {
            biased;
            _ = self.wait_until_stopped() => WaitOutcome::Stopped,
            _ = tokio::time::sleep(duration) => WaitOutcome::Elapsed,
        }
    }

    fn adjust_delay(&self, next: impl FnOnce(f64) -> f64) -> Option<f64> {
        let mut updated = None;
        self.record.send_if_modified(|state| {
            let delay = next(state.delay_seconds);
            if delay == state.delay_seconds {
                return false;
            }
            state.delay_seconds = delay;
            updated = Some(delay);
            true
        });
        updated
    }
}

impl fmt::Debug for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlState")
            .field("state", &self.snapshot())
            .field("min_delay_seconds", &self.min_delay_seconds)
            .field("max_delay_seconds", &self.max_delay_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(initial: f64) -> ControlState {
        ControlState::new(initial, &EngineConfig::default()).expect("control")
    }

    #[test]
    fn speed_up_halves_down_to_minimum() {
        let initial = 1.6;
        let ctrl = control(initial);
        for n in 1..=8 {
            ctrl.speed_up();
            let expected = (initial / 2f64.powi(n)).max(0.1);
            assert_eq!(ctrl.snapshot().delay_seconds, expected, "after {n} speed-ups");
        }
        assert_eq!(ctrl.speed_up(), None);
    }

    #[test]
    fn slow_down_doubles_up_to_maximum() {
        let initial = 0.3;
        let ctrl = control(initial);
        for n in 1..=6 {
            ctrl.slow_down();
            let expected = (initial * 2f64.powi(n)).min(5.0);
            assert_eq!(ctrl.snapshot().delay_seconds, expected, "after {n} slow-downs");
        }
        assert_eq!(ctrl.slow_down(), None);
    }

    #[test]
    fn speed_changes_report_new_delay() {
        let ctrl = control(1.0);
        assert_eq!(ctrl.speed_up(), Some(0.5));
        assert_eq!(ctrl.slow_down(), Some(1.0));
    }

    #[test]
    fn initial_delay_is_clamped_and_must_be_positive() {
        assert_eq!(control(30.0).snapshot().delay_seconds, 5.0);
        assert_eq!(control(0.01).snapshot().delay_seconds, 0.1);
        assert!(matches!(
            ControlState::new(0.0, &EngineConfig::default()),
            Err(EngineError::Configuration(_))
        ));
        assert!(ControlState::new(f64::NAN, &EngineConfig::default()).is_err());
    }

    #[test]
    fn pause_resume_and_stop_are_idempotent() {
        let ctrl = control(0.5);
        assert!(ctrl.pause());
        let paused = ctrl.snapshot();
        assert!(!ctrl.pause());
        assert_eq!(ctrl.snapshot(), paused);

        assert!(ctrl.resume());
        let resumed = ctrl.snapshot();
        assert!(!ctrl.resume());
        assert_eq!(ctrl.snapshot(), resumed);

        assert!(ctrl.stop());
        let stopped = ctrl.snapshot();
        assert!(!ctrl.stop());
        assert_eq!(ctrl.snapshot(), stopped);
        assert!(stopped.stopped);
    }

    #[test]
    fn first_stop_reason_wins() {
        let ctrl = control(0.5);
        assert!(ctrl.stop_with(StopReason::Interrupted));
        assert!(!ctrl.stop_with(StopReason::FatalDispatchFailures));
        assert_eq!(ctrl.snapshot().stop_reason, Some(StopReason::Interrupted));
    }

    #[test]
    fn finish_stops_without_reason() {
        let ctrl = control(0.5);
        ctrl.finish();
        let snapshot = ctrl.snapshot();
        assert!(snapshot.stopped);
        assert_eq!(snapshot.stop_reason, None);
    }

    #[test]
    fn fields_update_independently() {
        let ctrl = control(1.0);
        ctrl.pause();
        ctrl.speed_up();
        let snapshot = ctrl.snapshot();
        assert!(snapshot.paused);
        assert_eq!(snapshot.delay_seconds, 0.5);
        assert!(!snapshot.stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_is_cut_short_by_stop() {
        let ctrl = control(0.5);
        let stopper = ctrl.clone();
        let started = tokio::time::Instant::now();

        let (outcome, _) = tokio::join!(ctrl.sleep_unless_stopped(Duration::from_secs(5)), async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            stopper.stop();
        });

        assert_eq!(outcome, WaitOutcome::Stopped);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(300), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_returns_immediately_when_already_stopped() {
        let ctrl = control(0.5);
        ctrl.stop();
        let started = tokio::time::Instant::now();
        assert_eq!(
            ctrl.sleep_unless_stopped(Duration::from_secs(5)).await,
            WaitOutcome::Stopped
        );
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_elapses_when_not_stopped() {
        let ctrl = control(0.5);
        assert_eq!(
            ctrl.sleep_unless_stopped(Duration::from_millis(100)).await,
            WaitOutcome::Elapsed
        );
    }
}

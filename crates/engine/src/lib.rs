//! Simulation engine: walks a waypoint sequence, pushing one location fix per
//! step to a platform dispatcher, while a concurrent listener applies pause,
//! resume, speed and stop commands.

use std::sync::Arc;

use shared::domain::PlatformTarget;
use tracing::{info, warn};

pub mod config;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod listener;
mod pacing;
pub mod reporter;
pub mod sequence;

pub use config::EngineConfig;
pub use control::{ControlSnapshot, ControlState, StopReason, WaitOutcome};
pub use dispatch::PlatformDispatcher;
pub use error::EngineError;
pub use listener::{ChannelInput, ControlCommand, InputSource, NoInput, INTERRUPT_TOKEN};
pub use reporter::{SessionReporter, SessionStats, TracingReporter};
pub use sequence::{RouteSource, WaypointSequence};

use pacing::{Session, Termination};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed { stats: SessionStats },
    Stopped { reason: StopReason, stats: SessionStats },
    Failed(EngineError),
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionOutcome::Completed { .. })
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            SessionOutcome::Stopped { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn stats(&self) -> Option<&SessionStats> {
        match self {
            SessionOutcome::Completed { stats } | SessionOutcome::Stopped { stats, .. } => {
                Some(stats)
            }
            SessionOutcome::Failed(_) => None,
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    dispatcher: Arc<dyn PlatformDispatcher>,
    reporter: Arc<dyn SessionReporter>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        dispatcher: Arc<dyn PlatformDispatcher>,
        reporter: Arc<dyn SessionReporter>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            dispatcher,
            reporter,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the control record for a session using this engine's bounds.
    /// Hold on to a clone to stop or steer the session from outside.
    pub fn control(&self, initial_delay_seconds: f64) -> Result<ControlState, EngineError> {
        ControlState::new(initial_delay_seconds, &self.config)
    }

    pub async fn run<I>(
        &self,
        sequence: WaypointSequence,
        initial_delay_seconds: f64,
        target: PlatformTarget,
        input: I,
    ) -> SessionOutcome
    where
        I: InputSource + 'static,
    {
        match self.control(initial_delay_seconds) {
            Ok(control) => self.run_session(sequence, control, target, input).await,
            Err(error) => SessionOutcome::Failed(error),
        }
    }

    /// Runs one session to a terminal outcome. The input listener runs as a
    /// separate task for the lifetime of the session.
    pub async fn run_session<I>(
        &self,
        sequence: WaypointSequence,
        control: ControlState,
        target: PlatformTarget,
        input: I,
    ) -> SessionOutcome
    where
        I: InputSource + 'static,
    {
        info!(
            waypoints = sequence.len(),
            delay_seconds = control.snapshot().delay_seconds,
            %target,
            "starting location simulation"
        );

        let listener = tokio::spawn(listener::listen(
            input,
            control.clone(),
            Arc::clone(&self.reporter),
        ));

        let (termination, stats) = Session::new(sequence, control.clone(), target)
            .drive(
                &self.config,
                self.dispatcher.as_ref(),
                self.reporter.as_ref(),
            )
            .await;

        // Either way the listener must observe a stopped session.
        control.finish();
        if let Err(error) = listener.await {
            warn!(%error, "control input listener ended abnormally");
        }

        match termination {
            Termination::Completed => SessionOutcome::Completed { stats },
            Termination::Stopped(reason) => SessionOutcome::Stopped { reason, stats },
        }
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;

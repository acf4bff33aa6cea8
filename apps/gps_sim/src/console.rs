use std::{
    io::{self, Stdout, Write},
    sync::Mutex,
};

use chrono::Local;
use engine::{SessionReporter, SessionStats, StopReason};
use shared::{domain::Coordinate, error::DispatchError};

// Lines end in "\r\n" because the terminal may be in raw mode.
const EOL: &str = "\r\n";

/// Progress on a single rewritten line, events on lines of their own.
pub struct ConsoleReporter<W = Stdout> {
    out: Mutex<W>,
}

impl ConsoleReporter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self, text: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn event(&self, message: &str) {
        let time = Local::now().format("%H:%M:%S");
        self.write(&format!("{EOL}[{time}] {message}{EOL}"));
    }
}

impl<W: Write + Send> SessionReporter for ConsoleReporter<W> {
    fn on_step(&self, index: usize, total: usize, coordinate: Coordinate) {
        self.write(&format!("\rStep {}/{total} -> {coordinate}   ", index + 1));
    }

    fn on_dispatch_error(
        &self,
        index: usize,
        total: usize,
        _coordinate: Coordinate,
        error: &DispatchError,
    ) {
        self.event(&format!(
            "Failed to set location at step {}/{total}: {error}",
            index + 1
        ));
    }

    fn on_pause(&self) {
        self.event("Paused");
    }

    fn on_resume(&self) {
        self.event("Resumed");
    }

    fn on_speed_change(&self, delay_seconds: f64) {
        self.event(&format!("Delay now {delay_seconds:.2}s"));
    }

    fn on_complete(&self, stats: &SessionStats) {
        self.event(&format!(
            "Simulation completed! {}/{} locations set in {:.1}s",
            stats.dispatched,
            stats.total,
            stats.elapsed.as_secs_f64()
        ));
    }

    fn on_stopped(&self, reason: StopReason, stats: &SessionStats) {
        let message = match reason {
            StopReason::UserRequested => "Simulation stopped by user",
            StopReason::Interrupted => "Simulation interrupted by user",
            StopReason::FatalDispatchFailures => "Simulation aborted: location updates keep failing",
        };
        self.event(&format!(
            "{message} after {}/{} steps",
            stats.attempted, stats.total
        ));
    }
}

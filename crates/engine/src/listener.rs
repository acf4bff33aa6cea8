use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::{
    control::{ControlState, StopReason},
    reporter::SessionReporter,
};

/// ETX, what a terminal in raw mode delivers for Ctrl+C.
pub const INTERRUPT_TOKEN: &str = "\u{3}";

#[async_trait]
pub trait InputSource: Send {
    async fn next_token(&mut self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    SpeedUp,
    SlowDown,
    Quit,
    Interrupt,
}

impl ControlCommand {
    pub fn parse(token: &str) -> Option<Self> {
        if token.contains(INTERRUPT_TOKEN) {
            return Some(ControlCommand::Interrupt);
        }
        match token.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(ControlCommand::Pause),
            "r" | "resume" => Some(ControlCommand::Resume),
            "+" => Some(ControlCommand::SpeedUp),
            "-" => Some(ControlCommand::SlowDown),
            "q" | "quit" => Some(ControlCommand::Quit),
            _ => None,
        }
    }

    pub fn apply(self, control: &ControlState, reporter: &dyn SessionReporter) {
        match self {
            ControlCommand::Pause => {
                if control.pause() {
                    reporter.on_pause();
                }
            }
            ControlCommand::Resume => {
                if control.resume() {
                    reporter.on_resume();
                }
            }
            ControlCommand::SpeedUp => {
                if let Some(delay) = control.speed_up() {
                    reporter.on_speed_change(delay);
                }
            }
            ControlCommand::SlowDown => {
                if let Some(delay) = control.slow_down() {
                    reporter.on_speed_change(delay);
                }
            }
            ControlCommand::Quit => {
                control.stop_with(StopReason::UserRequested);
            }
            ControlCommand::Interrupt => {
                control.stop_with(StopReason::Interrupted);
            }
        }
    }
}

pub(crate) async fn listen<I>(
    mut input: I,
    control: ControlState,
    reporter: Arc<dyn SessionReporter>,
) where
    I: InputSource,
{
    loop {
        let token = tokio::select! {
            biased;
            _ = control.wait_until_stopped() => break,
            token = input.next_token() => token,
        };

        let Some(token) = token else {
            debug!("control input closed; listener exiting");
            break;
        };

        match ControlCommand::parse(&token) {
            Some(command) => {
                debug!(?command, "applying control command");
                command.apply(&control, reporter.as_ref());
            }
            None => trace!(token = %token.escape_debug(), "ignoring unknown control token"),
        }
    }
}

#[derive(Debug)]
pub struct ChannelInput {
    rx: mpsc::Receiver<String>,
}

impl ChannelInput {
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }

    pub fn channel(capacity: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl InputSource for ChannelInput {
    async fn next_token(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// An input source that is closed from the start.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

#[async_trait]
impl InputSource for NoInput {
    async fn next_token(&mut self) -> Option<String> {
        None
    }
}

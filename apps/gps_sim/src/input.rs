use std::io::{self, IsTerminal};

use async_trait::async_trait;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};
use engine::{InputSource, INTERRUPT_TOKEN};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

/// Restores cooked mode when dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Single keystrokes from a raw-mode terminal. Ctrl+C arrives as a key
/// event here, not as a signal, so it is forwarded as the interrupt token.
pub struct KeyboardInput {
    events: EventStream,
    _raw: RawModeGuard,
}

impl KeyboardInput {
    pub fn new() -> io::Result<Self> {
        let raw = RawModeGuard::enter()?;
        Ok(Self {
            events: EventStream::new(),
            _raw: raw,
        })
    }
}

fn key_token(key: KeyEvent) -> Option<String> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(INTERRUPT_TOKEN.to_string())
        }
        KeyCode::Char(c) => Some(c.to_string()),
        KeyCode::Esc => Some("q".to_string()),
        _ => None,
    }
}

#[async_trait]
impl InputSource for KeyboardInput {
    async fn next_token(&mut self) -> Option<String> {
        loop {
            match self.events.next().await? {
                Ok(Event::Key(key)) => {
                    if let Some(token) = key_token(key) {
                        return Some(token);
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(%error, "keyboard input failed");
                    return None;
                }
            }
        }
    }
}

/// Whitespace-trimmed lines from a non-interactive stdin.
pub struct LineInput {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for LineInput {
    fn default() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait]
impl InputSource for LineInput {
    async fn next_token(&mut self) -> Option<String> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    let token = line.trim();
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
                Ok(None) => return None,
                Err(error) => {
                    warn!(%error, "reading control input failed");
                    return None;
                }
            }
        }
    }
}

pub enum TerminalInput {
    Keyboard(KeyboardInput),
    Lines(LineInput),
}

impl TerminalInput {
    /// Keystrokes when stdin is a terminal, lines otherwise or on request.
    pub fn for_stdin(force_lines: bool) -> io::Result<Self> {
        if force_lines || !io::stdin().is_terminal() {
            Ok(Self::Lines(LineInput::default()))
        } else {
            KeyboardInput::new().map(Self::Keyboard)
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Keyboard(_))
    }
}

#[async_trait]
impl InputSource for TerminalInput {
    async fn next_token(&mut self) -> Option<String> {
        match self {
            Self::Keyboard(input) => input.next_token().await,
            Self::Lines(input) => input.next_token().await,
        }
    }
}

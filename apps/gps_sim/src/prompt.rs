use std::io::{self, BufRead, StdinLock, Stdout, Write};

use shared::domain::{Coordinate, Platform};
use tracing::warn;

/// Line-oriented questions for values not given on the command line.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn ask(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before a value was entered",
            ));
        }
        Ok(line.trim().to_string())
    }

    pub fn ask_or(&mut self, label: &str, default: &str) -> io::Result<String> {
        let answer = self.ask(&format!("{label} [{default}]"))?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    pub fn ask_yes_no(&mut self, label: &str, default: bool) -> io::Result<bool> {
        let shown = if default { "yes" } else { "no" };
        let answer = self.ask_or(&format!("{label} (yes/no)"), shown)?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    pub fn ask_platform(&mut self) -> io::Result<Platform> {
        loop {
            let answer = self.ask_or("Enter PLATFORM (ios/android)", Platform::Ios.as_str())?;
            match answer.parse() {
                Ok(platform) => return Ok(platform),
                Err(_) => writeln!(self.output, "Invalid platform. Choose 'ios' or 'android'")?,
            }
        }
    }

    pub fn ask_coordinate(&mut self, label: &str) -> io::Result<Coordinate> {
        loop {
            let answer = self.ask(&format!("{label} (lat,lon)"))?;
            match answer.parse() {
                Ok(coordinate) => return Ok(coordinate),
                Err(error) => writeln!(self.output, "{error}")?,
            }
        }
    }

    /// Unusable answers fall back to `default` instead of asking again.
    pub fn ask_delay(&mut self, bounds: (f64, f64), default: f64) -> io::Result<f64> {
        let label = format!("Enter INITIAL DELAY ({:.1}-{:.1})", bounds.0, bounds.1);
        let answer = self.ask_or(&label, &default.to_string())?;
        match answer.parse::<f64>() {
            Ok(delay) if delay.is_finite() && delay > 0.0 => Ok(delay),
            _ => {
                warn!(input = %answer, default, "invalid delay value");
                writeln!(self.output, "Invalid delay value. Using default {default}s")?;
                Ok(default)
            }
        }
    }
}

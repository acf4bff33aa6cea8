use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use engine::EngineConfig;
use routing::{dwell::DEFAULT_DWELL_POINTS, geocode::DEFAULT_NOMINATIM_URL, osrm::DEFAULT_OSRM_URL};

pub const CONFIG_FILE: &str = "gps_sim.toml";
pub const ENV_PREFIX: &str = "GPS_SIM__";

const KEYS: [&str; 9] = [
    "MIN_DELAY_SECONDS",
    "MAX_DELAY_SECONDS",
    "PAUSE_POLL_INTERVAL_MS",
    "MAX_CONSECUTIVE_FAILURES",
    "DEFAULT_DELAY_SECONDS",
    "DWELL_POINTS",
    "OSRM_URL",
    "NOMINATIM_URL",
    "LOG",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub engine: EngineConfig,
    pub default_delay_seconds: f64,
    pub dwell_points: usize,
    pub osrm_url: String,
    pub nominatim_url: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            default_delay_seconds: 0.5,
            dwell_points: DEFAULT_DWELL_POINTS,
            osrm_url: DEFAULT_OSRM_URL.into(),
            nominatim_url: DEFAULT_NOMINATIM_URL.into(),
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    /// Sets one value by its upper-case key. Rejected values leave the
    /// current setting untouched.
    fn apply(&mut self, key: &str, raw: &str) -> Result<(), String> {
        let raw = raw.trim();
        match key {
            "MIN_DELAY_SECONDS" => self.engine.min_delay_seconds = positive_seconds(raw)?,
            "MAX_DELAY_SECONDS" => self.engine.max_delay_seconds = positive_seconds(raw)?,
            "DEFAULT_DELAY_SECONDS" => self.default_delay_seconds = positive_seconds(raw)?,
            "PAUSE_POLL_INTERVAL_MS" => self.engine.pause_poll_interval_ms = non_zero(raw)?,
            "MAX_CONSECUTIVE_FAILURES" => {
                self.engine.max_consecutive_dispatch_failures = non_zero(raw)?
            }
            "DWELL_POINTS" => {
                self.dwell_points = raw.parse().map_err(|_| "expected a count".to_string())?
            }
            "OSRM_URL" => self.osrm_url = non_empty(raw)?,
            "NOMINATIM_URL" => self.nominatim_url = non_empty(raw)?,
            "LOG" => self.log_filter = non_empty(raw)?,
            _ => return Err("unknown setting".into()),
        }
        Ok(())
    }
}

fn positive_seconds(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err("expected a positive number of seconds".into()),
    }
}

fn non_zero<T>(raw: &str) -> Result<T, String>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match raw.parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err("expected a positive integer".into()),
    }
}

fn non_empty(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        Err("must not be empty".into())
    } else {
        Ok(raw.to_string())
    }
}

#[derive(Debug)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub file: Option<PathBuf>,
    /// Values that were rejected, formatted for logging once tracing is up.
    pub ignored: Vec<String>,
}

pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<LoadedSettings> {
    load_settings_with(explicit, Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file, then `GPS_SIM__*` variables from `env`.
/// An explicit file must exist; the fallback file is optional.
pub fn load_settings_with(
    explicit: Option<&Path>,
    fallback: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<LoadedSettings> {
    let mut settings = Settings::default();
    let mut ignored = Vec::new();

    let file = match explicit {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            Some((path.to_path_buf(), raw))
        }
        None => match fs::read_to_string(fallback) {
            Ok(raw) => Some((fallback.to_path_buf(), raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read config file '{}'", fallback.display())
                })
            }
        },
    };

    if let Some((path, raw)) = &file {
        let table = toml::from_str::<toml::Table>(raw)
            .with_context(|| format!("invalid TOML in '{}'", path.display()))?;
        for (key, value) in &table {
            let raw = match value {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if let Err(reason) = settings.apply(&key.to_ascii_uppercase(), &raw) {
                ignored.push(format!("{}: {key} = {value}: {reason}", path.display()));
            }
        }
    }

    for key in KEYS {
        let name = format!("{ENV_PREFIX}{key}");
        if let Some(raw) = env(&name) {
            if let Err(reason) = settings.apply(key, &raw) {
                ignored.push(format!("{name}={raw}: {reason}"));
            }
        }
    }

    Ok(LoadedSettings {
        settings,
        file: file.map(|(path, _)| path),
        ignored,
    })
}

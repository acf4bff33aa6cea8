mod config;
mod console;
mod input;
mod prompt;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use engine::{Engine, SessionOutcome, StopReason, WaypointSequence};
use platform::CommandDispatcher;
use routing::{
    dwell::{DEFAULT_MAX_RADIUS_M, DEFAULT_MIN_RADIUS_M},
    dwell_points, travel_mode_or_default, CsvRouteSource, NominatimClient, OsrmRouteSource,
};
use shared::domain::{Coordinate, Platform, PlatformTarget};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{console::ConsoleReporter, input::TerminalInput, prompt::Prompter};

const DEFAULT_CSV_PATH: &str = "data/sample_route.csv";

#[derive(Parser, Debug)]
#[command(
    name = "gps-sim",
    version,
    about = "Simulate GPS movement along a route on an iOS simulator or Android emulator"
)]
struct Args {
    /// Target platform: ios or android.
    #[arg(long)]
    platform: Option<Platform>,
    /// iOS simulator UDID (defaults to the booted simulator).
    #[arg(long)]
    udid: Option<String>,
    /// Android emulator serial, passed to adb as -s.
    #[arg(long)]
    serial: Option<String>,
    /// Read waypoints from a CSV file instead of requesting a route.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["start", "end"])]
    csv: Option<PathBuf>,
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    start: Option<Coordinate>,
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    end: Option<Coordinate>,
    /// driving, walking or cycling.
    #[arg(long)]
    mode: Option<String>,
    /// Initial delay between waypoints, in seconds.
    #[arg(long)]
    delay: Option<f64>,
    /// Jittered points appended at the destination.
    #[arg(long)]
    dwell_points: Option<usize>,
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Print the devices the platform tool can see and exit.
    #[arg(long)]
    list_devices: bool,
    /// Read control commands as lines even on a terminal.
    #[arg(long)]
    line_input: bool,
    /// Skip reverse geocoding of the trip endpoints.
    #[arg(long)]
    no_geocode: bool,
}

#[tokio::main]
async fn main() {
    let code = match run(Args::parse()).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    // A pending stdin read would otherwise hold up runtime shutdown.
    std::process::exit(code);
}

async fn run(args: Args) -> Result<i32> {
    let loaded = config::load_settings(args.config.as_deref())?;
    let mut settings = loaded.settings;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &loaded.file {
        info!(path = %path.display(), "loaded settings file");
    }
    for note in &loaded.ignored {
        warn!(setting = %note, "ignoring invalid setting");
    }
    if let Some(delay) = args.delay {
        settings.default_delay_seconds = delay;
    }
    if let Some(count) = args.dwell_points {
        settings.dwell_points = count;
    }

    println!("\n=== GPS Location Simulator ===");
    let mut prompter = Prompter::stdio();

    let platform = match args.platform {
        Some(platform) => platform,
        None => prompter.ask_platform()?,
    };
    platform::ensure_tool_available(platform)?;

    if args.list_devices {
        print!("{}", platform::list_devices(platform).await?);
        return Ok(0);
    }

    let target = match platform {
        Platform::Ios => PlatformTarget::ios(args.udid.clone()),
        Platform::Android => PlatformTarget::android(args.serial.clone()),
    };

    let use_csv = match (&args.csv, args.start, args.end) {
        (Some(_), _, _) => true,
        (None, None, None) => prompter.ask_yes_no("Use CSV file?", false)?,
        _ => false,
    };

    let route = if use_csv {
        let path = match &args.csv {
            Some(path) => path.clone(),
            None => PathBuf::from(prompter.ask_or("Enter CSV file path", DEFAULT_CSV_PATH)?),
        };
        let source = CsvRouteSource::new(path);
        let route = WaypointSequence::load(&source).await.with_context(|| {
            format!(
                "aborting simulation: could not load '{}'",
                source.path().display()
            )
        })?;
        println!("Route loaded with {} waypoints", route.len());
        println!("Trip: {} -> {}", route.first(), route.last());
        route
    } else {
        let start = match args.start {
            Some(start) => start,
            None => prompter.ask_coordinate("Enter START")?,
        };
        let end = match args.end {
            Some(end) => end,
            None => prompter.ask_coordinate("Enter DESTINATION")?,
        };
        let mode = match &args.mode {
            Some(mode) => mode.clone(),
            None => prompter.ask_or("Enter MODE (driving/walking/cycling)", "driving")?,
        };
        let mode = travel_mode_or_default(&mode);

        println!("Fetching route...");
        let source = OsrmRouteSource::new(&settings.osrm_url, start, end, mode)?;
        let route = WaypointSequence::load(&source)
            .await
            .context("aborting simulation: could not fetch route")?;

        let (from, to) = if args.no_geocode {
            (start.to_string(), end.to_string())
        } else {
            let geocoder = NominatimClient::new(&settings.nominatim_url)?;
            (
                geocoder.location_name(start).await,
                geocoder.location_name(end).await,
            )
        };
        println!("Route found with {} waypoints", route.len());
        println!("Trip: {from} -> {to}");
        route
    };

    let engine = Engine::new(
        settings.engine.clone(),
        Arc::new(CommandDispatcher::new()),
        Arc::new(ConsoleReporter::stdout()),
    )?;

    let bounds = engine.config();
    let delay = match args.delay {
        Some(delay) => delay,
        None => prompter.ask_delay(
            (bounds.min_delay_seconds, bounds.max_delay_seconds),
            settings.default_delay_seconds,
        )?,
    };
    // Control input reads stdin from here on.
    drop(prompter);

    let route = with_dwell(route, settings.dwell_points)?;
    let control = engine.control(delay)?;

    let interrupt = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.stop_with(StopReason::Interrupted);
        }
    });

    let input = TerminalInput::for_stdin(args.line_input).context("failed to read keyboard")?;
    if input.is_raw() {
        print!("\r\nControls: [P]ause [R]esume [+]SpeedUp [-]SlowDown [Q]uit\r\n");
    } else {
        println!("\nControls: type p, r, +, - or q and press Enter");
    }

    let outcome = engine.run_session(route, control, target, input).await;
    println!();

    match outcome {
        SessionOutcome::Completed { .. } => Ok(0),
        SessionOutcome::Stopped { reason, .. } if reason.is_user_initiated() => Ok(0),
        SessionOutcome::Stopped { reason, .. } => {
            warn!(%reason, "simulation did not finish");
            Ok(2)
        }
        SessionOutcome::Failed(error) => Err(error).context("simulation failed"),
    }
}

/// Appends jittered copies of the destination so the device appears to
/// linger there.
fn with_dwell(route: WaypointSequence, count: usize) -> Result<WaypointSequence> {
    if count == 0 {
        return Ok(route);
    }
    let dwell = dwell_points(
        route.last(),
        count,
        DEFAULT_MIN_RADIUS_M,
        DEFAULT_MAX_RADIUS_M,
        &mut rand::thread_rng(),
    );
    let waypoints = route.iter().copied().chain(dwell).collect();
    Ok(WaypointSequence::new(waypoints)?)
}

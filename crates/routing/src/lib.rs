//! Route acquisition: turns a routing service response or a coordinate file
//! into the ordered waypoint list the engine consumes.

use shared::domain::TravelMode;
use tracing::warn;

pub mod csv;
pub mod dwell;
pub mod geocode;
pub mod osrm;

pub use self::csv::CsvRouteSource;
pub use dwell::dwell_points;
pub use geocode::NominatimClient;
pub use osrm::OsrmRouteSource;

/// Parses a travel mode, falling back to driving for anything unrecognised.
pub fn travel_mode_or_default(input: &str) -> TravelMode {
    if input.trim().is_empty() {
        return TravelMode::default();
    }
    input.parse().unwrap_or_else(|error: String| {
        warn!(%error, "defaulting to driving");
        TravelMode::default()
    })
}

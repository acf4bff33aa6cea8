// Coordinate files: one `lat,lon` pair per line, optional header row.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use engine::RouteSource;
use shared::{domain::Coordinate, error::RouteError};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CsvRoute {
    pub waypoints: Vec<Coordinate>,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone)]
pub struct CsvRouteSource {
    path: PathBuf,
}

impl CsvRouteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RouteSource for CsvRouteSource {
    async fn load(&self) -> Result<Vec<Coordinate>, RouteError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RouteError::Io {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        let route = parse_route_csv(&contents);
        if route.waypoints.is_empty() {
            warn!(path = %self.path.display(), "no valid coordinates found in CSV file");
            return Err(RouteError::Empty);
        }

        info!(
            path = %self.path.display(),
            waypoints = route.waypoints.len(),
            skipped_rows = route.skipped_rows,
            "loaded coordinates from CSV"
        );
        Ok(route.waypoints)
    }
}

/// Parses CSV text. The first non-blank line is treated as a header when its
/// first two fields are not both numbers. Bad rows are skipped and counted.
pub fn parse_route_csv(contents: &str) -> CsvRoute {
    let mut waypoints = Vec::new();
    let mut skipped_rows = 0;
    let mut seen_first_row = false;

    for (line_index, line) in contents.lines().enumerate() {
        let line_number = line_index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(clean_field).collect();
        let is_first_row = !seen_first_row;
        seen_first_row = true;

        if fields.len() < 2 {
            warn!(line = line_number, "skipping row: insufficient columns");
            skipped_rows += 1;
            continue;
        }

        let (Ok(latitude), Ok(longitude)) = (fields[0].parse::<f64>(), fields[1].parse::<f64>())
        else {
            if is_first_row {
                debug!(header = line, "skipping CSV header row");
            } else {
                warn!(line = line_number, "skipping row: invalid number format");
                skipped_rows += 1;
            }
            continue;
        };

        match Coordinate::checked(latitude, longitude) {
            Ok(coordinate) => waypoints.push(coordinate),
            Err(error) => {
                warn!(line = line_number, %error, "skipping row: invalid coordinates");
                skipped_rows += 1;
            }
        }
    }

    CsvRoute {
        waypoints,
        skipped_rows,
    }
}

fn clean_field(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

use std::time::Duration;

use async_trait::async_trait;
use engine::RouteSource;
use reqwest::Client;
use serde::Deserialize;
use shared::{
    domain::{Coordinate, TravelMode},
    error::RouteError,
};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    #[serde(default)]
    geometry: Option<OsrmGeometry>,
}

/// GeoJSON line string; positions are `[lon, lat]`.
#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Driving/walking/cycling route from an OSRM server.
#[derive(Debug, Clone)]
pub struct OsrmRouteSource {
    client: Client,
    base_url: Url,
    start: Coordinate,
    end: Coordinate,
    mode: TravelMode,
}

impl OsrmRouteSource {
    pub fn new(
        base_url: &str,
        start: Coordinate,
        end: Coordinate,
        mode: TravelMode,
    ) -> Result<Self, RouteError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RouteError::Http(format!("invalid routing url '{base_url}': {e}")))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RouteError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            start,
            end,
            mode,
        })
    }

    pub fn request_url(&self) -> Result<Url, RouteError> {
        let coordinates = format!(
            "{},{};{},{}",
            self.start.longitude, self.start.latitude, self.end.longitude, self.end.latitude
        );

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RouteError::Http(format!("routing url '{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["route", "v1", self.mode.as_str(), coordinates.as_str()]);
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson");
        Ok(url)
    }
}

#[async_trait]
impl RouteSource for OsrmRouteSource {
    async fn load(&self) -> Result<Vec<Coordinate>, RouteError> {
        let url = self.request_url()?;
        info!(mode = %self.mode, "fetching route from OSRM");
        debug!(%url, "OSRM request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RouteError::Http(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RouteError::Http(e.to_string()))?;

        if !status.is_success() {
            let parsed = serde_json::from_str::<OsrmResponse>(&body).ok();
            if parsed.as_ref().and_then(|r| r.code.as_deref()) == Some("NoRoute") {
                return Err(RouteError::NoRoute);
            }
            let detail = parsed.and_then(|r| r.message).unwrap_or(body);
            return Err(RouteError::Http(format!("{status}: {detail}")));
        }

        let parsed: OsrmResponse = serde_json::from_str(&body)
            .map_err(|e| RouteError::Http(format!("malformed OSRM response: {e}")))?;
        let route = route_from_response(parsed, self.end)?;
        info!(waypoints = route.len(), "route fetched");
        Ok(route)
    }
}

/// Converts the first route's geometry to `(lat, lon)` order and makes sure
/// the exact requested destination is the final point.
pub(crate) fn route_from_response(
    response: OsrmResponse,
    end: Coordinate,
) -> Result<Vec<Coordinate>, RouteError> {
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(RouteError::NoRoute)?;
    let geometry = route.geometry.ok_or(RouteError::InvalidGeometry)?;

    let mut waypoints: Vec<Coordinate> = geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| Coordinate::new(lat, lon))
        .collect();
    if waypoints.is_empty() {
        return Err(RouteError::Empty);
    }
    if waypoints.last() != Some(&end) {
        waypoints.push(end);
    }
    Ok(waypoints)
}

#[cfg(test)]
#[path = "tests/osrm_tests.rs"]
mod tests;

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use shared::{domain::Coordinate, error::RouteError};
use tracing::warn;
use url::Url;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
// Nominatim's usage policy requires an identifying user agent.
const USER_AGENT: &str = concat!("gps-sim/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReversePlace {
    #[serde(default)]
    address: Option<Map<String, Value>>,
    #[serde(default)]
    display_name: Option<String>,
}

/// Reverse geocoder used to label trip endpoints.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: Url,
}

impl NominatimClient {
    pub fn new(base_url: &str) -> Result<Self, RouteError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RouteError::Http(format!("invalid geocoder url '{base_url}': {e}")))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RouteError::Http(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// Human-readable name for `coordinate`. Never fails: lookup problems are
    /// logged and the formatted coordinate is returned instead.
    pub async fn location_name(&self, coordinate: Coordinate) -> String {
        match self.reverse(coordinate).await {
            Ok(place) => describe_place(&place).unwrap_or_else(|| coordinate.to_string()),
            Err(error) => {
                warn!(%coordinate, %error, "could not get location name");
                coordinate.to_string()
            }
        }
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<ReversePlace, reqwest::Error> {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("reverse");
        }
        url.query_pairs_mut()
            .append_pair("lat", &coordinate.latitude.to_string())
            .append_pair("lon", &coordinate.longitude.to_string())
            .append_pair("format", "json")
            .append_pair("accept-language", "en");

        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<ReversePlace>()
            .await
    }
}

/// "first address component - city - country", using whichever of those are
/// present, else the full display name.
pub(crate) fn describe_place(place: &ReversePlace) -> Option<String> {
    if let Some(address) = &place.address {
        let mut parts: Vec<&str> = Vec::new();
        let first = address.values().next().and_then(Value::as_str);
        let city = address.get("city").and_then(Value::as_str);
        let country = address.get("country").and_then(Value::as_str);

        for part in [first, city, country].into_iter().flatten() {
            if !part.is_empty() && !parts.contains(&part) {
                parts.push(part);
            }
        }
        if !parts.is_empty() {
            return Some(parts.join(" - "));
        }
    }

    place
        .display_name
        .as_ref()
        .filter(|name| !name.is_empty())
        .cloned()
}

#[cfg(test)]
#[path = "tests/geocode_tests.rs"]
mod tests;

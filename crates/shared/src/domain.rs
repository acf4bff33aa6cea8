use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CoordinateError;

pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// A single GPS fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a coordinate, rejecting values outside the valid lat/lon ranges.
    pub fn checked(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        let coordinate = Self::new(latitude, longitude);
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (LATITUDE_RANGE.0..=LATITUDE_RANGE.1).contains(&self.latitude)
            && (LONGITUDE_RANGE.0..=LONGITUDE_RANGE.1).contains(&self.longitude)
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CoordinateError::OutOfRange {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    /// Parses `"lat,lon"`, e.g. `37.7749,-122.4194`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || CoordinateError::Malformed {
            input: input.trim().to_string(),
        };

        let mut parts = input.split(',');
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        let latitude = lat.trim().parse::<f64>().map_err(|_| malformed())?;
        let longitude = lon.trim().parse::<f64>().map_err(|_| malformed())?;

        Self::checked(latitude, longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(format!("invalid platform '{other}': choose 'ios' or 'android'")),
        }
    }
}

pub const DEFAULT_IOS_UDID: &str = "booted";

/// The emulator or simulator that receives location fixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum PlatformTarget {
    Ios { udid: String },
    Android { serial: Option<String> },
}

impl PlatformTarget {
    pub fn ios(udid: Option<String>) -> Self {
        PlatformTarget::Ios {
            udid: udid.unwrap_or_else(|| DEFAULT_IOS_UDID.to_string()),
        }
    }

    pub fn android(serial: Option<String>) -> Self {
        PlatformTarget::Android { serial }
    }

    pub fn platform(&self) -> Platform {
        match self {
            PlatformTarget::Ios { .. } => Platform::Ios,
            PlatformTarget::Android { .. } => Platform::Android,
        }
    }
}

impl Default for PlatformTarget {
    fn default() -> Self {
        Self::ios(None)
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformTarget::Ios { udid } => write!(f, "ios:{udid}"),
            PlatformTarget::Android { serial: Some(serial) } => write!(f, "android:{serial}"),
            PlatformTarget::Android { serial: None } => f.write_str("android:default"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "driving" => Ok(TravelMode::Driving),
            "walking" => Ok(TravelMode::Walking),
            "cycling" => Ok(TravelMode::Cycling),
            other => Err(format!("invalid travel mode '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_coordinate() {
        let coordinate: Coordinate = " 37.7749, -122.4194 ".parse().expect("coordinate");
        assert_eq!(coordinate, Coordinate::new(37.7749, -122.4194));
    }

    #[test]
    fn rejects_out_of_range_and_malformed_input() {
        assert!(matches!(
            "91,0".parse::<Coordinate>(),
            Err(CoordinateError::OutOfRange { .. })
        ));
        assert!(matches!(
            "0,-180.5".parse::<Coordinate>(),
            Err(CoordinateError::OutOfRange { .. })
        ));
        assert!(matches!(
            "37.7749".parse::<Coordinate>(),
            Err(CoordinateError::Malformed { .. })
        ));
        assert!(matches!(
            "1,2,3".parse::<Coordinate>(),
            Err(CoordinateError::Malformed { .. })
        ));
        assert!(matches!(
            "north,west".parse::<Coordinate>(),
            Err(CoordinateError::Malformed { .. })
        ));
    }

    #[test]
    fn non_finite_coordinates_are_invalid() {
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
    }

    #[test]
    fn platform_and_mode_parse_case_insensitively() {
        assert_eq!("IOS".parse::<Platform>(), Ok(Platform::Ios));
        assert_eq!("Android".parse::<Platform>(), Ok(Platform::Android));
        assert!("windows".parse::<Platform>().is_err());
        assert_eq!("Walking".parse::<TravelMode>(), Ok(TravelMode::Walking));
        assert!("flying".parse::<TravelMode>().is_err());
    }

    #[test]
    fn ios_target_defaults_to_booted_simulator() {
        let target = PlatformTarget::ios(None);
        assert_eq!(target.to_string(), "ios:booted");
        assert_eq!(target.platform(), Platform::Ios);
        assert_eq!(PlatformTarget::default(), target);
    }

    #[test]
    fn platform_target_serializes_with_platform_tag() {
        let target = PlatformTarget::android(Some("emulator-5554".into()));
        let value = serde_json::to_value(&target).expect("serialize");
        assert_eq!(value["platform"], "android");
        assert_eq!(value["serial"], "emulator-5554");
    }
}

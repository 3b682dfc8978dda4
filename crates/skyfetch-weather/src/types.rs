use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WeatherError;
use crate::validation;

/// Two coordinates closer than this on both axes refer to the same place.
pub const SAME_LOCATION_TOLERANCE: f64 = 0.01;

/// Refresh strategy of an SDK instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Refresh only the requested location when it is missing or stale
    #[default]
    OnDemand,
    /// Refresh every stale cached location on each request
    Polling,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnDemand => "ON_DEMAND",
            Self::Polling => "POLLING",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "on_demand" | "ondemand" => Ok(Self::OnDemand),
            "polling" => Ok(Self::Polling),
            other => Err(format!(
                "unknown mode '{}', expected on-demand or polling",
                other
            )),
        }
    }
}

/// Geographic point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both axes differ by at most [`SAME_LOCATION_TOLERANCE`].
    pub fn same_location(&self, other: &Coordinates) -> bool {
        (self.lat - other.lat).abs() <= SAME_LOCATION_TOLERANCE
            && (self.lon - other.lon).abs() <= SAME_LOCATION_TOLERANCE
    }

    /// Render as the provider's `lat=..&lon=..` query fragment.
    pub fn to_query(&self) -> String {
        format!("lat={:.6}&lon={:.6}", self.lat, self.lon)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lat={}&lon={}", self.lat, self.lon)
    }
}

impl FromStr for Coordinates {
    type Err = WeatherError;

    /// Parse a `lat=55.7522&lon=37.6156` string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validation::validate_coordinate_query(s)?;
        let invalid = || WeatherError::InvalidCoordinateFormat(s.to_string());

        let (lat_part, lon_part) = s.split_once('&').ok_or_else(invalid)?;
        let lat = lat_part
            .trim_start_matches("lat=")
            .parse::<f64>()
            .map_err(|_| invalid())?;
        let lon = lon_part
            .trim_start_matches("lon=")
            .parse::<f64>()
            .map_err(|_| invalid())?;

        Ok(Self { lat, lon })
    }
}

/// A geocoding candidate for a city name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedCity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_names: Option<HashMap<String, String>>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl GeocodedCity {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Main condition and its longer description (e.g. "Clouds", "broken clouds")
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub main: String,
    pub description: String,
}

/// Temperature in the provider's unit (Kelvin by default)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Temperature {
    pub temp: f64,
    pub feels_like: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

/// Sunrise and sunset as unix timestamps
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SunCycle {
    pub sunrise: i64,
    pub sunset: i64,
}

/// Current conditions for one location, as handed back to callers
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Coordinates reported by the provider; not part of the JSON output
    #[serde(skip)]
    pub location: Coordinates,
    pub weather: WeatherSummary,
    pub temperature: Temperature,
    pub visibility: u32,
    pub wind: Wind,
    /// Observation time (unix seconds) reported by the provider
    #[serde(rename = "datetime")]
    pub observed_at: i64,
    pub sys: SunCycle,
    /// Shift in seconds from UTC
    pub timezone: i32,
    pub name: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_same_location_within_tolerance() {
        let a = Coordinates::new(55.7522, 37.6156);
        assert!(a.same_location(&Coordinates::new(55.7572, 37.6106)));
        assert!(a.same_location(&Coordinates::new(55.7450, 37.6200)));
    }

    #[test]
    fn test_same_location_outside_tolerance() {
        let a = Coordinates::new(55.7522, 37.6156);
        assert!(!a.same_location(&Coordinates::new(55.7722, 37.6156)));
        assert!(!a.same_location(&Coordinates::new(55.7522, 37.5956)));
    }

    #[test]
    fn test_same_location_tolerance_boundary() {
        let a = Coordinates::new(55.7522, 37.6156);

        // A delta of 0.01 still matches, in both directions.
        let edge = Coordinates::new(55.7622, 37.6156);
        assert!(a.same_location(&edge));
        assert!(edge.same_location(&a));

        // 0.0101 is just outside on either axis.
        assert!(!a.same_location(&Coordinates::new(55.7623, 37.6156)));
        assert!(!a.same_location(&Coordinates::new(55.7522, 37.6257)));
    }

    #[test]
    fn test_to_query_matches_provider_pattern() {
        let query = Coordinates::new(55.7522, 37.6156).to_query();
        assert_eq!(query, "lat=55.752200&lon=37.615600");
        assert!(validation::validate_coordinate_query(&query).is_ok());

        let query = Coordinates::new(-33.0, -151.2).to_query();
        assert!(validation::validate_coordinate_query(&query).is_ok());
    }

    #[test]
    fn test_coordinates_from_str() {
        let coords: Coordinates = "lat=55.7522&lon=37.6156".parse().unwrap();
        assert_eq!(coords, Coordinates::new(55.7522, 37.6156));

        let coords: Coordinates = "lat=-3.12&lon=-120.55".parse().unwrap();
        assert_eq!(coords, Coordinates::new(-3.12, -120.55));
    }

    #[test]
    fn test_coordinates_from_str_rejects_garbage() {
        let err = "lat=55&lon=37".parse::<Coordinates>().unwrap_err();
        assert!(matches!(err, WeatherError::InvalidCoordinateFormat(_)));
        assert!("55.75,37.61".parse::<Coordinates>().is_err());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("polling".parse::<Mode>().unwrap(), Mode::Polling);
        assert_eq!("ON_DEMAND".parse::<Mode>().unwrap(), Mode::OnDemand);
        assert_eq!("on-demand".parse::<Mode>().unwrap(), Mode::OnDemand);
        assert!("sometimes".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_serde_uses_screaming_case() {
        assert_eq!(serde_json::to_string(&Mode::Polling).unwrap(), "\"POLLING\"");
        let mode: Mode = serde_json::from_str("\"ON_DEMAND\"").unwrap();
        assert_eq!(mode, Mode::OnDemand);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = WeatherSnapshot {
            location: Coordinates::new(55.7522, 37.6156),
            weather: WeatherSummary {
                main: "Clouds".into(),
                description: "broken clouds".into(),
            },
            temperature: Temperature {
                temp: 284.2,
                feels_like: 282.93,
            },
            visibility: 10000,
            wind: Wind { speed: 4.09 },
            observed_at: 1_740_220_000,
            sys: SunCycle {
                sunrise: 1_740_199_086,
                sunset: 1_740_235_699,
            },
            timezone: 10800,
            name: "Moscow".into(),
        };

        let json: serde_json::Value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["datetime"], 1_740_220_000);
        assert_eq!(json["temperature"]["feels_like"], 282.93);
        assert_eq!(json["name"], "Moscow");
        assert!(json.get("location").is_none());
    }
}

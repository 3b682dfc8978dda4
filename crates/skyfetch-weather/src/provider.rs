//! Current-weather provider: the trait the SDK fetches through and the
//! OpenWeatherMap-backed implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::api::{self, DEFAULT_WEATHER_URL, REQUEST_TIMEOUT_SECS};
use crate::error::WeatherError;
use crate::types::{Coordinates, SunCycle, Temperature, WeatherSnapshot, WeatherSummary, Wind};
use crate::validation;

/// Fetches a weather snapshot for a coordinate pair.
pub trait WeatherProvider: Send + Sync {
    fn fetch(
        &self,
        location: &Coordinates,
        api_key: &str,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>> + Send;
}

/// OpenWeatherMap `/weather` client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Arc<Client>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(DEFAULT_WEATHER_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = api::build_http_client(timeout)?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self, api_key), level = "info")]
    async fn fetch(
        &self,
        location: &Coordinates,
        api_key: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let query = location.to_query();
        validation::validate_coordinate_query(&query)?;

        let url = format!("{}/weather?{}", self.base_url, query);
        tracing::debug!("Requesting current weather: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("appid", api_key)])
            .send()
            .await?;

        let body: CurrentWeatherResponse = api::decode_response(response).await?;
        body.into_snapshot()
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    coord: CoordResponse,
    #[serde(default)]
    weather: Vec<ConditionResponse>,
    main: MainResponse,
    #[serde(default)]
    visibility: u32,
    #[serde(default)]
    wind: WindResponse,
    dt: i64,
    #[serde(default)]
    sys: SysResponse,
    #[serde(default)]
    timezone: i32,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CoordResponse {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionResponse {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainResponse {
    temp: f64,
    feels_like: f64,
}

#[derive(Debug, Default, Deserialize)]
struct WindResponse {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct SysResponse {
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

impl CurrentWeatherResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, WeatherError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Parse("response has no weather conditions".into()))?;

        Ok(WeatherSnapshot {
            location: Coordinates::new(self.coord.lat, self.coord.lon),
            weather: WeatherSummary {
                main: condition.main,
                description: condition.description,
            },
            temperature: Temperature {
                temp: self.main.temp,
                feels_like: self.main.feels_like,
            },
            visibility: self.visibility,
            wind: Wind {
                speed: self.wind.speed,
            },
            observed_at: self.dt,
            sys: SunCycle {
                sunrise: self.sys.sunrise,
                sunset: self.sys.sunset,
            },
            timezone: self.timezone,
            name: self.name,
        })
    }
}

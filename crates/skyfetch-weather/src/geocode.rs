//! Forward geocoding: turn a city name into coordinates.
//! Uses the OpenWeatherMap direct geocoding endpoint, which shares the weather API key.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::instrument;

use crate::api::{self, DEFAULT_GEOCODING_URL, REQUEST_TIMEOUT_SECS};
use crate::error::WeatherError;
use crate::types::GeocodedCity;

/// Resolves a city name into an ordered list of candidates, best match first.
pub trait GeocodingResolver: Send + Sync {
    fn resolve(
        &self,
        city_name: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<Vec<GeocodedCity>, WeatherError>> + Send;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherGeocoder {
    client: Arc<Client>,
    base_url: String,
    limit: u8,
}

impl OpenWeatherGeocoder {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(DEFAULT_GEOCODING_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = api::build_http_client(timeout)?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            limit: 1,
        })
    }

    /// Ask the provider for up to `limit` candidates (it caps this at 5).
    pub fn with_limit(mut self, limit: u8) -> Self {
        self.limit = limit.clamp(1, 5);
        self
    }
}

impl GeocodingResolver for OpenWeatherGeocoder {
    #[instrument(skip(self, api_key), level = "info")]
    async fn resolve(
        &self,
        city_name: &str,
        api_key: &str,
    ) -> Result<Vec<GeocodedCity>, WeatherError> {
        let url = format!("{}/direct", self.base_url);
        let limit = self.limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("q", city_name), ("limit", limit.as_str()), ("appid", api_key)])
            .send()
            .await?;

        let candidates: Vec<GeocodedCity> = api::decode_response(response).await?;
        if candidates.is_empty() {
            tracing::debug!("No geocoding candidates for '{}'", city_name);
            return Err(WeatherError::CityNotFound(city_name.to_string()));
        }

        tracing::info!(
            "Geocoded '{}' to {} candidate(s), first at lat={} lon={}",
            city_name,
            candidates.len(),
            candidates[0].lat,
            candidates[0].lon
        );
        Ok(candidates)
    }
}

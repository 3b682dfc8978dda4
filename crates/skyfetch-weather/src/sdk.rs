//! Per-API-key weather client: geocode, consult the cache, fetch on miss.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::instrument;

use crate::cache::{CacheEntry, FreshnessCache, Upsert};
use crate::clock::Clock;
use crate::error::WeatherError;
use crate::geocode::GeocodingResolver;
use crate::provider::WeatherProvider;
use crate::types::{Coordinates, GeocodedCity, Mode, WeatherSnapshot};
use crate::validation;

/// One SDK instance. Obtain it through [`SdkRegistry::create`](crate::SdkRegistry::create)
/// so there is never more than one per API key.
pub struct WeatherSdk<G, P> {
    api_key: String,
    mode: RwLock<Mode>,
    cache: FreshnessCache,
    geocoder: Arc<G>,
    provider: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<G, P> std::fmt::Debug for WeatherSdk<G, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherSdk")
            .field("api_key", &validation::redact_api_key(&self.api_key))
            .field("mode", &*self.mode.read())
            .field("cached_locations", &self.cache.len())
            .finish()
    }
}

impl<G, P> WeatherSdk<G, P>
where
    G: GeocodingResolver,
    P: WeatherProvider,
{
    pub(crate) fn new(
        api_key: String,
        mode: Mode,
        geocoder: Arc<G>,
        provider: Arc<P>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api_key,
            mode: RwLock::new(mode),
            cache: FreshnessCache::new(),
            geocoder,
            provider,
            clock,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn mode(&self) -> Mode {
        *self.mode.read()
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.mode.write() = mode;
        tracing::info!(
            "Mode for API key \"{}\" set to {}",
            validation::redact_api_key(&self.api_key),
            mode
        );
    }

    /// Number of locations currently held in this instance's cache.
    pub fn cached_locations(&self) -> usize {
        self.cache.len()
    }

    pub fn cache(&self) -> &FreshnessCache {
        &self.cache
    }

    /// Resolve `city_name` and return the first candidate.
    ///
    /// # Errors
    /// `InvalidCityName` before any request, `CityNotFound` when the resolver has no
    /// candidates, and whatever the resolver itself reports.
    pub async fn geocoding_info(&self, city_name: &str) -> Result<GeocodedCity, WeatherError> {
        validation::validate_city_name(city_name)?;

        let candidates = self.geocoder.resolve(city_name, &self.api_key).await?;
        candidates
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::CityNotFound(city_name.to_string()))
    }

    /// [`geocoding_info`](Self::geocoding_info) rendered as JSON.
    pub async fn geocoding_info_json(&self, city_name: &str) -> Result<String, WeatherError> {
        let city = self.geocoding_info(city_name).await?;
        serde_json::to_string(&city).map_err(|e| WeatherError::Parse(e.to_string()))
    }

    /// Current weather for `city_name`, served from cache while fresh.
    ///
    /// In [`Mode::Polling`] every stale cached location is refreshed first; a failure
    /// there aborts the call.
    ///
    /// # Errors
    /// Validation, geocoding and provider errors propagate unchanged.
    #[instrument(skip(self), level = "info")]
    pub async fn retrieve(&self, city_name: &str) -> Result<WeatherSnapshot, WeatherError> {
        let city = self.geocoding_info(city_name).await?;
        let location = city.coordinates();

        if self.mode() == Mode::Polling {
            tracing::info!("Polling mode: refreshing stale cached locations");
            let refreshed = self
                .cache
                .refresh_all(self.provider.as_ref(), &self.api_key, self.clock.as_ref())
                .await?;
            tracing::debug!("Refreshed {} cached location(s)", refreshed);
        }

        if let Some(entry) = self.cache.lookup(&location) {
            if entry.is_fresh(self.clock.now()) {
                tracing::info!("Serving '{}' from cache", city_name);
                return Ok(entry.snapshot);
            }
            tracing::info!("Cached weather for '{}' is stale", city_name);
        } else {
            tracing::info!("No cached weather for '{}'", city_name);
        }

        self.fetch_and_store(location).await
    }

    /// [`retrieve`](Self::retrieve) rendered as JSON.
    pub async fn retrieve_json(&self, city_name: &str) -> Result<String, WeatherError> {
        let snapshot = self.retrieve(city_name).await?;
        serde_json::to_string(&snapshot).map_err(|e| WeatherError::Parse(e.to_string()))
    }

    async fn fetch_and_store(&self, location: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        let snapshot = self.provider.fetch(&location, &self.api_key).await?;
        let entry = CacheEntry::new(location, snapshot.clone(), self.clock.now());

        if let Upsert::Evicted(old) = self.cache.upsert(entry) {
            tracing::info!(
                "Evicted '{}' to make room for {}",
                old.snapshot.name,
                location
            );
        }
        Ok(snapshot)
    }
}

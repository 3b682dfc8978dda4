//! Current-weather SDK for Skyfetch
//!
//! Resolves city names to coordinates, fetches current conditions from an
//! OpenWeatherMap-compatible API and keeps a small freshness-aware cache per
//! API key.

mod api;
pub mod cache;
pub mod clock;
pub mod error;
pub mod geocode;
pub mod provider;
pub mod registry;
pub mod sdk;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

pub use api::{DEFAULT_GEOCODING_URL, DEFAULT_WEATHER_URL, REQUEST_TIMEOUT_SECS};
pub use cache::{CacheEntry, FreshnessCache, Upsert, CACHE_CAPACITY, FRESHNESS_WINDOW_SECS};
pub use clock::{Clock, SystemClock};
pub use error::WeatherError;
pub use geocode::{GeocodingResolver, OpenWeatherGeocoder};
pub use provider::{OpenWeatherClient, WeatherProvider};
pub use registry::SdkRegistry;
pub use sdk::WeatherSdk;
pub use types::*;

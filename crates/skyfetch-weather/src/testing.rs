//! In-memory collaborators for unit tests.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::WeatherError;
use crate::geocode::GeocodingResolver;
use crate::provider::WeatherProvider;
use crate::types::{Coordinates, GeocodedCity, WeatherSnapshot, WeatherSummary};

pub fn snapshot_at(location: Coordinates, name: &str) -> WeatherSnapshot {
    WeatherSnapshot {
        location,
        weather: WeatherSummary {
            main: "Clouds".to_string(),
            description: "broken clouds".to_string(),
        },
        name: name.to_string(),
        ..WeatherSnapshot::default()
    }
}

/// Records every fetch; optionally fails on the n-th call (1-based).
#[derive(Debug, Default)]
pub struct FakeProvider {
    calls: Mutex<Vec<Coordinates>>,
    fail_on_call: Option<usize>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on_call: Some(call),
        }
    }

    pub fn calls(&self) -> Vec<Coordinates> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl WeatherProvider for FakeProvider {
    async fn fetch(
        &self,
        location: &Coordinates,
        _api_key: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let call = {
            let mut calls = self.calls.lock();
            calls.push(*location);
            calls.len()
        };

        if self.fail_on_call == Some(call) {
            return Err(WeatherError::ProviderInternal("simulated failure".to_string()));
        }
        Ok(snapshot_at(*location, &format!("fetch-{}", call)))
    }
}

/// Resolves only the cities it was seeded with; unknown names yield no candidates.
#[derive(Debug, Default)]
pub struct FakeGeocoder {
    cities: HashMap<String, Vec<GeocodedCity>>,
    calls: Mutex<usize>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, name: &str, lat: f64, lon: f64) -> Self {
        self.cities.entry(name.to_string()).or_default().push(GeocodedCity {
            name: name.to_string(),
            local_names: None,
            lat,
            lon,
            country: "XX".to_string(),
            state: None,
        });
        self
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

impl GeocodingResolver for FakeGeocoder {
    async fn resolve(
        &self,
        city_name: &str,
        _api_key: &str,
    ) -> Result<Vec<GeocodedCity>, WeatherError> {
        *self.calls.lock() += 1;
        Ok(self.cities.get(city_name).cloned().unwrap_or_default())
    }
}

//! API key → SDK instance registry.
//!
//! Each key maps to exactly one [`WeatherSdk`]. Creating a key that already exists
//! hands back the same instance with its mode updated; its cache is kept.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::error::WeatherError;
use crate::geocode::{GeocodingResolver, OpenWeatherGeocoder};
use crate::provider::{OpenWeatherClient, WeatherProvider};
use crate::sdk::WeatherSdk;
use crate::types::Mode;
use crate::validation;

pub struct SdkRegistry<G = OpenWeatherGeocoder, P = OpenWeatherClient> {
    instances: RwLock<HashMap<String, Arc<WeatherSdk<G, P>>>>,
    clock: Arc<dyn Clock>,
}

impl<G, P> Default for SdkRegistry<G, P> {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl<G, P> SdkRegistry<G, P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose instances read time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    pub fn exists(&self, api_key: &str) -> bool {
        let present = self.instances.read().contains_key(api_key);
        tracing::debug!(
            "Presence of API key \"{}\" is {}",
            validation::redact_api_key(api_key),
            present
        );
        present
    }

    pub fn get(&self, api_key: &str) -> Option<Arc<WeatherSdk<G, P>>> {
        self.instances.read().get(api_key).cloned()
    }

    /// Remove the instance for `api_key`. Unknown keys are a no-op.
    pub fn delete(&self, api_key: &str) -> bool {
        let removed = self.instances.write().remove(api_key).is_some();
        if removed {
            tracing::info!(
                "Removed API key \"{}\" from registry",
                validation::redact_api_key(api_key)
            );
        } else {
            tracing::info!(
                "API key \"{}\" not in registry, nothing to remove",
                validation::redact_api_key(api_key)
            );
        }
        removed
    }

    pub fn delete_all(&self) {
        let mut instances = self.instances.write();
        let count = instances.len();
        instances.clear();
        tracing::info!("Removed all {} API key(s) from registry", count);
    }
}

impl<G, P> SdkRegistry<G, P>
where
    G: GeocodingResolver,
    P: WeatherProvider,
{
    /// Return the instance for `api_key`, creating it on first use.
    ///
    /// For an existing key only the mode changes; `geocoder` and `provider` are
    /// ignored and the cache is preserved.
    ///
    /// # Errors
    /// `InvalidApiKeyFormat` when the key is empty, blank or longer than 50 characters.
    pub fn create(
        &self,
        api_key: &str,
        mode: Mode,
        geocoder: Arc<G>,
        provider: Arc<P>,
    ) -> Result<Arc<WeatherSdk<G, P>>, WeatherError> {
        validation::validate_api_key(api_key)?;

        let mut instances = self.instances.write();
        if let Some(existing) = instances.get(api_key) {
            existing.set_mode(mode);
            return Ok(Arc::clone(existing));
        }

        let sdk = Arc::new(WeatherSdk::new(
            api_key.to_string(),
            mode,
            geocoder,
            provider,
            Arc::clone(&self.clock),
        ));
        instances.insert(api_key.to_string(), Arc::clone(&sdk));
        tracing::info!(
            "Registered API key \"{}\" in {} mode",
            validation::redact_api_key(api_key),
            mode
        );
        Ok(sdk)
    }
}

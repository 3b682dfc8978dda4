use std::sync::Arc;
use std::time::Duration;

use skyfetch_weather::{Mode, OpenWeatherClient, OpenWeatherGeocoder, SdkRegistry, WeatherSdk};

use crate::error::{AppError, ConfigError};
use crate::Config;

/// Application state: validated config plus the per-key SDK registry
pub struct App {
    config: Arc<Config>,
    registry: SdkRegistry,
    geocoder: Arc<OpenWeatherGeocoder>,
    provider: Arc<OpenWeatherClient>,
}

impl App {
    /// Build the application from a loaded config.
    ///
    /// Fails when the config has validation errors; warnings are logged.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let validation = config.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }
        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        let timeout = Duration::from_secs(config.weather.timeout_secs);
        let geocoder = Arc::new(OpenWeatherGeocoder::with_base_url(
            &config.weather.geocoding_url,
            timeout,
        )?);
        let provider = Arc::new(OpenWeatherClient::with_base_url(
            &config.weather.weather_url,
            timeout,
        )?);

        Ok(Self {
            config: Arc::new(config),
            registry: SdkRegistry::new(),
            geocoder,
            provider,
        })
    }

    /// SDK instance for `api_key` (falling back to the configured key) in `mode`
    /// (falling back to the configured mode).
    pub fn sdk(
        &self,
        api_key: Option<&str>,
        mode: Option<Mode>,
    ) -> Result<Arc<WeatherSdk<OpenWeatherGeocoder, OpenWeatherClient>>, AppError> {
        let api_key = api_key
            .or(self.config.weather.api_key.as_deref())
            .ok_or_else(|| ConfigError::MissingSetting("weather.api_key".to_string()))?;
        let mode = mode.unwrap_or(self.config.weather.mode);

        let sdk = self.registry.create(
            api_key,
            mode,
            Arc::clone(&self.geocoder),
            Arc::clone(&self.provider),
        )?;
        Ok(sdk)
    }

    /// Drop every registered SDK instance
    pub fn shutdown(&self) {
        tracing::info!("Shutting down application");
        self.registry.delete_all();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &SdkRegistry {
        &self.registry
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use skyfetch_weather::{validation, Mode, DEFAULT_GEOCODING_URL, DEFAULT_WEATHER_URL};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `weather.api_key`.
pub const API_KEY_ENV: &str = "SKYFETCH_API_KEY";

const MAX_TIMEOUT_SECS: u64 = 120;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Weather SDK settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key. `SKYFETCH_API_KEY` takes precedence when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Refresh mode for new SDK instances
    #[serde(default)]
    pub mode: Mode,

    /// Base URL of the geocoding API
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Base URL of the current-weather API
    #[serde(default = "default_weather_url")]
    pub weather_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_geocoding_url() -> String {
    DEFAULT_GEOCODING_URL.to_string()
}

fn default_weather_url() -> String {
    DEFAULT_WEATHER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    skyfetch_weather::REQUEST_TIMEOUT_SECS
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            mode: Mode::default(),
            geocoding_url: default_geocoding_url(),
            weather_url: default_weather_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from the user config directory, creating a default file if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("Creating default config at {}", config_path.display());
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config.with_env_overrides());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        self.with_api_key_override(std::env::var(API_KEY_ENV).ok())
    }

    /// Replace the configured API key when `value` holds a non-blank key.
    pub fn with_api_key_override(mut self, value: Option<String>) -> Self {
        if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
            tracing::debug!("Using API key from {}", API_KEY_ENV);
            self.weather.api_key = Some(key);
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        match &self.weather.api_key {
            None => result.add_warning(
                "weather.api_key",
                format!("No API key configured; pass --api-key or set {}", API_KEY_ENV),
            ),
            Some(key) => {
                if let Err(e) = validation::validate_api_key(key) {
                    result.add_error("weather.api_key", e.to_string());
                }
            }
        }

        validate_url(&self.weather.geocoding_url, "weather.geocoding_url", &mut result);
        validate_url(&self.weather.weather_url, "weather.weather_url", &mut result);

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        } else if self.weather.timeout_secs > MAX_TIMEOUT_SECS {
            result.add_warning(
                "weather.timeout_secs",
                format!("Timeout is unusually large (>{}s)", MAX_TIMEOUT_SECS),
            );
        }

        result
    }

    /// Save configuration to the user config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path to `<config_dir>/skyfetch/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skyfetch");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }

            if url.port() == Some(0) {
                result.add_error(field_name, "Port cannot be 0");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

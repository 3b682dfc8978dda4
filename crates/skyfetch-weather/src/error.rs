//! Weather SDK error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("API key must be non-blank and at most {max} characters")]
    InvalidApiKeyFormat { max: usize },

    #[error("Invalid city name: {0}")]
    InvalidCityName(String),

    #[error("Invalid coordinate string: {0}")]
    InvalidCoordinateFormat(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Provider error: {0}")]
    ProviderInternal(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidApiKeyFormat { max } => {
                format!("API key must be set and no longer than {} characters.", max)
            }
            Self::InvalidCityName(_) => {
                "City names may only contain letters, '-' and '_'.".to_string()
            }
            Self::InvalidCoordinateFormat(_) => "Coordinates are out of range.".to_string(),
            Self::InvalidApiKey => {
                "Weather API key is invalid or not yet activated. Check settings.".to_string()
            }
            Self::RateLimitExceeded => {
                "Too many weather requests. Please wait a minute.".to_string()
            }
            Self::CityNotFound(name) => format!("City '{}' was not found.", name),
            Self::ProviderInternal(msg) => format!("Weather service error: {}", msg),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Parse(_) => "Received an unexpected response from the weather service.".to_string(),
        }
    }

    /// Whether the error was raised locally before any request was sent.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::InvalidApiKeyFormat { .. }
                | Self::InvalidCityName(_)
                | Self::InvalidCoordinateFormat(_)
        )
    }

    /// Transport and payload failures that are not one of the typed provider kinds.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Parse(_))
    }
}

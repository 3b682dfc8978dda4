//! Centralized error types for the Skyfetch application layer.
//!
//! Library failures from the weather SDK are wrapped alongside configuration
//! and IO failures so the CLI can show one short message per error.

use skyfetch_weather::WeatherError;
use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message fit for the terminal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly, actionable message.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Weather(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.".to_string(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => {
                "No weather API key set. Use --api-key or set SKYFETCH_API_KEY."
            }
        }
    }
}

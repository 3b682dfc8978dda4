//! HTTP plumbing shared by the geocoding and weather clients.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::WeatherError;

pub const DEFAULT_GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("skyfetch/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, WeatherError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Decode a provider response, mapping its error envelope onto [`WeatherError`].
///
/// The provider reports failures as `{"cod": <code>, "message": "..."}`, sometimes
/// with a 200 HTTP status and sometimes with `cod` as a string. The HTTP status is
/// only consulted when the body carries no `cod`.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WeatherError> {
    let status = response.status();
    let body = response.text().await?;

    let value: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) if status.is_success() => {
            return Err(WeatherError::Parse(format!("invalid JSON body: {}", e)));
        }
        Err(_) => return Err(error_for_code(i64::from(status.as_u16()), body)),
    };

    if let Some(code) = response_code(&value) {
        if code != 200 {
            return Err(error_for_code(code, error_message(&value, &body)));
        }
    } else if !status.is_success() {
        let message = error_message(&value, &body);
        return Err(error_for_code(i64::from(status.as_u16()), message));
    }

    serde_json::from_value(value)
        .map_err(|e| WeatherError::Parse(format!("unexpected response shape: {}", e)))
}

fn response_code(value: &Value) -> Option<i64> {
    match value.get("cod")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn error_message(value: &Value, body: &str) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

fn error_for_code(code: i64, message: String) -> WeatherError {
    match code {
        401 => WeatherError::InvalidApiKey,
        429 => WeatherError::RateLimitExceeded,
        _ => WeatherError::ProviderInternal(message),
    }
}

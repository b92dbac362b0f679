use thiserror::Error;

use crate::model::WeatherReading;

/// Failure to obtain a response body from the weather provider.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to send request to weather provider: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Weather provider request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to read weather provider response body: {0}")]
    Body(#[source] reqwest::Error),
}

/// Result of decoding a provider response body.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherDecode {
    Reading(WeatherReading),
    /// Body was not a JSON object; carries the parser message.
    Malformed(String),
}

impl WeatherDecode {
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<WeatherReading>(body) {
            Ok(reading) => WeatherDecode::Reading(reading),
            Err(e) => WeatherDecode::Malformed(e.to_string()),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A device as stored in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    pub last_heartbeat: DateTime<Utc>,
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
    pub enabled: bool,
    pub connected: bool,
}

/// Value projection of a [`DeviceRecord`] handed out to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceView {
    pub id: String,
    pub last_heartbeat: DateTime<Utc>,
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
    pub enabled: bool,
    pub connected: bool,
}

impl From<&DeviceRecord> for DeviceView {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            id: record.id.clone(),
            last_heartbeat: record.last_heartbeat,
            longitude: record.longitude,
            latitude: record.latitude,
            height: record.height,
            enabled: record.enabled,
            connected: record.connected,
        }
    }
}

/// Current weather as returned by the provider, kept verbatim.
///
/// The payload schema belongs to the provider; only a JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherReading(Map<String, Value>);

impl WeatherReading {
    /// Temperature in the provider's units (`units=metric` gives Celsius).
    pub fn temperature_c(&self) -> Option<f64> {
        self.0
            .get("main")
            .and_then(|main| main.get("temp"))
            .or_else(|| self.0.get("temp"))
            .and_then(Value::as_f64)
    }

    pub fn condition(&self) -> Option<&str> {
        let first = self
            .0
            .get("weather")
            .and_then(Value::as_array)
            .and_then(|list| list.first());

        first
            .and_then(|w| w.get("description").or_else(|| w.get("main")))
            .or_else(|| self.0.get("condition"))
            .and_then(Value::as_str)
    }
}

/// A device paired with the weather at its position, when it could be obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub device: DeviceView,
    pub weather: Option<WeatherReading>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// Device found. Weather may still be absent if the payload was unreadable.
    Ok,
    DeviceNotFound,
    /// Device found but the provider could not be reached or answered with an error.
    ProviderUnavailable,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::DeviceNotFound => "DEVICE_NOT_FOUND",
            StatusCode::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one repair feasibility check: a status plus the payload it permits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairCheck {
    #[serde(rename = "code")]
    pub status: StatusCode,
    #[serde(rename = "data")]
    pub result: Option<EnrichmentResult>,
}

impl RepairCheck {
    pub fn not_found() -> Self {
        Self { status: StatusCode::DeviceNotFound, result: None }
    }

    pub fn ok(device: DeviceView, weather: Option<WeatherReading>) -> Self {
        Self { status: StatusCode::Ok, result: Some(EnrichmentResult { device, weather }) }
    }

    pub fn provider_unavailable(device: DeviceView) -> Self {
        Self {
            status: StatusCode::ProviderUnavailable,
            result: Some(EnrichmentResult { device, weather: None }),
        }
    }
}

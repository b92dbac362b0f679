use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::directory::DeviceDirectory;
use crate::error::WeatherDecode;
use crate::model::{DeviceRecord, DeviceView, RepairCheck};
use crate::provider::{ProviderEndpoint, WeatherClient, redacted};

/// Project every directory record to a view, in directory order.
///
/// Needs no provider, so listings work without an API key.
pub fn device_views(directory: &dyn DeviceDirectory) -> Vec<DeviceView> {
    let devices: Vec<DeviceView> = directory.list_all().iter().map(DeviceView::from).collect();
    debug!(count = devices.len(), "Listed devices");
    devices
}

/// Combines the device directory with the weather provider.
///
/// Holds no per-call state; one instance can serve concurrent checks.
pub struct RepairCheckService {
    directory: Arc<dyn DeviceDirectory>,
    weather: Arc<dyn WeatherClient>,
    endpoint: ProviderEndpoint,
}

impl RepairCheckService {
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        weather: Arc<dyn WeatherClient>,
        endpoint: ProviderEndpoint,
    ) -> Self {
        Self { directory, weather, endpoint }
    }

    /// Every known device, in directory order.
    pub fn list_devices(&self) -> Vec<DeviceView> {
        device_views(self.directory.as_ref())
    }

    /// Look the device up and attach the current weather at its position.
    ///
    /// Never fails: an unknown id yields `DEVICE_NOT_FOUND` without contacting the
    /// provider, and provider problems degrade to a result without weather.
    #[instrument(skip(self))]
    pub async fn check_repair_feasibility(&self, id: &str) -> RepairCheck {
        let Some(record) = self.directory.find_by_id(id) else {
            debug!(device_id = %id, "Device not found in directory");
            return RepairCheck::not_found();
        };

        debug!(device_id = %record.id, "Device found, fetching weather");
        self.fetch_weather(&record).await
    }

    async fn fetch_weather(&self, record: &DeviceRecord) -> RepairCheck {
        let device = DeviceView::from(record);
        let uri = self.endpoint.query_uri(record.latitude, record.longitude);

        let body = match self.weather.fetch(&uri).await {
            Ok(body) => body,
            Err(e) => {
                warn!(device_id = %record.id, uri = %redacted(&uri), error = %e, "Weather provider unavailable");
                return RepairCheck::provider_unavailable(device);
            }
        };

        debug!(device_id = %record.id, uri = %redacted(&uri), body = %body, "Weather provider responded");

        match WeatherDecode::from_body(&body) {
            WeatherDecode::Reading(reading) => RepairCheck::ok(device, Some(reading)),
            WeatherDecode::Malformed(reason) => {
                debug!(device_id = %record.id, uri = %redacted(&uri), %reason, "Weather payload could not be decoded");
                RepairCheck::ok(device, None)
            }
        }
    }
}

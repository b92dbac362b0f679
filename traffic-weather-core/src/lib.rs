//! Core library for traffic device weather checks.
//!
//! This crate defines:
//! - The device directory abstraction and an in-memory implementation
//! - The weather provider client and query construction
//! - The repair check orchestration and its HTTP surface
//! - Configuration handling
//!
//! It is used by `traffic-weather-cli`, but can also be embedded in other services.

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;

pub use config::{Config, LogFormat};
pub use directory::{DeviceDirectory, InMemoryDeviceDirectory};
pub use error::{TransportError, WeatherDecode};
pub use model::{DeviceRecord, DeviceView, EnrichmentResult, RepairCheck, StatusCode, WeatherReading};
pub use provider::{HttpWeatherClient, ProviderEndpoint, WeatherClient};
pub use service::{RepairCheckService, device_views};

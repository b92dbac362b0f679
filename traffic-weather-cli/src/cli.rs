use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::net::TcpListener;
use tracing::info;

use traffic_weather_core::{
    Config, DeviceView, HttpWeatherClient, InMemoryDeviceDirectory, ProviderEndpoint,
    RepairCheck, RepairCheckService, StatusCode, api, config::ENV_DEVICES, device_views,
};

use crate::logging;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "traffic-weather", version, about = "Weather checks for traffic monitoring devices")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true, env = "TRAFFIC_WEATHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON file with the device records; overrides the configured one.
    #[arg(long, global = true, env = ENV_DEVICES)]
    pub devices: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the weather provider endpoint and API key.
    Configure,

    /// List every known device.
    Devices,

    /// Check whether a technician can be dispatched to a device, given its weather.
    Check {
        /// Device identifier.
        id: String,
    },

    /// Serve the HTTP API.
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8080.
        #[arg(long)]
        bind: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let Cli { config: config_path, devices, command } = self;

        match command {
            Command::Configure => {
                // Configuring may create the file, so a missing explicit path is fine here.
                let config = match &config_path {
                    Some(path) => Config::load_from(path)?,
                    None => Config::load()?,
                };
                configure(config, config_path.as_deref())?;
            }
            Command::Devices => {
                let config = prepare(config_path.as_deref(), devices)?;
                let directory = load_directory(&config)?;
                print!("{}", render_devices(&device_views(&directory)));
            }
            Command::Check { id } => {
                let config = prepare(config_path.as_deref(), devices)?;
                let service = build_service(&config)?;
                let check = service.check_repair_feasibility(&id).await;
                print!("{}", render_check(&id, &check));
            }
            Command::Serve { bind } => {
                let config = prepare(config_path.as_deref(), devices)?;
                let service = Arc::new(build_service(&config)?);
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                let listener = TcpListener::bind(&bind)
                    .await
                    .with_context(|| format!("Failed to bind {bind}"))?;

                tokio::select! {
                    res = api::serve(listener, service) => res?,
                    _ = tokio::signal::ctrl_c() => info!("Shutting down"),
                }
            }
        }

        Ok(())
    }
}

/// Load, resolve and start logging for the commands that talk to devices.
fn prepare(config_path: Option<&Path>, devices: Option<PathBuf>) -> Result<Config> {
    let config = resolve_config(load_config(config_path)?, devices)?;
    logging::init(&config.logging)?;
    Ok(config)
}

/// An explicit `--config` path must exist; the platform default may be absent.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_existing(path),
        None => Config::load(),
    }
}

/// Apply environment overrides, then the `--devices` flag.
fn resolve_config(mut config: Config, devices: Option<PathBuf>) -> Result<Config> {
    config.apply_env_overrides()?;
    if let Some(devices) = devices {
        config.directory.devices_file = Some(devices);
    }
    Ok(config)
}

fn configure(mut config: Config, path: Option<&Path>) -> Result<()> {
    let base_url = Text::new("Weather provider base URL:")
        .with_default(&config.provider.base_url)
        .prompt()?;
    let weather_path = Text::new("Current weather path:")
        .with_default(&config.provider.path)
        .prompt()?;
    let api_key = Password::new("API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    // Validate before saving.
    ProviderEndpoint::new(&base_url, &weather_path, api_key.as_str())?;

    config.provider.base_url = base_url;
    config.provider.path = weather_path;
    config.set_api_key(api_key);

    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    println!("Configuration saved.");
    Ok(())
}

fn load_directory(config: &Config) -> Result<InMemoryDeviceDirectory> {
    InMemoryDeviceDirectory::from_json_file(config.devices_file()?)
}

fn build_service(config: &Config) -> Result<RepairCheckService> {
    let directory = load_directory(config)?;
    let endpoint = ProviderEndpoint::from_config(config)?;
    let client = HttpWeatherClient::new(config.timeout())?;
    Ok(RepairCheckService::new(Arc::new(directory), Arc::new(client), endpoint))
}

fn render_devices(devices: &[DeviceView]) -> String {
    if devices.is_empty() {
        return "No devices.\n".to_string();
    }

    let mut out = String::new();
    for d in devices {
        let _ = writeln!(
            out,
            "{}  lat {}  lon {}  height {}  enabled {}  connected {}  last heartbeat {}",
            d.id, d.latitude, d.longitude, d.height, d.enabled, d.connected, d.last_heartbeat
        );
    }
    out
}

fn render_check(id: &str, check: &RepairCheck) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Status: {}", check.status);

    let Some(result) = &check.result else {
        let _ = writeln!(out, "No device with id '{id}'.");
        return out;
    };

    let d = &result.device;
    let _ = writeln!(out, "Device: {} (lat {}, lon {}, height {})", d.id, d.latitude, d.longitude, d.height);
    let _ = writeln!(
        out,
        "  enabled: {}, connected: {}, last heartbeat: {}",
        d.enabled, d.connected, d.last_heartbeat
    );

    match (&result.weather, check.status) {
        (Some(w), _) => {
            let temp = w
                .temperature_c()
                .map(|t| format!("{t:.1} °C"))
                .unwrap_or_else(|| "temperature unknown".to_string());
            let condition = w.condition().unwrap_or("Unknown");
            let _ = writeln!(out, "Weather: {temp}, {condition}");
        }
        (None, StatusCode::ProviderUnavailable) => {
            let _ = writeln!(out, "Weather: unavailable (provider could not be reached)");
        }
        (None, _) => {
            let _ = writeln!(out, "Weather: unavailable (provider response could not be read)");
        }
    }
    out
}

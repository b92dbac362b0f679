use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_WEATHER_PATH: &str = "/data/2.5/weather";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

pub const ENV_BASE_URL: &str = "TRAFFIC_WEATHER_BASE_URL";
pub const ENV_PATH: &str = "TRAFFIC_WEATHER_PATH";
pub const ENV_API_KEY: &str = "TRAFFIC_WEATHER_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "TRAFFIC_WEATHER_TIMEOUT_SECS";
pub const ENV_BIND: &str = "TRAFFIC_WEATHER_BIND";
pub const ENV_DEVICES: &str = "TRAFFIC_WEATHER_DEVICES";

/// Weather provider endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub path: String,
    pub api_key: Option<String>,
    /// Upper bound for one provider request. Unset means the HTTP client default.
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            path: DEFAULT_WEATHER_PATH.to_string(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: DEFAULT_BIND.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DirectoryConfig {
    /// JSON array of device records.
    pub devices_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Text }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [provider]
/// api_key = "..."
/// timeout_secs = 10
///
/// [directory]
/// devices_file = "/var/lib/traffic/devices.json"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from the platform config directory, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Load an explicitly named config file; unlike [`Config::load_from`], it must exist.
    pub fn load_existing(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!(
                "Config file not found: {}\n\
                 Hint: run `traffic-weather --config {} configure` to create it.",
                path.display(),
                path.display()
            ));
        }
        Self::load_from(path)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    /// Save config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "traffic-weather", "traffic-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `TRAFFIC_WEATHER_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_BASE_URL) {
            self.provider.base_url = v;
        }
        if let Some(v) = lookup(ENV_PATH) {
            self.provider.path = v;
        }
        if let Some(v) = lookup(ENV_API_KEY) {
            self.provider.api_key = Some(v);
        }
        if let Some(v) = lookup(ENV_TIMEOUT_SECS) {
            let secs = v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{v}'"))?;
            self.provider.timeout_secs = Some(secs);
        }
        if let Some(v) = lookup(ENV_BIND) {
            self.server.bind = v;
        }
        if let Some(v) = lookup(ENV_DEVICES) {
            self.directory.devices_file = Some(PathBuf::from(v));
        }
        Ok(())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.provider.api_key = Some(api_key);
    }

    /// Returns the provider API key, or an error with a hint when none is configured.
    pub fn api_key(&self) -> Result<&str> {
        self.provider
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No weather provider API key configured.\n\
                     Hint: run `traffic-weather configure` or set {ENV_API_KEY}."
                )
            })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.provider.timeout_secs.map(Duration::from_secs)
    }

    pub fn devices_file(&self) -> Result<&Path> {
        self.directory.devices_file.as_deref().ok_or_else(|| {
            anyhow!(
                "No devices file configured.\n\
                 Hint: pass --devices <path>, set {ENV_DEVICES}, or add `devices_file` under [directory]."
            )
        })
    }
}

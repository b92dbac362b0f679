use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;

use crate::{config::Config, error::TransportError};

pub mod http;

pub use http::HttpWeatherClient;

/// Issues one GET against the weather provider and returns the raw body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherClient: Send + Sync {
    async fn fetch(&self, uri: &Url) -> Result<String, TransportError>;
}

/// Provider base URL joined with the weather path, plus the API key for queries.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    url: Url,
    api_key: String,
}

impl ProviderEndpoint {
    pub fn new(base_url: &str, path: &str, api_key: impl Into<String>) -> Result<Self> {
        let mut url = Url::parse(base_url)
            .map_err(|e| anyhow!("Invalid weather provider base URL '{base_url}': {e}"))?;

        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(anyhow!(
                "Weather provider base URL must be an http(s) URL, got '{base_url}'"
            ));
        }

        let path = path.trim_start_matches('/');
        if !path.is_empty() {
            let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
            url.set_path(&joined);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self { url, api_key: api_key.into() })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::new(&config.provider.base_url, &config.provider.path, api_key)
    }

    /// `<base><path>?lat=..&lon=..&appid=..&units=metric`
    pub fn query_uri(&self, latitude: f64, longitude: f64) -> Url {
        let mut uri = self.url.clone();
        uri.query_pairs_mut()
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string())
            .append_pair("appid", &self.api_key)
            .append_pair("units", "metric");
        uri
    }
}

/// Copy of `uri` with the API key masked, for logs.
pub fn redacted(uri: &Url) -> String {
    let mut masked = uri.clone();
    let pairs: Vec<(String, String)> = uri
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_contains_all_four_parameters() {
        let endpoint =
            ProviderEndpoint::new("https://api.openweathermap.org", "/data/2.5/weather", "KEY")
                .unwrap();

        let uri = endpoint.query_uri(56.78, 12.34);

        assert_eq!(uri.path(), "/data/2.5/weather");
        assert_eq!(uri.query(), Some("lat=56.78&lon=12.34&appid=KEY&units=metric"));
        assert_eq!(
            uri.as_str(),
            "https://api.openweathermap.org/data/2.5/weather?lat=56.78&lon=12.34&appid=KEY&units=metric"
        );
    }

    #[test]
    fn coordinates_use_plain_decimal_form() {
        let endpoint = ProviderEndpoint::new("http://localhost:9000", "weather", "K").unwrap();
        let uri = endpoint.query_uri(-33.5, 151.0);

        let pairs: Vec<_> = uri.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("lat".to_string(), "-33.5".to_string()));
        assert_eq!(pairs[1], ("lon".to_string(), "151".to_string()));
    }

    #[test]
    fn api_key_is_query_escaped() {
        let endpoint = ProviderEndpoint::new("http://localhost", "/w", "a b&c=d").unwrap();
        let uri = endpoint.query_uri(1.0, 2.0);

        assert!(uri.query().unwrap().contains("appid=a+b%26c%3Dd"));
        let appid = uri.query_pairs().find(|(k, _)| k == "appid").map(|(_, v)| v.into_owned());
        assert_eq!(appid.as_deref(), Some("a b&c=d"));
    }

    #[test]
    fn path_joins_onto_base_path() {
        let endpoint =
            ProviderEndpoint::new("http://proxy.local/weather-api/", "/data/2.5/weather", "K")
                .unwrap();
        assert_eq!(endpoint.query_uri(0.0, 0.0).path(), "/weather-api/data/2.5/weather");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(ProviderEndpoint::new("not a url", "/w", "K").is_err());
        assert!(ProviderEndpoint::new("mailto:ops@example.com", "/w", "K").is_err());
        assert!(ProviderEndpoint::new("ftp://example.com", "/w", "K").is_err());
    }

    #[test]
    fn from_config_requires_api_key() {
        let cfg = Config::default();
        let err = ProviderEndpoint::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No weather provider API key configured"));
    }

    #[test]
    fn redacted_masks_only_the_key() {
        let endpoint = ProviderEndpoint::new("http://localhost", "/w", "SECRET").unwrap();
        let shown = redacted(&endpoint.query_uri(1.5, 2.5));

        assert!(!shown.contains("SECRET"));
        assert!(shown.contains("appid=***") || shown.contains("appid=%2A%2A%2A"));
        assert!(shown.contains("lat=1.5"));
    }
}

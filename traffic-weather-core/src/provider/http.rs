use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::error::TransportError;

use super::WeatherClient;

#[derive(Debug, Clone)]
pub struct HttpWeatherClient {
    http: Client,
}

impl HttpWeatherClient {
    /// Build a client; `timeout` bounds each whole request when set.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build weather HTTP client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl WeatherClient for HttpWeatherClient {
    async fn fetch(&self, uri: &Url) -> Result<String, TransportError> {
        let res = self
            .http
            .get(uri.clone())
            .send()
            .await
            .map_err(|e| TransportError::Request(e.without_url()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| TransportError::Body(e.without_url()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

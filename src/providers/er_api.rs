use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::core::rate::RateSource;
use crate::providers::util::build_client;

/// open.er-api.com, second in the rate chain.
pub struct ErApiSource {
    base_url: String,
    client: reqwest::Client,
}

impl ErApiSource {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(ErApiSource {
            base_url: base_url.to_string(),
            client: build_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErApiResponse {
    #[serde(default)]
    result: String,
    rates: ErApiRates,
}

#[derive(Debug, Deserialize)]
struct ErApiRates {
    #[serde(rename = "KRW")]
    krw: Option<f64>,
}

#[async_trait]
impl RateSource for ErApiSource {
    fn name(&self) -> &str {
        "er-api"
    }

    async fn fetch_rate(&self) -> Result<f64> {
        let url = format!("{}/v6/latest/USD", self.base_url);
        debug!("Requesting exchange rate from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for USD/KRW", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} from er-api", response.status()));
        }

        let data = response
            .json::<ErApiResponse>()
            .await
            .map_err(|e| anyhow!("Failed to parse er-api response: {}", e))?;

        if data.result != "success" {
            return Err(anyhow!("er-api reported result: {:?}", data.result));
        }
        data.rates
            .krw
            .ok_or_else(|| anyhow!("No KRW rate in er-api response"))
    }
}

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::core::rate::RateSource;
use crate::providers::util::build_client;

/// frankfurter.app, last resort of the rate chain.
pub struct FrankfurterSource {
    base_url: String,
    client: reqwest::Client,
}

impl FrankfurterSource {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(FrankfurterSource {
            base_url: base_url.to_string(),
            client: build_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    rates: FrankfurterRates,
}

#[derive(Debug, Deserialize)]
struct FrankfurterRates {
    #[serde(rename = "KRW")]
    krw: Option<f64>,
}

#[async_trait]
impl RateSource for FrankfurterSource {
    fn name(&self) -> &str {
        "frankfurter"
    }

    async fn fetch_rate(&self) -> Result<f64> {
        let url = format!("{}/latest?from=USD&to=KRW", self.base_url);
        debug!("Requesting exchange rate from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for USD/KRW", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} from frankfurter", response.status()));
        }

        let data = response
            .json::<FrankfurterResponse>()
            .await
            .map_err(|e| anyhow!("Failed to parse frankfurter response: {}", e))?;
        data.rates
            .krw
            .ok_or_else(|| anyhow!("No KRW rate in frankfurter response"))
    }
}

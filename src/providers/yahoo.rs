use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::core::error::QuoteError;
use crate::core::market::{IndexSnapshot, MarketDataProvider, MarketIndex};
use crate::core::quote::{KRX_SUFFIXES, Quote, QuoteProvider, SymbolLookup};
use crate::core::rate::RateSource;
use crate::providers::util::{build_client, with_retry};

/// Chart-endpoint client for the upstream quote aggregator. One instance
/// backs all three lookups the dashboard needs: individual quotes, the
/// USD→KRW rate and the index snapshots.
pub struct YahooProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(YahooProvider {
            base_url: base_url.to_string(),
            client: build_client()?,
        })
    }

    /// Single quote attempt for one concrete listing symbol, classified into
    /// the lookup error taxonomy: HTTP 404 and empty results are `NotFound`,
    /// transport, decode and server errors are `Upstream`.
    async fn try_quote(&self, listing: &str) -> Result<ChartMeta, QuoteError> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, listing
        );
        debug!("Requesting quote data from {}", url);

        let response = with_retry(|| self.client.get(&url).send(), 2, 500)
            .await
            .map_err(QuoteError::upstream)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(QuoteError::NotFound(listing.to_string()));
        }
        if !response.status().is_success() {
            return Err(QuoteError::upstream(format!(
                "HTTP {} for symbol {}",
                response.status(),
                listing
            )));
        }

        let data = response
            .json::<YahooChartResponse>()
            .await
            .map_err(QuoteError::upstream)?;
        data.chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|item| item.meta)
            .ok_or_else(|| QuoteError::NotFound(listing.to_string()))
    }

    /// Meta fetch for the rate and index paths. No retry here: the caller
    /// sits behind a fallback chain that handles transient failures.
    async fn chart_meta(&self, symbol: &str) -> Result<ChartMeta> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        );
        debug!("Requesting chart data from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let data = response
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| anyhow!("Failed to parse chart response for {}: {}", symbol, e))?;
        data.chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|item| item.meta)
            .ok_or_else(|| anyhow!("No chart data found for symbol: {}", symbol))
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    result: Option<Vec<ChartItem>>,
}

#[derive(Debug, Deserialize)]
struct ChartItem {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
    currency: Option<String>,
    #[serde(alias = "exchangeName")]
    exchange_name: Option<String>,
    #[serde(alias = "shortName")]
    short_name: Option<String>,
    #[serde(alias = "longName")]
    long_name: Option<String>,
    #[serde(alias = "chartPreviousClose")]
    previous_close: Option<f64>,
    #[serde(alias = "regularMarketVolume")]
    volume: Option<u64>,
    #[serde(alias = "marketCap")]
    market_cap: Option<f64>,
    #[serde(alias = "regularMarketTime")]
    market_time: Option<i64>,
}

impl ChartMeta {
    fn display_name(&self) -> Option<String> {
        self.short_name.clone().or_else(|| self.long_name.clone())
    }

    fn change(&self) -> (Option<f64>, Option<f64>) {
        match self.previous_close {
            Some(prev) if prev > 0.0 => {
                let change = self.regular_market_price - prev;
                (Some(change), Some(change / prev * 100.0))
            }
            _ => (None, None),
        }
    }

    /// Korean listings are normalized to the bare six-digit code with fixed
    /// KRW/KRX fields, whichever suffix variant actually resolved.
    fn into_korean_quote(self, code: &str) -> Quote {
        let (change, change_percent) = self.change();
        Quote {
            symbol: code.to_string(),
            display_name: self.display_name().unwrap_or_else(|| code.to_string()),
            current_price: self.regular_market_price,
            currency: "KRW".to_string(),
            exchange: "KRX".to_string(),
            market_cap: self.market_cap,
            volume: self.volume,
            change,
            change_percent,
            is_real_time: true,
            market_time: self.market_time.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        }
    }

    fn into_global_quote(self, symbol: &str) -> Quote {
        let (change, change_percent) = self.change();
        Quote {
            symbol: symbol.to_string(),
            display_name: self.display_name().unwrap_or_else(|| symbol.to_string()),
            current_price: self.regular_market_price,
            currency: self.currency.clone().unwrap_or_else(|| "USD".to_string()),
            exchange: self
                .exchange_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            market_cap: self.market_cap,
            volume: self.volume,
            change,
            change_percent,
            is_real_time: true,
            market_time: self.market_time.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        }
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    async fn fetch_quote(&self, lookup: &SymbolLookup) -> Result<Quote, QuoteError> {
        match lookup {
            SymbolLookup::Korean(code) => {
                // Strict suffix order; the first listing that resolves wins
                // and the remaining variants are never attempted.
                let mut all_upstream = true;
                let mut last_error = QuoteError::NotFound(code.clone());
                for suffix in KRX_SUFFIXES {
                    let listing = format!("{code}{suffix}");
                    match self.try_quote(&listing).await {
                        Ok(meta) => {
                            debug!(%listing, "Korean listing resolved");
                            return Ok(meta.into_korean_quote(code));
                        }
                        Err(e) => {
                            debug!(%listing, error = %e, "Korean listing attempt failed");
                            if !matches!(e, QuoteError::Upstream(_)) {
                                all_upstream = false;
                            }
                            last_error = e;
                        }
                    }
                }
                if all_upstream {
                    Err(last_error)
                } else {
                    Err(QuoteError::NotFound(code.clone()))
                }
            }
            SymbolLookup::Global(symbol) => {
                let meta = self.try_quote(symbol).await?;
                Ok(meta.into_global_quote(symbol))
            }
        }
    }
}

#[async_trait]
impl RateSource for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_rate(&self) -> Result<f64> {
        let meta = self.chart_meta("KRW=X").await?;
        Ok(meta.regular_market_price)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_index(&self, index: MarketIndex) -> Result<IndexSnapshot> {
        let meta = self.chart_meta(index.symbol()).await?;
        let (change, change_percent) = meta.change();
        Ok(IndexSnapshot {
            value: meta.regular_market_price,
            change: change.unwrap_or(0.0),
            change_percent: change_percent.unwrap_or(0.0),
            is_real_time: true,
            market_time: meta.market_time.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
            previous_close: meta.previous_close,
        })
    }
}

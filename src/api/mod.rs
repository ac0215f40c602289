//! HTTP surface of the dashboard backend.

pub mod charts;
pub mod envelope;
pub mod market;
pub mod stocks;

use crate::core::cache::ExchangeRateCache;
use crate::core::config::AppConfig;
use crate::core::market::{MarketDataProvider, MarketDataService};
use crate::core::quote::QuoteProvider;
use crate::core::rate::RateSource;
use crate::providers::{ErApiSource, FrankfurterSource, YahooProvider};
use anyhow::Result;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Handles shared by the request handlers. Cloning is cheap; everything
/// inside is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub quotes: Arc<dyn QuoteProvider>,
    pub rates: Arc<ExchangeRateCache>,
    pub market: Arc<MarketDataService>,
}

impl AppState {
    /// Wires the provider stack from the configured base URLs. Quote
    /// lookups and index snapshots go to the aggregator; the rate chain
    /// tries the aggregator first, then er-api, then frankfurter.
    pub fn from_config(config: &AppConfig) -> Result<AppState> {
        let yahoo = Arc::new(YahooProvider::new(&config.providers.yahoo_base_url)?);

        let sources: Vec<Arc<dyn RateSource>> = vec![
            Arc::clone(&yahoo) as Arc<dyn RateSource>,
            Arc::new(ErApiSource::new(&config.providers.er_api_base_url)?),
            Arc::new(FrankfurterSource::new(&config.providers.frankfurter_base_url)?),
        ];
        let rates = Arc::new(ExchangeRateCache::new(sources));
        let market = Arc::new(MarketDataService::new(
            Arc::clone(&yahoo) as Arc<dyn MarketDataProvider>,
            Arc::clone(&rates),
        ));

        Ok(AppState {
            quotes: yahoo,
            rates,
            market,
        })
    }
}

/// Builds the dashboard router. Permissive CORS on every response; OPTIONS
/// requests are answered by the CORS layer before they reach a route, and
/// unmatched methods on a known path get a 405 from the router itself.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/market/data", get(market::market_data))
        .route("/stock/korean", get(stocks::korean_stock))
        .route("/stock/search", get(stocks::search_query))
        .route("/stock/search/{symbol}", get(stocks::search_path))
        .route("/analytics/chart", get(charts::chart))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

//! Core business logic abstractions

pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod log;
pub mod market;
pub mod quote;
pub mod rate;
pub mod valuation;

// Re-export main types for cleaner imports
pub use cache::ExchangeRateCache;
pub use error::QuoteError;
pub use market::{MarketDataProvider, MarketDataService, MarketOverview};
pub use quote::{Quote, QuoteProvider, SymbolLookup};
pub use rate::{Rate, RateSource};

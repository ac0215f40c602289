//! Derived portfolio metrics over the exchange-rate cache.

use crate::core::cache::ExchangeRateCache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub name: String,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuedHolding {
    pub name: String,
    pub amount: f64,
    pub currency: String,
    /// Holding value in KRW.
    pub converted: f64,
    /// Share of the portfolio total, in percent.
    pub weight_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub holdings: Vec<ValuedHolding>,
    pub total: f64,
}

/// Revalues holdings in KRW. Calls are generation-stamped: when the inputs
/// change while a revaluation is still waiting on the rate, the superseded
/// result is discarded instead of overwriting the newer one.
pub struct PortfolioValuator {
    rates: Arc<ExchangeRateCache>,
    generation: AtomicU64,
}

impl PortfolioValuator {
    pub fn new(rates: Arc<ExchangeRateCache>) -> Self {
        PortfolioValuator {
            rates,
            generation: AtomicU64::new(0),
        }
    }

    /// `None` means a newer call claimed the portfolio while this one was
    /// resolving; the caller drops the result and keeps the newer one.
    pub async fn revalue(&self, holdings: &[Holding]) -> Option<PortfolioValuation> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut valued = Vec::with_capacity(holdings.len());
        let mut total = 0.0;
        for holding in holdings {
            let converted = round2(self.rates.convert(holding.amount, &holding.currency).await);
            total += converted;
            valued.push(ValuedHolding {
                name: holding.name.clone(),
                amount: holding.amount,
                currency: holding.currency.clone(),
                converted,
                weight_pct: 0.0,
            });
        }
        for holding in &mut valued {
            holding.weight_pct = if total > 0.0 {
                round2(holding.converted / total * 100.0)
            } else {
                0.0
            };
        }

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding superseded revaluation");
            return None;
        }
        Some(PortfolioValuation {
            holdings: valued,
            total: round2(total),
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

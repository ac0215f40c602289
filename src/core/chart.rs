//! Synthetic price-history series for the analytics view.
//!
//! The dashboard's chart is illustrative, not a market source: the series is
//! a seeded random walk, stable for a given symbol within a calendar day so
//! repeated page loads draw the same curve.

use crate::core::quote::is_korean_code;
use anyhow::bail;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::str::FromStr;

/// Supported chart windows, one point per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartRange {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl ChartRange {
    pub fn days(self) -> usize {
        match self {
            ChartRange::OneMonth => 30,
            ChartRange::ThreeMonths => 90,
            ChartRange::SixMonths => 180,
            ChartRange::OneYear => 365,
        }
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChartRange::OneMonth => "1M",
            ChartRange::ThreeMonths => "3M",
            ChartRange::SixMonths => "6M",
            ChartRange::OneYear => "1Y",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ChartRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1M" => Ok(ChartRange::OneMonth),
            "3M" => Ok(ChartRange::ThreeMonths),
            "6M" => Ok(ChartRange::SixMonths),
            "1Y" => Ok(ChartRange::OneYear),
            _ => bail!("Invalid chart range: {}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: String,
    pub value: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub symbol: String,
    pub range: String,
    pub data: Vec<ChartPoint>,
    pub last_updated: DateTime<Utc>,
    pub data_points: usize,
}

/// Builds the series for a symbol, ending today.
pub fn synthesize(symbol: &str, range: ChartRange) -> ChartSeries {
    synthesize_ending(symbol, range, Utc::now().date_naive())
}

/// Random walk over consecutive calendar days ending at `last_day`. The RNG
/// is seeded from the symbol and the end date, so the same request repeated
/// within a day yields the identical series.
fn synthesize_ending(symbol: &str, range: ChartRange, last_day: NaiveDate) -> ChartSeries {
    let mut rng = StdRng::seed_from_u64(series_seed(symbol, last_day));

    // Korean listings are quoted in KRW, so their plausible band sits a few
    // orders of magnitude above a USD-quoted one.
    let mut value: f64 = if is_korean_code(symbol) {
        rng.random_range(10_000.0..400_000.0)
    } else {
        rng.random_range(20.0..600.0)
    };

    let days = range.days();
    let start = last_day - Duration::days(days as i64 - 1);
    let mut data = Vec::with_capacity(days);
    for offset in 0..days {
        value *= 1.0 + rng.random_range(-0.02..0.02);
        let date = start + Duration::days(offset as i64);
        data.push(ChartPoint {
            date: date.format("%Y-%m-%d").to_string(),
            value: (value * 100.0).round() / 100.0,
            volume: rng.random_range(80_000..4_000_000),
        });
    }

    ChartSeries {
        symbol: symbol.to_string(),
        range: range.to_string(),
        data_points: data.len(),
        data,
        last_updated: Utc::now(),
    }
}

fn series_seed(symbol: &str, last_day: NaiveDate) -> u64 {
    let mut hasher = DefaultHasher::new();
    symbol.hash(&mut hasher);
    last_day.hash(&mut hasher);
    hasher.finish()
}

//! Exchange-rate abstractions.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The current USD→KRW conversion factor together with the wall-clock time
/// of the successful refresh that produced it. Replaced wholesale, never
/// partially updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    pub value: f64,
    pub last_updated: DateTime<Utc>,
}

impl Rate {
    pub fn now(value: f64) -> Self {
        Rate {
            value,
            last_updated: Utc::now(),
        }
    }
}

/// One entry of the refresh chain. Sources are attempted in declared
/// priority order; the first usable value wins and the rest are skipped.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    /// Fetch the current USD→KRW rate from this source.
    async fn fetch_rate(&self) -> Result<f64>;
}

/// Zero, negative, NaN and infinite responses are provider failures, never
/// rates. Anything that passes this check is safe to serve and to cache.
pub fn is_usable_rate(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_rate_bounds() {
        assert!(is_usable_rate(1380.0));
        assert!(is_usable_rate(0.0001));
        assert!(!is_usable_rate(0.0));
        assert!(!is_usable_rate(-1350.0));
        assert!(!is_usable_rate(f64::NAN));
        assert!(!is_usable_rate(f64::INFINITY));
        assert!(!is_usable_rate(f64::NEG_INFINITY));
    }
}

//! Time-boxed exchange-rate cache with a prioritized provider chain.
//!
//! One instance serves the USD→KRW rate to every consumer of the dashboard.
//! Reads are served from the cached entry while it is fresh; a stale entry
//! triggers one traversal of the source chain in strict priority order, the
//! first usable value winning. When the whole chain fails the cache keeps
//! serving the last known good value, or the fixed fallback constant if it
//! has never been populated. Failures are never cached: only a successful
//! refresh starts a new TTL window.

use crate::core::rate::{Rate, RateSource, is_usable_rate};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How long a successfully fetched rate is served without refetching.
pub const RATE_TTL: Duration = Duration::from_secs(5 * 60);

/// Served when no source has ever produced a usable rate. Roughly the
/// USD/KRW level the dashboard was built around; better than rendering 0.
pub const FALLBACK_USD_KRW: f64 = 1380.0;

/// Upper bound on a single source attempt so one hung provider cannot
/// stall the whole chain. Slightly above the sources' own request timeout.
const SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

struct StoredRate {
    rate: Rate,
    fetched_at: Instant,
    force_stale: bool,
}

pub struct ExchangeRateCache {
    sources: Vec<Arc<dyn RateSource>>,
    ttl: Duration,
    /// Last known good entry. Guarded by a plain mutex that is never held
    /// across an await; readers always receive a copy.
    latest: Mutex<Option<StoredRate>>,
    /// Single-flight gate: at most one chain traversal per instance at a
    /// time. Callers that queue behind an in-flight refresh re-check the
    /// entry once the gate opens and pick up the freshly stored value.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl ExchangeRateCache {
    pub fn new(sources: Vec<Arc<dyn RateSource>>) -> Self {
        Self::with_ttl(sources, RATE_TTL)
    }

    pub fn with_ttl(sources: Vec<Arc<dyn RateSource>>, ttl: Duration) -> Self {
        ExchangeRateCache {
            sources,
            ttl,
            latest: Mutex::new(None),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Current USD→KRW rate. Never fails: the result is the cached value,
    /// a freshly fetched one, the last known good one, or the fallback
    /// constant, in that order of preference.
    pub async fn get_rate(&self) -> f64 {
        if let Some(value) = self.fresh_value() {
            debug!("Rate cache HIT: {value}");
            return value;
        }

        let _inflight = self.refresh_gate.lock().await;
        // A refresh that finished while we waited for the gate serves us too.
        if let Some(value) = self.fresh_value() {
            debug!("Rate cache HIT after in-flight refresh: {value}");
            return value;
        }

        debug!("Rate cache MISS, trying {} sources", self.sources.len());
        match self.run_chain().await {
            Some(value) => {
                self.store(value);
                value
            }
            None => self.last_known_or_fallback(),
        }
    }

    /// Forces the next fetch regardless of TTL. The old value stays
    /// servable if the forced refresh fails.
    pub async fn refresh(&self) -> f64 {
        if let Some(stored) = self.latest.lock().unwrap().as_mut() {
            stored.force_stale = true;
        }
        self.get_rate().await
    }

    /// Multiplies USD amounts by the current rate; amounts already in the
    /// target currency pass through unchanged.
    pub async fn convert(&self, amount: f64, from: &str) -> f64 {
        if from.eq_ignore_ascii_case("USD") {
            amount * self.get_rate().await
        } else {
            amount
        }
    }

    /// Non-blocking read of the last known good rate. `None` only if no
    /// fetch has ever succeeded. Never triggers a refresh.
    pub fn snapshot(&self) -> Option<Rate> {
        self.latest
            .lock()
            .unwrap()
            .as_ref()
            .map(|stored| stored.rate.clone())
    }

    fn fresh_value(&self) -> Option<f64> {
        let latest = self.latest.lock().unwrap();
        latest
            .as_ref()
            .filter(|stored| !stored.force_stale && stored.fetched_at.elapsed() < self.ttl)
            .map(|stored| stored.rate.value)
    }

    /// Attempts sources strictly in priority order, short-circuiting on the
    /// first usable value. Unusable values (zero, negative, non-finite) and
    /// timeouts count as source failures.
    async fn run_chain(&self) -> Option<f64> {
        for source in &self.sources {
            match tokio::time::timeout(SOURCE_TIMEOUT, source.fetch_rate()).await {
                Ok(Ok(value)) if is_usable_rate(value) => {
                    debug!(source = source.name(), value, "Rate source succeeded");
                    return Some(value);
                }
                Ok(Ok(value)) => {
                    warn!(source = source.name(), value, "Rate source returned unusable value");
                }
                Ok(Err(e)) => {
                    warn!(source = source.name(), error = %e, "Rate source failed");
                }
                Err(_) => {
                    warn!(source = source.name(), "Rate source timed out");
                }
            }
        }
        None
    }

    fn store(&self, value: f64) {
        let mut latest = self.latest.lock().unwrap();
        *latest = Some(StoredRate {
            rate: Rate::now(value),
            fetched_at: Instant::now(),
            force_stale: false,
        });
    }

    fn last_known_or_fallback(&self) -> f64 {
        match self.latest.lock().unwrap().as_ref() {
            Some(stored) => {
                warn!(
                    value = stored.rate.value,
                    "All rate sources failed, serving last known good rate"
                );
                stored.rate.value
            }
            None => {
                warn!("All rate sources failed with an empty cache, serving fallback constant");
                FALLBACK_USD_KRW
            }
        }
    }
}

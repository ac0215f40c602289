//! Error taxonomy for quote lookups.
//!
//! Stock lookups surface failure to the caller (the dashboard must show
//! "symbol not found"), unlike exchange-rate and market-overview reads which
//! always degrade to a usable value. The three variants map directly onto
//! the HTTP layer's 400/404/500 responses.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum QuoteError {
    /// Symbol failed format validation before any upstream call was made.
    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// Upstream returned no result, or every suffix variant was exhausted.
    #[error("symbol not found: {0}")]
    NotFound(String),

    /// Network or decode failure talking to the upstream provider.
    #[error("upstream quote request failed: {0}")]
    Upstream(String),
}

impl QuoteError {
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        QuoteError::Upstream(err.to_string())
    }
}

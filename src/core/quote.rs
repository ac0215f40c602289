//! Quote lookup abstractions and core types.

use crate::core::error::QuoteError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Fixed order of board suffixes tried for a Korean six-digit code: the
/// main board first, then the alternate board. The first variant that
/// resolves wins; intermediate failures are discarded.
pub const KRX_SUFFIXES: [&str; 2] = [".KS", ".KQ"];

/// Normalized market quote produced fresh on every lookup. Field names
/// follow the dashboard's wire format; the core never persists these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub display_name: String,
    pub current_price: f64,
    pub currency: String,
    pub exchange: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    pub is_real_time: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_time: Option<DateTime<Utc>>,
}

/// A validated symbol, classified by market.
///
/// Six ASCII digits designate a Korean listing and go through the suffix
/// fallback; everything else is passed to the provider uppercased and
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolLookup {
    Korean(String),
    Global(String),
}

impl SymbolLookup {
    pub fn parse(raw: &str) -> Result<Self, QuoteError> {
        let symbol = raw.trim();
        if symbol.is_empty() {
            return Err(QuoteError::InvalidSymbol(raw.to_string()));
        }
        if is_korean_code(symbol) {
            Ok(SymbolLookup::Korean(symbol.to_string()))
        } else {
            Ok(SymbolLookup::Global(symbol.to_uppercase()))
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            SymbolLookup::Korean(code) => code,
            SymbolLookup::Global(symbol) => symbol,
        }
    }
}

impl Display for SymbolLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// True for exactly six ASCII digits, the KRX listing code format.
pub fn is_korean_code(symbol: &str) -> bool {
    symbol.len() == 6 && symbol.bytes().all(|b| b.is_ascii_digit())
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, lookup: &SymbolLookup) -> Result<Quote, QuoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_korean_code_detection() {
        assert!(is_korean_code("005930"));
        assert!(is_korean_code("000660"));
        assert!(!is_korean_code("AAPL"));
        assert!(!is_korean_code("12345"));
        assert!(!is_korean_code("1234567"));
        assert!(!is_korean_code("00593A"));
        // Full-width digits are not a valid listing code.
        assert!(!is_korean_code("００５９３０"));
    }

    #[test]
    fn test_parse_classifies_by_market() {
        assert_eq!(
            SymbolLookup::parse("005930").unwrap(),
            SymbolLookup::Korean("005930".to_string())
        );
        assert_eq!(
            SymbolLookup::parse("aapl").unwrap(),
            SymbolLookup::Global("AAPL".to_string())
        );
        assert_eq!(
            SymbolLookup::parse("  msft  ").unwrap(),
            SymbolLookup::Global("MSFT".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_empty_symbol() {
        let result = SymbolLookup::parse("   ");
        assert!(matches!(result, Err(QuoteError::InvalidSymbol(_))));
    }

    #[test]
    fn test_quote_wire_format_is_camel_case() {
        let quote = Quote {
            symbol: "005930".to_string(),
            display_name: "Samsung Electronics".to_string(),
            current_price: 71_200.0,
            currency: "KRW".to_string(),
            exchange: "KRX".to_string(),
            market_cap: None,
            volume: Some(12_345_678),
            change: Some(900.0),
            change_percent: Some(1.28),
            is_real_time: true,
            market_time: None,
        };

        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["displayName"], "Samsung Electronics");
        assert_eq!(json["currentPrice"], 71_200.0);
        assert_eq!(json["isRealTime"], true);
        assert_eq!(json["changePercent"], 1.28);
        // Absent optionals are omitted, not serialized as null.
        assert!(json.get("marketCap").is_none());
        assert!(json.get("marketTime").is_none());
    }
}

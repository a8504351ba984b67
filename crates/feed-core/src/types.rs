//! Core data types for daily price ingestion.
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`PriceRow`] - One daily OHLCV observation keyed by `(symbol, trade_date)`

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trading symbol/ticker.
///
/// Symbols are trimmed and uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a comma separated list such as `"aapl, msft,,TSLA"`, dropping empty entries.
    #[must_use]
    pub fn parse_list(list: &str) -> Vec<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::new)
            .collect()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// One daily OHLCV observation.
///
/// Unique per `(symbol, trade_date)`; writers overwrite the price and volume fields on conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Ticker this row belongs to.
    pub symbol: Symbol,
    /// Trading session date.
    pub trade_date: NaiveDate,
    /// Opening price.
    pub open: Decimal,
    /// Highest price during the session.
    pub high: Decimal,
    /// Lowest price during the session.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Shares traded.
    pub volume: u64,
}

impl PriceRow {
    /// Creates a new price row.
    #[must_use]
    pub const fn new(
        symbol: Symbol,
        trade_date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: u64,
    ) -> Self {
        Self {
            symbol,
            trade_date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::new(" aapl ").as_str(), "AAPL");
        assert_eq!(Symbol::from("msft"), Symbol::new("MSFT"));
    }

    #[test]
    fn test_parse_list() {
        let symbols = Symbol::parse_list("aapl, msft,,TSLA ");
        assert_eq!(
            symbols,
            vec![Symbol::new("AAPL"), Symbol::new("MSFT"), Symbol::new("TSLA")]
        );
        assert!(Symbol::parse_list(" , ").is_empty());
    }
}

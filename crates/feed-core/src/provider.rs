//! Provider traits for fetching daily series.
//!
//! - [`DataProvider`] - Base trait with provider metadata
//! - [`DailySeriesProvider`] - Daily OHLCV series for one symbol per call

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    series::OutputSize,
    types::{PriceRow, Symbol},
};

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the quota key of this provider (e.g., "alphavantage").
    ///
    /// Call counters in the quota store are keyed by this name.
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider for daily OHLCV series.
///
/// Each call to [`fetch_daily`](Self::fetch_daily) counts as one call against the
/// provider's daily budget, whatever its outcome.
#[async_trait]
pub trait DailySeriesProvider: DataProvider {
    /// Fetches the daily series for a single symbol.
    ///
    /// Returns rows sorted ascending by `trade_date`. Implementations must surface
    /// daily-cap exhaustion as [`FeedError::RateLimited`](crate::FeedError::RateLimited)
    /// so callers can stop the whole run instead of skipping a symbol.
    async fn fetch_daily(&self, symbol: &Symbol, output_size: OutputSize)
    -> Result<Vec<PriceRow>>;
}

//! Storage traits for prices and quota counters.
//!
//! This module defines [`PriceStore`], the `(symbol, trade_date)` keyed OHLCV table, and
//! [`QuotaStore`], the durable `(provider, day)` call counter table.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::{
    error::Result,
    types::{PriceRow, Symbol},
};

/// Time-series store of daily price rows.
///
/// Implementations can store data in various backends (SQLite, in-memory, etc.).
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Returns the latest stored trade date for each requested symbol.
    ///
    /// Every requested symbol is present in the map; symbols with no rows map to `None`.
    async fn latest_dates(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Option<NaiveDate>>>;

    /// Inserts or overwrites a batch of rows keyed by `(symbol, trade_date)`.
    ///
    /// The batch is atomic: either every row is written or none is. An empty batch is a
    /// no-op returning `Ok(0)`. Returns the number of rows written.
    async fn upsert_prices(&self, rows: &[PriceRow]) -> Result<usize>;

    /// Returns stored rows for a symbol within an inclusive date range, ascending by date.
    async fn prices(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRow>>;
}

/// Durable per-provider, per-day call counters.
///
/// Exactly one counter exists per `(provider, day)`; absent counters read as zero.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Returns the recorded call count for `provider` on `day`.
    async fn usage(&self, provider: &str, day: NaiveDate) -> Result<u32>;

    /// Adds `delta` to the counter, creating it if absent. Returns the new count.
    async fn add_usage(&self, provider: &str, day: NaiveDate, delta: u32) -> Result<u32>;

    /// Raises the counter to at least `floor`, never lowering it. Returns the new count.
    async fn raise_usage(&self, provider: &str, day: NaiveDate, floor: u32) -> Result<u32>;
}

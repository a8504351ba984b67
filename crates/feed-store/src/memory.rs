//! In-memory store implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use feed_core::{PriceRow, PriceStore, QuotaStore, Result, Symbol};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Key for quota counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct UsageKey {
    provider: String,
    day: NaiveDate,
}

/// Simple in-memory store for testing and dry runs.
///
/// Data is stored in `RwLock`-protected maps and is lost when the store is dropped.
/// A batch upsert holds the write lock for the whole batch, so readers never observe
/// a partially applied batch.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    prices: RwLock<BTreeMap<(Symbol, NaiveDate), PriceRow>>,
    usage: RwLock<HashMap<UsageKey, u32>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored price rows across all symbols.
    pub async fn row_count(&self) -> usize {
        self.prices.read().await.len()
    }
}

#[async_trait]
impl PriceStore for InMemoryStore {
    async fn latest_dates(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Option<NaiveDate>>> {
        let prices = self.prices.read().await;
        Ok(symbols
            .iter()
            .map(|symbol| {
                let last = prices
                    .range((symbol.clone(), NaiveDate::MIN)..=(symbol.clone(), NaiveDate::MAX))
                    .next_back()
                    .map(|((_, day), _)| *day);
                (symbol.clone(), last)
            })
            .collect())
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn upsert_prices(&self, rows: &[PriceRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut prices = self.prices.write().await;
        for row in rows {
            prices.insert((row.symbol.clone(), row.trade_date), row.clone());
        }
        debug!("Upserted {} price rows", rows.len());
        Ok(rows.len())
    }

    async fn prices(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRow>> {
        if start > end {
            return Ok(Vec::new());
        }
        let prices = self.prices.read().await;
        Ok(prices
            .range((symbol.clone(), start)..=(symbol.clone(), end))
            .map(|(_, row)| row.clone())
            .collect())
    }
}

#[async_trait]
impl QuotaStore for InMemoryStore {
    async fn usage(&self, provider: &str, day: NaiveDate) -> Result<u32> {
        let key = UsageKey {
            provider: provider.to_string(),
            day,
        };
        Ok(self.usage.read().await.get(&key).copied().unwrap_or(0))
    }

    async fn add_usage(&self, provider: &str, day: NaiveDate, delta: u32) -> Result<u32> {
        let key = UsageKey {
            provider: provider.to_string(),
            day,
        };
        let mut usage = self.usage.write().await;
        let count = usage.entry(key).or_insert(0);
        *count = count.saturating_add(delta);
        Ok(*count)
    }

    async fn raise_usage(&self, provider: &str, day: NaiveDate, floor: u32) -> Result<u32> {
        let key = UsageKey {
            provider: provider.to_string(),
            day,
        };
        let mut usage = self.usage.write().await;
        let count = usage.entry(key).or_insert(0);
        *count = (*count).max(floor);
        Ok(*count)
    }
}

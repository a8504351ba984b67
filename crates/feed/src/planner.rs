//! Backfill planner.
//!
//! Compares the latest stored trade date of each symbol with the latest session whose
//! bar should already be published, and derives one shared lookback for the batch.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use feed_core::calendar::{is_after_close, latest_available_market_date};
use feed_core::{Clock, OutputSize, PriceStore, Result, Symbol};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Lookback for a symbol that has never been ingested.
pub const NEW_SYMBOL_LOOKBACK_DAYS: u32 = 365;

/// Lookback for refreshing today's bar after the close.
pub const SAME_DAY_REFRESH_LOOKBACK_DAYS: u32 = 2;

/// One symbol flagged for fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// Symbol to fetch.
    pub symbol: Symbol,
    /// Days of history this symbol needs.
    pub lookback_days: u32,
}

/// Ordered set of symbols needing data, computed per run and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionPlan {
    entries: Vec<PlanEntry>,
}

impl IngestionPlan {
    /// Plan entries in input order.
    #[must_use]
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Symbols to fetch, in input order.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.entries.iter().map(|e| e.symbol.clone()).collect()
    }

    /// Shared lookback for the batch: the maximum over all entries, 0 when empty.
    #[must_use]
    pub fn lookback_days(&self) -> u32 {
        self.entries
            .iter()
            .map(|e| e.lookback_days)
            .max()
            .unwrap_or(0)
    }

    /// Output size implied by the shared lookback.
    #[must_use]
    pub fn output_size(&self) -> OutputSize {
        OutputSize::for_lookback(self.lookback_days())
    }

    /// Number of flagged symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if every symbol is up to date.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for IngestionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("up to date");
        }
        let symbols: Vec<&str> = self.entries.iter().map(|e| e.symbol.as_str()).collect();
        write!(
            f,
            "{} within last {} days ({})",
            symbols.join(","),
            self.lookback_days(),
            self.output_size()
        )
    }
}

/// Returns the lookback a symbol needs, or `None` if it is up to date.
#[must_use]
pub fn required_lookback(last_stored: Option<NaiveDate>, now: &DateTime<Tz>) -> Option<u32> {
    let Some(last) = last_stored else {
        return Some(NEW_SYMBOL_LOOKBACK_DAYS);
    };

    let latest = latest_available_market_date(now);
    if last < latest {
        let gap = (latest - last).num_days();
        // One buffer day on top of the gap.
        return Some(u32::try_from(gap).unwrap_or(u32::MAX).saturating_add(1));
    }

    if last == now.date_naive() && is_after_close(now) {
        return Some(SAME_DAY_REFRESH_LOOKBACK_DAYS);
    }

    None
}

/// Builds the plan for `symbols` from their latest stored dates.
///
/// Symbols missing from `latest` are treated as never ingested. Duplicates are planned once.
#[must_use]
pub fn plan(
    symbols: &[Symbol],
    latest: &HashMap<Symbol, Option<NaiveDate>>,
    now: &DateTime<Tz>,
) -> IngestionPlan {
    let mut seen = HashSet::new();
    let entries = symbols
        .iter()
        .filter(|symbol| seen.insert(*symbol))
        .filter_map(|symbol| {
            let last = latest.get(symbol).copied().flatten();
            required_lookback(last, now).map(|lookback_days| PlanEntry {
                symbol: symbol.clone(),
                lookback_days,
            })
        })
        .collect();
    IngestionPlan { entries }
}

/// Reads the latest stored dates for `symbols` and plans against `clock`.
///
/// Makes no provider calls, so it needs neither an API key nor quota.
///
/// # Errors
/// Returns a store error if the latest stored dates cannot be read.
pub async fn plan_from_store(
    prices: &dyn PriceStore,
    clock: &dyn Clock,
    symbols: &[Symbol],
) -> Result<IngestionPlan> {
    let latest = prices.latest_dates(symbols).await?;
    Ok(plan(symbols, &latest, &clock.market_now()))
}

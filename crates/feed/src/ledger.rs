//! Quota ledger: per-provider, per-day call accounting.
//!
//! The provider enforces its own cap server-side. The ledger is a local mirror whose only
//! job is to avoid calls that are guaranteed to fail, so it never lowers a counter.

use chrono::NaiveDate;
use feed_core::{Clock, QuotaStore, Result, SystemClock};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Snapshot of a provider's budget for one reference-timezone day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaStatus {
    /// Provider quota key.
    pub provider: String,
    /// Reference-timezone day the counter belongs to.
    pub day: NaiveDate,
    /// Calls recorded so far.
    pub used: u32,
    /// Configured daily cap.
    pub limit: u32,
    /// Calls still allowed, `max(0, limit - used)`.
    pub remain: u32,
}

impl QuotaStatus {
    /// Returns true if no calls remain today.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remain == 0
    }
}

impl fmt::Display for QuotaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: used {}/{} remain {}",
            self.provider, self.day, self.used, self.limit, self.remain
        )
    }
}

/// Ledger over a [`QuotaStore`], dated by a [`Clock`].
#[derive(Clone)]
pub struct QuotaLedger {
    store: Arc<dyn QuotaStore>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for QuotaLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotaLedger")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl QuotaLedger {
    /// Create a ledger dated by the system clock.
    #[must_use]
    pub fn new(store: Arc<dyn QuotaStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock that defines "today".
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current reference-timezone day.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.market_today()
    }

    /// Returns today's budget for `provider` under `limit`.
    ///
    /// # Errors
    /// Returns [`FeedError::Store`](feed_core::FeedError::Store) if the counter cannot be read.
    pub async fn remaining(&self, provider: &str, limit: u32) -> Result<QuotaStatus> {
        let day = self.today();
        let used = self.store.usage(provider, day).await?;
        Ok(QuotaStatus {
            provider: provider.to_string(),
            day,
            used,
            limit,
            remain: limit.saturating_sub(used),
        })
    }

    /// Records `delta` attempted calls. Returns the new count.
    ///
    /// # Errors
    /// Returns [`FeedError::Store`](feed_core::FeedError::Store) if the counter cannot be written.
    pub async fn increment(&self, provider: &str, day: NaiveDate, delta: u32) -> Result<u32> {
        let used = self.store.add_usage(provider, day, delta).await?;
        debug!(provider, %day, used, "Quota incremented");
        Ok(used)
    }

    /// Raises the counter to at least `limit` after the provider confirmed exhaustion.
    ///
    /// A counter already above `limit` is left untouched. Returns the resulting count.
    ///
    /// # Errors
    /// Returns [`FeedError::Store`](feed_core::FeedError::Store) if the counter cannot be written.
    pub async fn force_to_limit(&self, provider: &str, day: NaiveDate, limit: u32) -> Result<u32> {
        let used = self.store.raise_usage(provider, day, limit).await?;
        warn!(provider, %day, used, limit, "Quota forced to daily limit");
        Ok(used)
    }
}

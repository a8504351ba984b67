//! Ingestion orchestrator and its trigger entry points.

use chrono::{Days, NaiveDate};
use feed_core::{
    Clock, DailySeriesProvider, FeedError, OutputSize, PriceRow, PriceStore, QuotaStore, Result,
    Symbol, SystemClock,
};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{DEFAULT_DAILY_LIMIT, DEFAULT_SYMBOLS, FeedConfig};
use crate::ledger::{QuotaLedger, QuotaStatus};
use crate::planner::{self, IngestionPlan};

/// Days added to a lookback when computing the row cutoff.
const SINCE_BUFFER_DAYS: u64 = 2;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every clipped symbol was attempted.
    Done,
    /// The provider confirmed exhaustion; the rest of the run was abandoned.
    Halted,
    /// No budget was left, so nothing was attempted.
    QuotaExhausted,
    /// No symbols were requested.
    NothingToDo,
}

/// Result of one ingestion run.
///
/// `rows_written` is the contract value; the remaining fields are for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Provider calls attempted.
    pub attempted: usize,
    /// Symbols skipped because the budget was smaller than the list.
    pub dropped: usize,
    /// Attempted symbols that produced no write.
    pub failed: usize,
    /// Rows upserted across the run.
    pub rows_written: usize,
}

impl IngestReport {
    const fn new(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            attempted: 0,
            dropped: 0,
            failed: 0,
            rows_written: 0,
        }
    }

    /// Log a one-line summary of the run.
    pub fn log_summary(&self, operation: &str) {
        info!(
            operation,
            outcome = ?self.outcome,
            attempted = self.attempted,
            dropped = self.dropped,
            failed = self.failed,
            rows = self.rows_written,
            "Ingestion finished"
        );
    }
}

/// Drives a run: quota check, clipping, sequential fetch, upsert, halt on exhaustion.
///
/// Runs are sequential by construction; one provider call is in flight at a time so the
/// ledger is never raced from within a run.
pub struct Ingestor {
    provider: Arc<dyn DailySeriesProvider>,
    prices: Arc<dyn PriceStore>,
    ledger: QuotaLedger,
    clock: Arc<dyn Clock>,
    daily_limit: u32,
    default_symbols: Vec<Symbol>,
}

impl fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingestor")
            .field("provider", &self.provider.name())
            .field("clock", &self.clock)
            .field("daily_limit", &self.daily_limit)
            .field("default_symbols", &self.default_symbols)
            .finish_non_exhaustive()
    }
}

impl Ingestor {
    /// Create an ingestor with the default limit, symbols and the system clock.
    #[must_use]
    pub fn new(
        provider: Arc<dyn DailySeriesProvider>,
        prices: Arc<dyn PriceStore>,
        quota: Arc<dyn QuotaStore>,
    ) -> Self {
        Self {
            provider,
            prices,
            ledger: QuotaLedger::new(quota),
            clock: Arc::new(SystemClock),
            daily_limit: DEFAULT_DAILY_LIMIT,
            default_symbols: Symbol::parse_list(DEFAULT_SYMBOLS),
        }
    }

    /// Create an ingestor using the limit and symbol universe of `config`.
    #[must_use]
    pub fn from_config(
        config: &FeedConfig,
        provider: Arc<dyn DailySeriesProvider>,
        prices: Arc<dyn PriceStore>,
        quota: Arc<dyn QuotaStore>,
    ) -> Self {
        Self::new(provider, prices, quota)
            .with_daily_limit(config.daily_limit)
            .with_default_symbols(config.symbols.clone())
    }

    /// Replace the clock that defines "now".
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.ledger = self.ledger.with_clock(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    /// Set the daily call cap.
    #[must_use]
    pub fn with_daily_limit(mut self, daily_limit: u32) -> Self {
        self.daily_limit = daily_limit;
        self
    }

    /// Set the symbols used when a caller passes none.
    #[must_use]
    pub fn with_default_symbols(mut self, symbols: Vec<Symbol>) -> Self {
        self.default_symbols = symbols;
        self
    }

    /// The quota ledger this ingestor charges.
    #[must_use]
    pub const fn ledger(&self) -> &QuotaLedger {
        &self.ledger
    }

    /// Today's budget for the configured provider.
    ///
    /// # Errors
    /// Returns a store error if the counter cannot be read.
    pub async fn quota_status(&self) -> Result<QuotaStatus> {
        self.ledger
            .remaining(self.provider.name(), self.daily_limit)
            .await
    }

    fn resolve<'a>(&'a self, symbols: &'a [Symbol]) -> &'a [Symbol] {
        if symbols.is_empty() {
            &self.default_symbols
        } else {
            symbols
        }
    }

    /// Ingest `symbols` in order, clipped to today's remaining budget.
    ///
    /// Rows older than `since` are discarded before the upsert. Per-symbol failures are
    /// logged and skipped; a rate-limit response forces the ledger to the daily limit and
    /// ends the run.
    ///
    /// # Errors
    /// Returns a store error if the quota ledger cannot be read or written.
    pub async fn ingest(
        &self,
        symbols: &[Symbol],
        output_size: OutputSize,
        since: Option<NaiveDate>,
    ) -> Result<IngestReport> {
        if symbols.is_empty() {
            return Ok(IngestReport::new(RunOutcome::NothingToDo));
        }

        let provider = self.provider.name();
        let status = self.quota_status().await?;
        info!(
            provider,
            day = %status.day,
            used = status.used,
            limit = status.limit,
            remain = status.remain,
            "Quota status"
        );

        let budget = usize::try_from(status.remain).unwrap_or(usize::MAX);
        let (todo, dropped) = symbols.split_at(budget.min(symbols.len()));

        let mut report = IngestReport::new(RunOutcome::Done);
        report.dropped = dropped.len();

        if todo.is_empty() {
            warn!(
                provider,
                used = status.used,
                limit = status.limit,
                "Daily quota exhausted, skipping run"
            );
            report.outcome = RunOutcome::QuotaExhausted;
            return Ok(report);
        }
        if !dropped.is_empty() {
            warn!(
                provider,
                remain = status.remain,
                dropped = %join(dropped),
                "Quota too small for all symbols, dropping the rest until tomorrow"
            );
        }

        for (index, symbol) in todo.iter().enumerate() {
            // The provider counts attempts, so charge before calling. A run may cross
            // midnight, so each attempt is booked to the day it is made on.
            self.ledger.increment(provider, self.ledger.today(), 1).await?;
            report.attempted += 1;

            info!(
                provider,
                symbol = %symbol,
                outputsize = %output_size,
                "Fetching daily series"
            );

            match self.provider.fetch_daily(symbol, output_size).await {
                Ok(rows) => match self.write(symbol, rows, since).await {
                    Ok(written) => report.rows_written += written,
                    Err(e) => {
                        report.failed += 1;
                        error!(symbol = %symbol, error = %e, "Failed to store rows");
                    }
                },
                Err(e) if e.is_rate_limit() => {
                    report.failed += 1;
                    warn!(
                        provider,
                        symbol = %symbol,
                        error = %e,
                        skipped = todo.len() - index - 1,
                        "Provider rate limit reached, halting run"
                    );
                    self.ledger
                        .force_to_limit(provider, self.ledger.today(), self.daily_limit)
                        .await?;
                    report.outcome = RunOutcome::Halted;
                    break;
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        symbol = %symbol,
                        kind = ?e.kind(),
                        error = %e,
                        "Failed to fetch daily series"
                    );
                }
            }
        }

        Ok(report)
    }

    async fn write(
        &self,
        symbol: &Symbol,
        mut rows: Vec<PriceRow>,
        since: Option<NaiveDate>,
    ) -> Result<usize> {
        if let Some(since) = since {
            rows.retain(|row| row.trade_date >= since);
        }
        let written = self.prices.upsert_prices(&rows).await?;
        info!(symbol = %symbol, rows = written, "Upserted daily rows");
        Ok(written)
    }

    /// Ingest the last `within_last_days` days for `symbols`.
    ///
    /// An empty list means the configured default universe. The output size defaults to
    /// whatever the lookback needs, and rows older than `within_last_days + 2` days are
    /// discarded. Returns the number of rows written.
    ///
    /// # Errors
    /// Returns [`FeedError::InvalidParameter`] if the lookback reaches past the earliest
    /// representable date, or a store error if the quota ledger cannot be read or written.
    pub async fn ingest_daily_prices(
        &self,
        symbols: &[Symbol],
        within_last_days: u32,
        size: Option<OutputSize>,
    ) -> Result<usize> {
        let symbols = self.resolve(symbols);
        let output_size = size.unwrap_or_else(|| OutputSize::for_lookback(within_last_days));
        let since = self
            .clock
            .market_today()
            .checked_sub_days(Days::new(u64::from(within_last_days) + SINCE_BUFFER_DAYS))
            .ok_or_else(|| {
                FeedError::InvalidParameter(format!(
                    "within_last_days {within_last_days} reaches before the earliest date"
                ))
            })?;

        let report = self.ingest(symbols, output_size, Some(since)).await?;
        report.log_summary("ingest_daily_prices");
        Ok(report.rows_written)
    }

    /// Compute which of `symbols` are behind and how far back to fetch.
    ///
    /// An empty list means the configured default universe. No provider calls are made.
    ///
    /// # Errors
    /// Returns a store error if the latest stored dates cannot be read.
    pub async fn plan_backfill(&self, symbols: &[Symbol]) -> Result<IngestionPlan> {
        planner::plan_from_store(
            self.prices.as_ref(),
            self.clock.as_ref(),
            self.resolve(symbols),
        )
        .await
    }

    /// Bring `symbols` up to date at start-up, within today's quota.
    ///
    /// Never fails: errors are logged.
    pub async fn ensure_fresh_market_data_on_boot(&self, symbols: &[Symbol]) {
        if let Err(e) = self.boot_check(symbols).await {
            error!(error = %e, "Boot ingestion check failed");
        }
    }

    async fn boot_check(&self, symbols: &[Symbol]) -> Result<usize> {
        let status = self.quota_status().await?;
        info!(
            day = %status.day,
            used = status.used,
            limit = status.limit,
            remain = status.remain,
            "Boot check quota"
        );

        let now = self.clock.market_now();
        let plan = self.plan_backfill(symbols).await?;
        if plan.is_empty() {
            info!(
                latest_available = %feed_core::calendar::latest_available_market_date(&now),
                after_close = feed_core::calendar::is_after_close(&now),
                "Market data up to date"
            );
            return Ok(0);
        }

        info!(
            symbols = %join(&plan.symbols()),
            within_last_days = plan.lookback_days(),
            "Boot backfill planned, calls limited by daily quota"
        );
        self.ingest_daily_prices(&plan.symbols(), plan.lookback_days(), None)
            .await
    }
}

/// Run the boot check in the background.
pub fn spawn_boot_check(ingestor: Arc<Ingestor>, symbols: Vec<Symbol>) -> JoinHandle<()> {
    tokio::spawn(async move {
        ingestor.ensure_fresh_market_data_on_boot(&symbols).await;
    })
}

fn join(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

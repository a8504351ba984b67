//! SQLite-based store implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use feed_core::{FeedError, PriceRow, PriceStore, QuotaStore, Result, Symbol};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-based store for daily prices and provider call counters.
///
/// Prices live in `stock_prices` keyed by `(symbol, trade_date)`; counters live in
/// `api_call_usage` keyed by `(provider, ymd)`. Decimal prices are stored as their
/// canonical string form so values round-trip exactly.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn store_err(e: impl Display) -> FeedError {
    FeedError::Store(e.to_string())
}

impl SqliteStore {
    /// Open (or create) a SQLite store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(store_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS stock_prices (
                symbol TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                open TEXT NOT NULL,
                high TEXT NOT NULL,
                low TEXT NOT NULL,
                close TEXT NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (symbol, trade_date)
            )",
            [],
        )
        .map_err(store_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS api_call_usage (
                provider TEXT NOT NULL,
                ymd TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (provider, ymd)
            )",
            [],
        )
        .map_err(store_err)?;

        debug!("SQLite store schema initialized");
        Ok(())
    }

    fn parse_date(s: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|e| FeedError::Store(format!("Invalid stored date {s}: {e}")))
    }

    fn parse_decimal(s: &str) -> Result<Decimal> {
        Decimal::from_str(s).map_err(|e| FeedError::Store(format!("Invalid stored price {s}: {e}")))
    }

    fn to_count(raw: i64) -> Result<u32> {
        u32::try_from(raw).map_err(|_| FeedError::Store(format!("Counter out of range: {raw}")))
    }
}

#[async_trait]
impl PriceStore for SqliteStore {
    #[instrument(skip(self, symbols), fields(symbols = symbols.len()))]
    async fn latest_dates(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Option<NaiveDate>>> {
        let mut latest: HashMap<Symbol, Option<NaiveDate>> =
            symbols.iter().map(|s| (s.clone(), None)).collect();
        if symbols.is_empty() {
            return Ok(latest);
        }

        let placeholders = (1..=symbols.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "SELECT symbol, MAX(trade_date) FROM stock_prices
             WHERE symbol IN ({placeholders})
             GROUP BY symbol"
        );

        let conn = self.conn.lock().map_err(store_err)?;
        let mut stmt = conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt
            .query_map(params_from_iter(symbols.iter().map(Symbol::as_str)), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(store_err)?;

        for row in rows {
            let (symbol, last) = row.map_err(store_err)?;
            latest.insert(Symbol::new(symbol), Some(Self::parse_date(&last)?));
        }

        debug!("Resolved latest dates for {} symbols", latest.len());
        Ok(latest)
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn upsert_prices(&self, rows: &[PriceRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let conn = self.conn.lock().map_err(store_err)?;
        let tx = conn.unchecked_transaction().map_err(store_err)?;

        let mut written = 0usize;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO stock_prices (symbol, trade_date, open, high, low, close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT (symbol, trade_date) DO UPDATE SET
                        open = excluded.open,
                        high = excluded.high,
                        low = excluded.low,
                        close = excluded.close,
                        volume = excluded.volume",
                )
                .map_err(store_err)?;

            for row in rows {
                // Dropping the transaction on any error below rolls the whole batch back.
                let volume = i64::try_from(row.volume).map_err(|_| {
                    FeedError::Store(format!(
                        "Volume out of range for {} on {}: {}",
                        row.symbol, row.trade_date, row.volume
                    ))
                })?;
                written += stmt
                    .execute(params![
                        row.symbol.as_str(),
                        row.trade_date.format(DATE_FORMAT).to_string(),
                        row.open.to_string(),
                        row.high.to_string(),
                        row.low.to_string(),
                        row.close.to_string(),
                        volume,
                    ])
                    .map_err(store_err)?;
            }
        }

        tx.commit().map_err(store_err)?;
        debug!("Upserted {} price rows", written);
        Ok(written)
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn prices(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRow>> {
        let conn = self.conn.lock().map_err(store_err)?;

        let mut stmt = conn
            .prepare(
                "SELECT trade_date, open, high, low, close, volume
                 FROM stock_prices
                 WHERE symbol = ?1 AND trade_date >= ?2 AND trade_date <= ?3
                 ORDER BY trade_date ASC",
            )
            .map_err(store_err)?;

        let rows = stmt
            .query_map(
                params![
                    symbol.as_str(),
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .map_err(store_err)?;

        let mut prices = Vec::new();
        for row in rows {
            let (date, open, high, low, close, volume) = row.map_err(store_err)?;
            prices.push(PriceRow::new(
                symbol.clone(),
                Self::parse_date(&date)?,
                Self::parse_decimal(&open)?,
                Self::parse_decimal(&high)?,
                Self::parse_decimal(&low)?,
                Self::parse_decimal(&close)?,
                u64::try_from(volume).map_err(|_| {
                    FeedError::Store(format!("Negative stored volume for {symbol} on {date}"))
                })?,
            ));
        }

        debug!("Found {} stored price rows", prices.len());
        Ok(prices)
    }
}

#[async_trait]
impl QuotaStore for SqliteStore {
    #[instrument(skip(self))]
    async fn usage(&self, provider: &str, day: NaiveDate) -> Result<u32> {
        let conn = self.conn.lock().map_err(store_err)?;

        let count = conn
            .query_row(
                "SELECT count FROM api_call_usage WHERE provider = ?1 AND ymd = ?2",
                params![provider, day.format(DATE_FORMAT).to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map_err(store_err)?;

        count.map_or(Ok(0), Self::to_count)
    }

    #[instrument(skip(self))]
    async fn add_usage(&self, provider: &str, day: NaiveDate, delta: u32) -> Result<u32> {
        let conn = self.conn.lock().map_err(store_err)?;

        let count = conn
            .query_row(
                "INSERT INTO api_call_usage (provider, ymd, count)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (provider, ymd) DO UPDATE SET
                    count = api_call_usage.count + excluded.count
                 RETURNING count",
                params![provider, day.format(DATE_FORMAT).to_string(), i64::from(delta)],
                |row| row.get::<_, i64>(0),
            )
            .map_err(store_err)?;

        debug!(count, "Recorded provider call");
        Self::to_count(count)
    }

    #[instrument(skip(self))]
    async fn raise_usage(&self, provider: &str, day: NaiveDate, floor: u32) -> Result<u32> {
        let conn = self.conn.lock().map_err(store_err)?;

        let count = conn
            .query_row(
                "INSERT INTO api_call_usage (provider, ymd, count)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (provider, ymd) DO UPDATE SET
                    count = MAX(api_call_usage.count, excluded.count)
                 RETURNING count",
                params![provider, day.format(DATE_FORMAT).to_string(), i64::from(floor)],
                |row| row.get::<_, i64>(0),
            )
            .map_err(store_err)?;

        debug!(count, "Raised provider call counter");
        Self::to_count(count)
    }
}

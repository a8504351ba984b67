#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/feed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for quota-aware daily price ingestion.
//!
//! This crate provides the foundational abstractions shared by every other crate:
//!
//! - [`DailySeriesProvider`](provider::DailySeriesProvider) - Fetches a daily OHLCV series
//! - [`PriceStore`](store::PriceStore) - Keyed `(symbol, trade_date)` price storage
//! - [`QuotaStore`](store::QuotaStore) - Durable per-provider, per-day call counters
//! - [`Clock`](calendar::Clock) - Injectable source of "now"
//! - [`FeedError`](error::FeedError) - Error taxonomy for a run

/// Clock abstraction and US equity market calendar helpers.
pub mod calendar;
/// Error types for ingestion operations.
pub mod error;
/// Provider traits for fetching daily series.
pub mod provider;
/// Output size and series variant definitions.
pub mod series;
/// Storage traits for prices and quota counters.
pub mod store;
/// Core data types (Symbol, PriceRow).
pub mod types;

// Re-export commonly used items at crate root
pub use calendar::{Clock, FixedClock, MARKET_CLOSE_HOUR, REFERENCE_TZ, SystemClock};
pub use error::{FailureKind, FeedError, Result};
pub use provider::{DailySeriesProvider, DataProvider};
pub use series::{FULL_OUTPUT_THRESHOLD_DAYS, OutputSize, SeriesVariant};
pub use store::{PriceStore, QuotaStore};
pub use types::{PriceRow, Symbol};

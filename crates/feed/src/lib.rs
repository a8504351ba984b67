#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/feed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Quota-aware daily price ingestion.
//!
//! This crate wires a [`DailySeriesProvider`] and a price/quota store into an
//! [`Ingestor`], which decides what to fetch, rations the provider's daily call budget,
//! and writes what comes back.
//!
//! # Features
//!
//! - `alphavantage` - Alpha Vantage provider
//! - `store-sqlite` - SQLite-backed price and quota store
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use feed::{FeedConfig, Ingestor, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> feed::Result<()> {
//!     let config = FeedConfig::from_env()?;
//!     let store = Arc::new(SqliteStore::new(&config.db_path)?);
//!     let provider = Arc::new(config.alphavantage_provider()?);
//!
//!     let ingestor = Ingestor::from_config(&config, provider, store.clone(), store);
//!     let rows = ingestor.ingest_daily_prices(&[], 5, None).await?;
//!     println!("wrote {rows} rows");
//!     Ok(())
//! }
//! ```

/// Environment configuration.
pub mod config;
/// Ingestion orchestrator and trigger entry points.
pub mod ingest;
/// Quota ledger.
pub mod ledger;
/// Backfill planner.
pub mod planner;
/// Weekday schedule for the daily job.
pub mod schedule;

pub use config::{DaemonConfig, FeedConfig};
pub use ingest::{IngestReport, Ingestor, RunOutcome, spawn_boot_check};
pub use ledger::{QuotaLedger, QuotaStatus};
pub use planner::{IngestionPlan, PlanEntry};
pub use schedule::Schedule;

// Re-export core types
pub use feed_core::*;

// Re-export stores
pub use feed_store::InMemoryStore;
#[cfg(feature = "store-sqlite")]
pub use feed_store::SqliteStore;

// Re-export providers
#[cfg(feature = "alphavantage")]
pub use feed_alphavantage::{AlphaVantageProvider, PROVIDER_NAME as ALPHAVANTAGE};

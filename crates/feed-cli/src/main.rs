//! Daily price ingestion CLI.

use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use feed::{
    ALPHAVANTAGE, FeedConfig, Ingestor, OutputSize, QuotaLedger, SqliteStore, Symbol, SystemClock,
    planner,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "feed-ingest")]
#[command(about = "Quota-aware daily OHLCV ingestion", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the last N days for a symbol list
    Ingest {
        /// Comma-separated symbols (default: SYMBOLS)
        #[arg(long)]
        symbols: Option<String>,

        /// Days of history to keep from each response
        #[arg(long, default_value_t = 5)]
        within_last_days: u32,

        /// Output size (compact, full); derived from the lookback when omitted
        #[arg(long)]
        size: Option<OutputSize>,
    },

    /// Run the start-up freshness check once
    BootCheck {
        /// Comma-separated symbols (default: SYMBOLS)
        #[arg(long)]
        symbols: Option<String>,
    },

    /// Print the backfill plan without calling the provider
    Plan {
        /// Comma-separated symbols (default: SYMBOLS)
        #[arg(long)]
        symbols: Option<String>,
    },

    /// Print today's provider quota usage
    Quota,

    /// Daemon mode: boot check, then the weekday schedule
    Daemon,
}

fn symbol_list(symbols: Option<&str>) -> Vec<Symbol> {
    symbols.map(Symbol::parse_list).unwrap_or_default()
}

fn build_ingestor(config: &FeedConfig, store: &Arc<SqliteStore>) -> feed::Result<Arc<Ingestor>> {
    let provider = Arc::new(config.alphavantage_provider()?);
    tracing::debug!(?provider, "Provider ready");
    Ok(Arc::new(Ingestor::from_config(
        config,
        provider,
        store.clone(),
        store.clone(),
    )))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = &cli.log_level;
                format!("feed={level},feed_ingest={level},feed_alphavantage={level},feed_store={level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = FeedConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let store = Arc::new(SqliteStore::new(&config.db_path)?);
    tracing::info!(path = %config.db_path.display(), "Store opened");

    match cli.command {
        Commands::Ingest {
            symbols,
            within_last_days,
            size,
        } => {
            let ingestor = build_ingestor(&config, &store)?;
            let rows = ingestor
                .ingest_daily_prices(&symbol_list(symbols.as_deref()), within_last_days, size)
                .await?;
            println!("rows written: {rows}");
        }
        Commands::BootCheck { symbols } => {
            let ingestor = build_ingestor(&config, &store)?;
            ingestor
                .ensure_fresh_market_data_on_boot(&symbol_list(symbols.as_deref()))
                .await;
        }
        Commands::Plan { symbols } => {
            let mut symbols = symbol_list(symbols.as_deref());
            if symbols.is_empty() {
                symbols.clone_from(&config.symbols);
            }
            let plan = planner::plan_from_store(store.as_ref(), &SystemClock, &symbols).await?;
            for entry in plan.entries() {
                println!("{:<8} lookback {} days", entry.symbol, entry.lookback_days);
            }
            println!("plan: {plan}");
        }
        Commands::Quota => {
            let status = QuotaLedger::new(store.clone())
                .remaining(ALPHAVANTAGE, config.daily_limit)
                .await?;
            println!("{status}");
        }
        Commands::Daemon => {
            let ingestor = build_ingestor(&config, &store)?;
            run_daemon(&config, ingestor).await?;
        }
    }

    Ok(())
}

async fn run_daemon(config: &FeedConfig, ingestor: Arc<Ingestor>) -> feed::Result<()> {
    let daemon = &config.daemon;

    if daemon.boot_ingest {
        let _boot_check = feed::spawn_boot_check(Arc::clone(&ingestor), Vec::new());
    } else {
        tracing::info!("Boot ingestion disabled");
    }

    if !daemon.cron_enabled {
        tracing::info!("Scheduled ingestion disabled, waiting for shutdown signal");
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        return Ok(());
    }

    tracing::info!(schedule = %daemon.schedule, "=== Daemon started ===");

    loop {
        let now = Utc::now();
        let Some(next) = daemon.schedule.next_after(now) else {
            return Err(feed::FeedError::Config(format!(
                "schedule {} has no upcoming firing time",
                daemon.schedule
            )));
        };
        tracing::info!(
            next = %next.with_timezone(&daemon.schedule.tz()),
            "Next scheduled ingestion"
        );
        let wait = (next - now).to_std().unwrap_or_default();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, stopping daemon");
                break;
            }
            () = tokio::time::sleep(wait) => {
                match ingestor
                    .ingest_daily_prices(&[], daemon.cron_lookback_days, None)
                    .await
                {
                    Ok(rows) => tracing::info!(rows, "Scheduled ingestion done"),
                    Err(e) => tracing::error!(error = %e, "Scheduled ingestion failed"),
                }
            }
        }
    }

    Ok(())
}

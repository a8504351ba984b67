//! Environment-driven configuration.

use chrono::NaiveTime;
use chrono_tz::Tz;
use feed_core::{FeedError, REFERENCE_TZ, Result, Symbol};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::schedule::Schedule;

/// Symbol universe used when neither the caller nor `SYMBOLS` provides one.
pub const DEFAULT_SYMBOLS: &str = "AAPL,MSFT,AMZN,GOOGL,TSLA";

/// Daily call cap of the free Alpha Vantage tier.
pub const DEFAULT_DAILY_LIMIT: u32 = 25;

/// Lookback of the scheduled job.
pub const DEFAULT_CRON_LOOKBACK_DAYS: u32 = 3;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
const DEFAULT_DB_PATH: &str = "market_data.db";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CRON_TIME: &str = "18:05";

/// Full ingestion configuration.
#[derive(Clone)]
pub struct FeedConfig {
    /// Provider API key (`ALPHAVANTAGE_API_KEY`).
    pub api_key: Option<String>,
    /// Daily call cap (`ALPHAVANTAGE_DAILY_LIMIT`).
    pub daily_limit: u32,
    /// Prefer the adjusted series (`ALPHAVANTAGE_USE_ADJUSTED`).
    pub use_adjusted: bool,
    /// Provider endpoint (`ALPHAVANTAGE_BASE_URL`).
    pub base_url: String,
    /// Per-request timeout (`ALPHAVANTAGE_TIMEOUT_SECS`), never zero.
    pub request_timeout: Duration,
    /// SQLite file holding prices and quota counters (`FEED_DB_PATH`).
    pub db_path: PathBuf,
    /// Default symbol universe (`SYMBOLS`).
    pub symbols: Vec<Symbol>,
    /// Daemon settings.
    pub daemon: DaemonConfig,
}

/// Daemon trigger settings.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Run the boot check at start-up (`ENABLE_BOOT_INGEST`).
    pub boot_ingest: bool,
    /// Run the scheduled job (`ENABLE_INGEST_CRON`).
    pub cron_enabled: bool,
    /// When the scheduled job fires (`INGEST_CRON_TIME`, `INGEST_CRON_TZ`).
    pub schedule: Schedule,
    /// Lookback of the scheduled job (`INGEST_CRON_LOOKBACK_DAYS`).
    pub cron_lookback_days: u32,
}

impl fmt::Debug for FeedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("daily_limit", &self.daily_limit)
            .field("use_adjusted", &self.use_adjusted)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("db_path", &self.db_path)
            .field("symbols", &self.symbols)
            .field("daemon", &self.daemon)
            .finish()
    }
}

impl FeedConfig {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file is read first, from `DOTENV_CONFIG_PATH` when set. Variables already
    /// present in the environment win over the file.
    ///
    /// # Errors
    /// Returns [`FeedError::Config`] if the schedule time or timezone cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let loaded = match std::env::var("DOTENV_CONFIG_PATH") {
            Ok(path) => dotenvy::from_path(path).is_ok(),
            Err(_) => dotenvy::dotenv().is_ok(),
        };
        if !loaded {
            debug!("No .env file loaded, using process environment only");
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Malformed numbers and booleans fall back to their defaults.
    ///
    /// # Errors
    /// Returns [`FeedError::Config`] if the schedule time or timezone cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parse_or = |key: &str, default: u64| {
            get(key)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };
        let bool_or =
            |key: &str, default: bool| get(key).map_or(default, |v| parse_bool(&v, default));

        let symbols =
            Symbol::parse_list(&get("SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.to_string()));
        let symbols = if symbols.is_empty() {
            Symbol::parse_list(DEFAULT_SYMBOLS)
        } else {
            symbols
        };

        let time = get("INGEST_CRON_TIME").unwrap_or_else(|| DEFAULT_CRON_TIME.to_string());
        let time = NaiveTime::parse_from_str(&time, "%H:%M").map_err(|e| {
            FeedError::Config(format!("INGEST_CRON_TIME must be HH:MM, got {time:?}: {e}"))
        })?;
        let tz = match get("INGEST_CRON_TZ") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| FeedError::Config(format!("INGEST_CRON_TZ {name:?}: {e}")))?,
            None => REFERENCE_TZ,
        };

        Ok(Self {
            api_key: get("ALPHAVANTAGE_API_KEY"),
            daily_limit: u32::try_from(parse_or(
                "ALPHAVANTAGE_DAILY_LIMIT",
                DEFAULT_DAILY_LIMIT.into(),
            ))
            .unwrap_or(DEFAULT_DAILY_LIMIT),
            use_adjusted: bool_or("ALPHAVANTAGE_USE_ADJUSTED", false),
            base_url: get("ALPHAVANTAGE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(
                get("ALPHAVANTAGE_TIMEOUT_SECS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            db_path: get("FEED_DB_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from),
            symbols,
            daemon: DaemonConfig {
                boot_ingest: bool_or("ENABLE_BOOT_INGEST", true),
                cron_enabled: bool_or("ENABLE_INGEST_CRON", false),
                schedule: Schedule::new(time, tz),
                cron_lookback_days: u32::try_from(parse_or(
                    "INGEST_CRON_LOOKBACK_DAYS",
                    DEFAULT_CRON_LOOKBACK_DAYS.into(),
                ))
                .unwrap_or(DEFAULT_CRON_LOOKBACK_DAYS),
            },
        })
    }

    /// Returns the API key, or a configuration error if it is missing.
    ///
    /// # Errors
    /// Returns [`FeedError::Config`] if `ALPHAVANTAGE_API_KEY` is unset or empty.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| FeedError::Config("missing ALPHAVANTAGE_API_KEY".to_string()))
    }

    /// Build the Alpha Vantage provider described by this configuration.
    ///
    /// # Errors
    /// Returns [`FeedError::Config`] if the API key is missing or the client cannot be built.
    #[cfg(feature = "alphavantage")]
    pub fn alphavantage_provider(&self) -> Result<feed_alphavantage::AlphaVantageProvider> {
        let provider = feed_alphavantage::AlphaVantageProvider::with_timeout(
            self.require_api_key()?,
            self.request_timeout,
        )?
        .with_base_url(self.base_url.clone())
        .with_adjusted_preference(self.use_adjusted);
        Ok(provider)
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<FeedConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        FeedConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.daily_limit, 25);
        assert!(!config.use_adjusted);
        assert_eq!(config.base_url, "https://www.alphavantage.co/query");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.db_path, PathBuf::from("market_data.db"));
        assert_eq!(
            config.symbols,
            vec![
                Symbol::new("AAPL"),
                Symbol::new("MSFT"),
                Symbol::new("AMZN"),
                Symbol::new("GOOGL"),
                Symbol::new("TSLA"),
            ]
        );
        assert!(config.daemon.boot_ingest);
        assert!(!config.daemon.cron_enabled);
        assert_eq!(config.daemon.cron_lookback_days, 3);
        assert_eq!(config.daemon.schedule.tz(), REFERENCE_TZ);
        assert_eq!(
            config.daemon.schedule.time(),
            NaiveTime::from_hms_opt(18, 5, 0).unwrap()
        );
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ALPHAVANTAGE_API_KEY", "abc"),
            ("ALPHAVANTAGE_DAILY_LIMIT", "500"),
            ("ALPHAVANTAGE_USE_ADJUSTED", "true"),
            ("SYMBOLS", " nvda, meta ,,"),
            ("ENABLE_BOOT_INGEST", "false"),
            ("ENABLE_INGEST_CRON", "1"),
            ("INGEST_CRON_TIME", "17:30"),
            ("INGEST_CRON_TZ", "Asia/Taipei"),
            ("INGEST_CRON_LOOKBACK_DAYS", "7"),
        ])
        .unwrap();

        assert_eq!(config.require_api_key().unwrap(), "abc");
        assert_eq!(config.daily_limit, 500);
        assert!(config.use_adjusted);
        assert_eq!(config.symbols, vec![Symbol::new("NVDA"), Symbol::new("META")]);
        assert!(!config.daemon.boot_ingest);
        assert!(config.daemon.cron_enabled);
        assert_eq!(config.daemon.schedule.tz(), chrono_tz::Asia::Taipei);
        assert_eq!(config.daemon.cron_lookback_days, 7);
    }

    #[test]
    fn test_malformed_numbers_fall_back() {
        let config = config_from(&[
            ("ALPHAVANTAGE_DAILY_LIMIT", "lots"),
            ("ALPHAVANTAGE_TIMEOUT_SECS", "-1"),
            ("ENABLE_BOOT_INGEST", "maybe"),
        ])
        .unwrap();
        assert_eq!(config.daily_limit, 25);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.daemon.boot_ingest);
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        let config = config_from(&[("ALPHAVANTAGE_TIMEOUT_SECS", "0")]).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));

        let config = config_from(&[("ALPHAVANTAGE_TIMEOUT_SECS", "5")]).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_schedule_is_config_error() {
        let err = config_from(&[("INGEST_CRON_TIME", "6pm")]).unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));

        let err = config_from(&[("INGEST_CRON_TZ", "Mars/Olympus")]).unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn test_missing_api_key() {
        let config = config_from(&[("ALPHAVANTAGE_API_KEY", "   ")]).unwrap();
        assert!(matches!(config.require_api_key(), Err(FeedError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = config_from(&[("ALPHAVANTAGE_API_KEY", "secret_key_12345")]).unwrap();
        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}

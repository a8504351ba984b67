#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/feed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Alpha Vantage daily series provider.
//!
//! This crate implements the feed-core provider traits for the
//! [Alpha Vantage](https://www.alphavantage.co/) `query` endpoint.
//!
//! Alpha Vantage reports quota exhaustion and paid-tier gating through text fields of an
//! otherwise `200 OK` JSON body, so every response goes through [`classify_response`]
//! before any series data is read.
//!
//! # Usage
//!
//! ```rust,ignore
//! use feed_alphavantage::AlphaVantageProvider;
//! use feed_core::{DailySeriesProvider, OutputSize, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = AlphaVantageProvider::new("your_api_key")?.with_adjusted_preference(true);
//!
//!     let rows = provider.fetch_daily(&Symbol::new("AAPL"), OutputSize::Compact).await?;
//!     println!("fetched {} rows", rows.len());
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use feed_core::{
    DailySeriesProvider, DataProvider, FeedError, OutputSize, PriceRow, Result, SeriesVariant,
    Symbol,
};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Alpha Vantage query endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Quota key under which calls to this provider are counted.
pub const PROVIDER_NAME: &str = "alphavantage";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sentinel fragments that mean the daily (or per-minute) call cap was hit.
const RATE_LIMIT_MARKERS: &[&str] = &[
    "higher call volume",
    "standard api usage limit",
    "per minute",
    "per day",
    "25 requests per day",
];

/// Sentinel fragment that means the requested function needs a paid plan.
const PREMIUM_MARKER: &str = "premium endpoint";

/// Alpha Vantage daily series provider.
///
/// One instance is meant to be built per process and shared; the inner HTTP client
/// pools connections.
#[derive(Clone)]
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    base_url: String,
    prefer_adjusted: bool,
}

impl fmt::Debug for AlphaVantageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphaVantageProvider")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("prefer_adjusted", &self.prefer_adjusted)
            .finish()
    }
}

impl AlphaVantageProvider {
    /// Create a new provider with the given API key and the default timeout.
    ///
    /// # Errors
    /// Returns [`FeedError::Config`] if the key is empty or the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Create a new provider whose requests time out after `timeout`.
    ///
    /// # Errors
    /// Returns [`FeedError::Config`] if the key is empty or the HTTP client cannot be built.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Config(format!("Failed to create HTTP client: {e}")))?;
        Self::with_client(client, api_key)
    }

    /// Create a new provider with a custom HTTP client.
    ///
    /// # Errors
    /// Returns [`FeedError::Config`] if the key is empty.
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FeedError::Config(
                "missing ALPHAVANTAGE_API_KEY".to_string(),
            ));
        }
        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            prefer_adjusted: false,
        })
    }

    /// Point the provider at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Prefer the adjusted series, falling back to the raw series when it is gated.
    #[must_use]
    pub fn with_adjusted_preference(mut self, prefer_adjusted: bool) -> Self {
        self.prefer_adjusted = prefer_adjusted;
        self
    }

    /// The series variant tried first.
    #[must_use]
    pub const fn preferred_variant(&self) -> SeriesVariant {
        if self.prefer_adjusted {
            SeriesVariant::DailyAdjusted
        } else {
            SeriesVariant::Daily
        }
    }

    /// Query parameters for one request, API key last.
    fn query_params(
        &self,
        symbol: &Symbol,
        variant: SeriesVariant,
        output_size: OutputSize,
    ) -> [(&'static str, String); 5] {
        [
            ("function", variant.function_name().to_string()),
            ("symbol", symbol.as_str().to_string()),
            ("datatype", "json".to_string()),
            ("outputsize", output_size.as_str().to_string()),
            ("apikey", self.api_key.clone()),
        ]
    }

    /// Fetch and normalize one series variant.
    async fn fetch_variant(
        &self,
        symbol: &Symbol,
        variant: SeriesVariant,
        output_size: OutputSize,
    ) -> Result<Vec<PriceRow>> {
        debug!(
            symbol = %symbol,
            function = variant.function_name(),
            outputsize = output_size.as_str(),
            "Alpha Vantage request"
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query_params(symbol, variant, output_size))
            .send()
            .await
            .map_err(|e| FeedError::Network(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(FeedError::Network(format!("Alpha Vantage HTTP {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FeedError::Network(e.without_url().to_string()))?;

        let parsed: TimeSeriesResponse = serde_json::from_str(&text).map_err(|e| {
            FeedError::Malformed(format!("{e}: {}", truncate(&text, 200)))
        })?;

        match classify_response(parsed) {
            ResponseClass::Series(series) => normalize_series(symbol, series),
            ResponseClass::RateLimit(message) => Err(FeedError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
                message,
            }),
            ResponseClass::PremiumGated(message) => Err(FeedError::PremiumGated {
                provider: PROVIDER_NAME.to_string(),
                symbol: symbol.to_string(),
                message,
            }),
            ResponseClass::Malformed(message) => Err(FeedError::Malformed(format!(
                "Alpha Vantage error for {symbol}: {message}"
            ))),
        }
    }
}

impl DataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Alpha Vantage - daily equity time series API"
    }
}

#[async_trait]
impl DailySeriesProvider for AlphaVantageProvider {
    async fn fetch_daily(
        &self,
        symbol: &Symbol,
        output_size: OutputSize,
    ) -> Result<Vec<PriceRow>> {
        let preferred = self.preferred_variant();

        match self.fetch_variant(symbol, preferred, output_size).await {
            Err(err @ FeedError::PremiumGated { .. }) => match preferred.fallback() {
                Some(fallback) => {
                    warn!(
                        symbol = %symbol,
                        from = preferred.function_name(),
                        to = fallback.function_name(),
                        "Premium endpoint, retrying with unadjusted series"
                    );
                    self.fetch_variant(symbol, fallback, output_size).await
                }
                None => Err(err),
            },
            other => other,
        }
    }
}

// ============================================================================
// Response classification
// ============================================================================

/// Outcome of inspecting a decoded Alpha Vantage body.
///
/// Transport failures never reach this point; they are reported by the HTTP layer as
/// [`FeedError::Network`].
#[derive(Debug)]
pub enum ResponseClass {
    /// A usable series keyed by `YYYY-MM-DD`.
    Series(BTreeMap<String, DailyBar>),
    /// Daily or per-minute cap reached.
    RateLimit(String),
    /// Requested function requires a paid tier.
    PremiumGated(String),
    /// Provider error message or missing series.
    Malformed(String),
}

/// Classify a decoded response body.
///
/// Rate limiting is checked first, then premium gating, then explicit error messages,
/// and only then the series itself.
#[must_use]
pub fn classify_response(response: TimeSeriesResponse) -> ResponseClass {
    let limited = [response.note.as_deref(), response.information.as_deref()]
        .into_iter()
        .flatten()
        .find(|text| is_rate_limit_message(text));
    if let Some(message) = limited {
        return ResponseClass::RateLimit(message.to_string());
    }

    let gated = [
        response.information.as_deref(),
        response.note.as_deref(),
        response.error_message.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|text| is_premium_message(text));
    if let Some(message) = gated {
        return ResponseClass::PremiumGated(message.to_string());
    }

    if let Some(message) = response.error_message {
        return ResponseClass::Malformed(message);
    }

    match response.series {
        Some(series) => ResponseClass::Series(series),
        None => ResponseClass::Malformed(format!(
            "no time series in response{}",
            response
                .information
                .or(response.note)
                .map(|text| format!(" ({text})"))
                .unwrap_or_default()
        )),
    }
}

/// Returns true if `text` is one of Alpha Vantage's call-cap notices.
#[must_use]
pub fn is_rate_limit_message(text: &str) -> bool {
    let text = text.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Returns true if `text` says the endpoint needs a premium plan.
#[must_use]
pub fn is_premium_message(text: &str) -> bool {
    text.to_lowercase().contains(PREMIUM_MARKER)
}

/// Convert a raw series into rows sorted ascending by trade date.
///
/// # Errors
/// Returns [`FeedError::Malformed`] if a date, price or volume cannot be parsed.
pub fn normalize_series(
    symbol: &Symbol,
    series: BTreeMap<String, DailyBar>,
) -> Result<Vec<PriceRow>> {
    let mut rows = series
        .into_iter()
        .map(|(date, bar)| bar.into_row(symbol, &date))
        .collect::<Result<Vec<_>>>()?;
    rows.sort_by_key(|row| row.trade_date);
    Ok(rows)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ============================================================================
// Alpha Vantage API Response Types
// ============================================================================

/// TIME_SERIES_DAILY / TIME_SERIES_DAILY_ADJUSTED response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSeriesResponse {
    #[serde(
        rename = "Time Series (Daily)",
        alias = "Time Series (Daily Adjusted)",
        alias = "Time Series (Digital Currency Daily)"
    )]
    series: Option<BTreeMap<String, DailyBar>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// One day of a time series, with Alpha Vantage's numbered field names.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    // Position of volume depends on the function: 5 (daily), 6 (adjusted), 7/8 (others).
    #[serde(
        rename = "5. volume",
        alias = "6. volume",
        alias = "7. volume",
        alias = "8. volume",
        default
    )]
    volume: Option<String>,
}

impl DailyBar {
    fn into_row(self, symbol: &Symbol, date: &str) -> Result<PriceRow> {
        let trade_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
            FeedError::Malformed(format!("Invalid trade date {date} for {symbol}: {e}"))
        })?;
        let price = |field: &str, raw: &str| {
            Decimal::from_str(raw.trim()).map_err(|e| {
                FeedError::Malformed(format!("Invalid {field} {raw:?} for {symbol} on {date}: {e}"))
            })
        };

        Ok(PriceRow::new(
            symbol.clone(),
            trade_date,
            price("open", &self.open)?,
            price("high", &self.high)?,
            price("low", &self.low)?,
            price("close", &self.close)?,
            parse_volume(self.volume.as_deref(), symbol, date)?,
        ))
    }
}

/// Volumes may be integral or fractional strings; fractions are truncated, absence is zero.
fn parse_volume(raw: Option<&str>, symbol: &Symbol, date: &str) -> Result<u64> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(0);
    };
    if let Ok(volume) = raw.parse::<u64>() {
        return Ok(volume);
    }
    Decimal::from_str(raw)
        .ok()
        .and_then(|d| d.trunc().to_u64())
        .ok_or_else(|| {
            FeedError::Malformed(format!("Invalid volume {raw:?} for {symbol} on {date}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use rust_decimal_macros::dec;

    const DAILY_BODY: &str = r#"{
        "Meta Data": {"1. Information": "Daily Prices", "2. Symbol": "AAPL"},
        "Time Series (Daily)": {
            "2024-01-03": {"1. open": "184.2200", "2. high": "185.8800", "3. low": "183.4300", "4. close": "184.2500", "5. volume": "58414460"},
            "2024-01-02": {"1. open": "187.1500", "2. high": "188.4400", "3. low": "183.8850", "4. close": "185.6400", "5. volume": "82488674"}
        }
    }"#;

    const ADJUSTED_BODY: &str = r#"{
        "Time Series (Daily Adjusted)": {
            "2024-01-02": {"1. open": "187.15", "2. high": "188.44", "3. low": "183.885", "4. close": "185.64",
                           "5. adjusted close": "184.9", "6. volume": "82488674",
                           "7. dividend amount": "0.0000", "8. split coefficient": "1.0"}
        }
    }"#;

    const RATE_LIMIT_BODY: &str = r#"{"Information": "We have detected your API key as XXXX and our standard API rate limit is 25 requests per day. Please subscribe to any of the premium plans at https://www.alphavantage.co/premium/ to instantly remove all daily rate limits."}"#;

    const PREMIUM_BODY: &str = r#"{"Information": "Thank you for using Alpha Vantage! This is a premium endpoint. You may subscribe to any of the premium plans at https://www.alphavantage.co/premium/ to instantly unlock all premium endpoints"}"#;

    fn parse(body: &str) -> TimeSeriesResponse {
        serde_json::from_str(body).unwrap()
    }

    fn provider_for(server: &mockito::ServerGuard) -> AlphaVantageProvider {
        AlphaVantageProvider::new("test_key")
            .unwrap()
            .with_base_url(format!("{}/query", server.url()))
    }

    fn function_is(name: &str) -> Matcher {
        Matcher::UrlEncoded("function".into(), name.into())
    }

    #[test]
    fn test_query_params() {
        let provider = AlphaVantageProvider::new("test_key").unwrap();
        let params = provider.query_params(
            &Symbol::new("aapl"),
            SeriesVariant::DailyAdjusted,
            OutputSize::Full,
        );
        assert_eq!(params[0], ("function", "TIME_SERIES_DAILY_ADJUSTED".to_string()));
        assert_eq!(params[1], ("symbol", "AAPL".to_string()));
        assert_eq!(params[3], ("outputsize", "full".to_string()));
        assert_eq!(params[4], ("apikey", "test_key".to_string()));
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = AlphaVantageProvider::new("  ").unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn test_provider_metadata() {
        let provider = AlphaVantageProvider::new("test_key").unwrap();
        assert_eq!(provider.name(), "alphavantage");
        assert!(!provider.description().is_empty());
        assert_eq!(provider.preferred_variant(), SeriesVariant::Daily);
        assert_eq!(
            provider.with_adjusted_preference(true).preferred_variant(),
            SeriesVariant::DailyAdjusted
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = AlphaVantageProvider::new("secret_key_12345").unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_classify_rate_limit() {
        assert!(matches!(
            classify_response(parse(RATE_LIMIT_BODY)),
            ResponseClass::RateLimit(_)
        ));
        let note = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        assert!(matches!(
            classify_response(parse(note)),
            ResponseClass::RateLimit(_)
        ));
    }

    #[test]
    fn test_classify_premium() {
        assert!(matches!(
            classify_response(parse(PREMIUM_BODY)),
            ResponseClass::PremiumGated(_)
        ));
        let in_error = r#"{"Error Message": "This is a premium endpoint for TIME_SERIES_DAILY_ADJUSTED."}"#;
        assert!(matches!(
            classify_response(parse(in_error)),
            ResponseClass::PremiumGated(_)
        ));
    }

    #[test]
    fn test_classify_error_message_and_missing_series() {
        let invalid = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        match classify_response(parse(invalid)) {
            ResponseClass::Malformed(message) => assert!(message.starts_with("Invalid API call")),
            other => panic!("unexpected classification: {other:?}"),
        }
        assert!(matches!(
            classify_response(parse("{}")),
            ResponseClass::Malformed(_)
        ));
    }

    #[test]
    fn test_normalize_sorts_ascending() {
        let ResponseClass::Series(series) = classify_response(parse(DAILY_BODY)) else {
            panic!("expected a series");
        };
        let rows = normalize_series(&Symbol::new("AAPL"), series).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].trade_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rows[0].open, dec!(187.1500));
        assert_eq!(rows[0].volume, 82_488_674);
        assert_eq!(rows[1].close, dec!(184.2500));
    }

    #[test]
    fn test_normalize_adjusted_volume_alias() {
        let ResponseClass::Series(series) = classify_response(parse(ADJUSTED_BODY)) else {
            panic!("expected a series");
        };
        let rows = normalize_series(&Symbol::new("AAPL"), series).unwrap();
        assert_eq!(rows[0].volume, 82_488_674);
        // The raw close is kept, not the adjusted close.
        assert_eq!(rows[0].close, dec!(185.64));
    }

    #[test]
    fn test_normalize_rejects_bad_price() {
        let body = r#"{"Time Series (Daily)": {"2024-01-02": {"1. open": "n/a", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}}}"#;
        let ResponseClass::Series(series) = classify_response(parse(body)) else {
            panic!("expected a series");
        };
        let err = normalize_series(&Symbol::new("AAPL"), series).unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }

    #[test]
    fn test_parse_volume_variants() {
        let symbol = Symbol::new("BTC");
        assert_eq!(parse_volume(None, &symbol, "2024-01-02").unwrap(), 0);
        assert_eq!(parse_volume(Some("1200"), &symbol, "2024-01-02").unwrap(), 1200);
        assert_eq!(parse_volume(Some("1200.75"), &symbol, "2024-01-02").unwrap(), 1200);
        assert!(parse_volume(Some("-5"), &symbol, "2024-01-02").is_err());
    }

    #[tokio::test]
    async fn test_fetch_daily_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(Matcher::AllOf(vec![
                function_is("TIME_SERIES_DAILY"),
                Matcher::UrlEncoded("symbol".into(), "AAPL".into()),
                Matcher::UrlEncoded("outputsize".into(), "compact".into()),
                Matcher::UrlEncoded("apikey".into(), "test_key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(DAILY_BODY)
            .expect(1)
            .create_async()
            .await;

        let rows = provider_for(&server)
            .fetch_daily(&Symbol::new("AAPL"), OutputSize::Compact)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_premium_falls_back_to_unadjusted() {
        let mut server = mockito::Server::new_async().await;
        let adjusted = server
            .mock("GET", "/query")
            .match_query(function_is("TIME_SERIES_DAILY_ADJUSTED"))
            .with_status(200)
            .with_body(PREMIUM_BODY)
            .expect(1)
            .create_async()
            .await;
        let daily = server
            .mock("GET", "/query")
            .match_query(function_is("TIME_SERIES_DAILY"))
            .with_status(200)
            .with_body(DAILY_BODY)
            .expect(1)
            .create_async()
            .await;

        let rows = provider_for(&server)
            .with_adjusted_preference(true)
            .fetch_daily(&Symbol::new("AAPL"), OutputSize::Full)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        adjusted.assert_async().await;
        daily.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_after_premium_fallback() {
        let mut server = mockito::Server::new_async().await;
        let adjusted = server
            .mock("GET", "/query")
            .match_query(function_is("TIME_SERIES_DAILY_ADJUSTED"))
            .with_status(200)
            .with_body(PREMIUM_BODY)
            .expect(1)
            .create_async()
            .await;
        let daily = server
            .mock("GET", "/query")
            .match_query(function_is("TIME_SERIES_DAILY"))
            .with_status(200)
            .with_body(RATE_LIMIT_BODY)
            .expect(1)
            .create_async()
            .await;

        let err = provider_for(&server)
            .with_adjusted_preference(true)
            .fetch_daily(&Symbol::new("AAPL"), OutputSize::Compact)
            .await
            .unwrap_err();

        assert!(err.is_rate_limit());
        assert!(!matches!(err, FeedError::PremiumGated { .. }));
        adjusted.assert_async().await;
        daily.assert_async().await;
    }

    #[tokio::test]
    async fn test_premium_without_adjusted_preference_surfaces() {
        let mut server = mockito::Server::new_async().await;
        let daily = server
            .mock("GET", "/query")
            .match_query(function_is("TIME_SERIES_DAILY"))
            .with_status(200)
            .with_body(PREMIUM_BODY)
            .expect(1)
            .create_async()
            .await;

        let err = provider_for(&server)
            .fetch_daily(&Symbol::new("AAPL"), OutputSize::Compact)
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::PremiumGated { .. }));
        daily.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_is_distinct() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(RATE_LIMIT_BODY)
            .create_async()
            .await;

        let err = provider_for(&server)
            .fetch_daily(&Symbol::new("MSFT"), OutputSize::Compact)
            .await
            .unwrap_err();

        assert!(err.is_rate_limit());
    }

    #[tokio::test]
    async fn test_http_error_is_transport() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let err = provider_for(&server)
            .fetch_daily(&Symbol::new("MSFT"), OutputSize::Compact)
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::Network(_)));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = provider_for(&server)
            .fetch_daily(&Symbol::new("MSFT"), OutputSize::Compact)
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::Malformed(_)));
    }
}

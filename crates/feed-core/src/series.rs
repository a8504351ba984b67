//! Output size and series variant definitions.
//!
//! This module defines [`OutputSize`], the provider hint for how much history to return,
//! and [`SeriesVariant`], which selects between the adjusted and unadjusted daily series.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FeedError;

/// Lookbacks longer than this many days need a full-history fetch.
pub const FULL_OUTPUT_THRESHOLD_DAYS: u32 = 95;

/// How much history the provider should return.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// Roughly the most recent 100 data points.
    #[default]
    Compact,
    /// The entire available history.
    Full,
}

impl OutputSize {
    /// Picks the output size needed to cover `lookback_days` of history.
    #[must_use]
    pub const fn for_lookback(lookback_days: u32) -> Self {
        if lookback_days > FULL_OUTPUT_THRESHOLD_DAYS {
            Self::Full
        } else {
            Self::Compact
        }
    }

    /// Returns the wire value sent to the provider.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputSize {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            other => Err(FeedError::InvalidParameter(format!(
                "Unknown output size: {other}. Supported: compact, full"
            ))),
        }
    }
}

/// Which daily series the provider should serve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesVariant {
    /// Raw daily prices, available on every tier.
    #[default]
    Daily,
    /// Split/dividend adjusted daily prices, possibly gated behind a paid tier.
    DailyAdjusted,
}

impl SeriesVariant {
    /// Returns the provider function name for this variant.
    #[must_use]
    pub const fn function_name(&self) -> &'static str {
        match self {
            Self::Daily => "TIME_SERIES_DAILY",
            Self::DailyAdjusted => "TIME_SERIES_DAILY_ADJUSTED",
        }
    }

    /// Returns the variant to fall back to when this one is gated, if any.
    #[must_use]
    pub const fn fallback(&self) -> Option<Self> {
        match self {
            Self::DailyAdjusted => Some(Self::Daily),
            Self::Daily => None,
        }
    }
}

//! Error types for ingestion operations.
//!
//! This module defines [`FeedError`], which covers every failure that can occur while
//! fetching, classifying, or persisting daily price data, and [`FailureKind`], the
//! tagged classification the orchestrator branches on.

use thiserror::Error;

/// Errors that can occur during an ingestion run.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Missing or invalid configuration (for example an absent API key).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider reports that its daily call cap has been reached.
    #[error("Rate limited by {provider}: {message}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// The sentinel text the provider returned.
        message: String,
    },

    /// The requested series variant requires a paid tier.
    #[error("Premium endpoint at {provider} for {symbol}: {message}")]
    PremiumGated {
        /// The provider that gated the request.
        provider: String,
        /// The symbol that was requested.
        symbol: String,
        /// The sentinel text the provider returned.
        message: String,
    },

    /// The provider answered, but with an error message or a payload we cannot use.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Network-related errors (connection failures, timeouts, non-success status).
    #[error("Network error: {0}")]
    Network(String),

    /// Error reading or writing the price or quota store.
    #[error("Store error: {0}")]
    Store(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Coarse classification of a [`FeedError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Provider-confirmed daily cap exhaustion. Halts the run.
    RateLimit,
    /// Paid-tier gating of a series variant.
    PremiumGated,
    /// Unusable payload or provider-side error message.
    Malformed,
    /// The request never produced a usable HTTP response.
    Transport,
    /// Local persistence failure.
    Store,
    /// Configuration or parameter problem.
    Config,
}

impl FeedError {
    /// Returns the tagged classification of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::RateLimited { .. } => FailureKind::RateLimit,
            Self::PremiumGated { .. } => FailureKind::PremiumGated,
            Self::Malformed(_) => FailureKind::Malformed,
            Self::Network(_) => FailureKind::Transport,
            Self::Store(_) => FailureKind::Store,
            Self::Config(_) | Self::InvalidParameter(_) => FailureKind::Config,
        }
    }

    /// Returns true if this error means no further provider calls can succeed today.
    #[must_use]
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Result type alias using [`FeedError`].
pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let limited = FeedError::RateLimited {
            provider: "alphavantage".to_string(),
            message: "25 requests per day".to_string(),
        };
        assert_eq!(limited.kind(), FailureKind::RateLimit);
        assert!(limited.is_rate_limit());

        let gated = FeedError::PremiumGated {
            provider: "alphavantage".to_string(),
            symbol: "AAPL".to_string(),
            message: "premium endpoint".to_string(),
        };
        assert_eq!(gated.kind(), FailureKind::PremiumGated);
        assert!(!gated.is_rate_limit());

        assert_eq!(FeedError::Network("timeout".into()).kind(), FailureKind::Transport);
        assert_eq!(FeedError::Malformed("no series".into()).kind(), FailureKind::Malformed);
        assert_eq!(FeedError::Config("no key".into()).kind(), FailureKind::Config);
    }

    #[test]
    fn test_display() {
        let err = FeedError::Config("missing ALPHAVANTAGE_API_KEY".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing ALPHAVANTAGE_API_KEY");
    }
}

//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over where daily prices come from so the
//! analyzer can be driven by Yahoo Finance in production and by in-memory
//! mocks in tests.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{InputError, PriceSeries};

/// Structured error types for data operations.
///
/// These are displayable as-is at the CLI boundary.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no data for {symbol} between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("provider {provider} is unavailable")]
    Unavailable { provider: String },

    #[error("provider returned an unusable series: {0}")]
    InvalidSeries(#[from] InputError),

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for daily price providers.
///
/// `start` is inclusive and `end` is exclusive. An empty result is reported as
/// `DataError::NoData`, never as an empty series.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a symbol over `[start, end)`.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<PriceSeries, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

//! Bar provider trait and structured feed errors.
//!
//! The BarProvider trait abstracts over data sources (Binance, CryptoCompare,
//! synthetic) so the failover chain can swap implementations and tests can
//! mock them. The driver sits above this trait — providers know nothing about
//! the engine.

use chrono::{DateTime, Utc};
use cisd_core::domain::Bar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw candlestick from a provider, times in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawKline {
    pub open_time_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time_ms: i64,
}

impl RawKline {
    /// Convert to a domain bar, stamped with the candle's close time.
    pub fn into_bar(self) -> Result<Bar, FeedError> {
        let time = DateTime::<Utc>::from_timestamp_millis(self.close_time_ms).ok_or_else(|| {
            FeedError::Format(format!("close time {} out of range", self.close_time_ms))
        })?;
        Ok(Bar {
            time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

/// Result of one fetch: fully closed candles, oldest first, plus the
/// still-forming candle when the provider reports one.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub closed: Vec<RawKline>,
    pub current: Option<RawKline>,
}

/// Structured error types for feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("{provider} refused the request (HTTP {status})")]
    Blocked { provider: String, status: u16 },

    #[error("unexpected HTTP {status} from {provider}")]
    Status { provider: String, status: u16 },

    #[error("response format changed: {0}")]
    Format(String),

    #[error("unsupported interval '{0}'")]
    Interval(String),

    #[error("all providers failed; last error: {last}")]
    Exhausted { last: String },
}

impl FeedError {
    /// Map a transport error onto the timeout/network split.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else {
            FeedError::Network(err.to_string())
        }
    }
}

/// A source of candlestick data for one symbol/timeframe.
///
/// Implementations must be callable from the failover chain's worker
/// threads, hence `Send + Sync`.
pub trait BarProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch the most recent `limit` candles for `symbol` at `interval`
    /// (e.g. "1m", "5m", "1h").
    fn fetch_latest(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<FetchOutcome, FeedError>;
}

/// Parse an interval string like "1m", "15m", "4h" into milliseconds.
///
/// The string comes straight from config, so anything malformed (including
/// a multi-byte final character) must come back as `FeedError::Interval`.
pub fn interval_ms(interval: &str) -> Result<i64, FeedError> {
    let err = || FeedError::Interval(interval.to_string());
    let unit = interval.chars().last().ok_or_else(err)?;
    let digits = &interval[..interval.len() - unit.len_utf8()];
    let n: i64 = digits.parse().map_err(|_| err())?;
    if n < 1 {
        return Err(err());
    }
    match unit {
        'm' => Ok(n * 60_000),
        'h' => Ok(n * 3_600_000),
        'd' => Ok(n * 86_400_000),
        _ => Err(err()),
    }
}

//! Binance klines provider.
//!
//! Fetches candles from the public `/api/v3/klines` endpoint. The response
//! is an array of heterogeneous arrays with prices as strings; the final
//! entry is usually the still-forming candle, which is split out by close
//! time. Binance geo-blocks some regions with HTTP 451/403 — those surface
//! as [`FeedError::Blocked`] so the failover chain can move on.

use crate::provider::{BarProvider, FeedError, FetchOutcome, RawKline};
use chrono::Utc;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";

pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceProvider {
    pub fn new() -> Result<Self, FeedError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at a different host (mirror or test server).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(FeedError::from_transport)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// One kline row: `[open_time, "open", "high", "low", "close", "volume",
    /// close_time, ...]`. Trailing fields are ignored.
    fn parse_row(row: &[Value]) -> Result<RawKline, FeedError> {
        fn int(v: Option<&Value>, what: &str) -> Result<i64, FeedError> {
            v.and_then(Value::as_i64)
                .ok_or_else(|| FeedError::Format(format!("kline missing {what}")))
        }
        fn num(v: Option<&Value>, what: &str) -> Result<f64, FeedError> {
            v.and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
                .ok_or_else(|| FeedError::Format(format!("kline missing {what}")))
        }

        Ok(RawKline {
            open_time_ms: int(row.first(), "open time")?,
            open: num(row.get(1), "open")?,
            high: num(row.get(2), "high")?,
            low: num(row.get(3), "low")?,
            close: num(row.get(4), "close")?,
            volume: num(row.get(5), "volume")?,
            close_time_ms: int(row.get(6), "close time")?,
        })
    }
}

impl BarProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch_latest(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<FetchOutcome, FeedError> {
        let url = format!(
            "{}/api/v3/klines?symbol={symbol}&interval={interval}&limit={limit}",
            self.base_url
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(FeedError::from_transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(FeedError::Blocked {
                provider: self.name().to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FeedError::Status {
                provider: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        let rows: Vec<Vec<Value>> = resp
            .json()
            .map_err(|e| FeedError::Format(format!("klines payload: {e}")))?;

        let now_ms = Utc::now().timestamp_millis();
        let mut outcome = FetchOutcome::default();
        for row in &rows {
            let kline = Self::parse_row(row)?;
            if kline.close_time_ms > now_ms {
                outcome.current = Some(kline);
            } else {
                outcome.closed.push(kline);
            }
        }
        Ok(outcome)
    }
}

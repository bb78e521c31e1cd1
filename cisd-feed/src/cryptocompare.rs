//! CryptoCompare histominute/histohour provider.
//!
//! Serves as the fallback when Binance is unreachable or geo-blocked. The
//! API wants the pair split into base and quote currencies and reports one
//! object per candle keyed by the candle's open second.

use crate::provider::{interval_ms, BarProvider, FeedError, FetchOutcome, RawKline};
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com";

/// Quote currencies recognized when splitting a concatenated pair.
const KNOWN_QUOTES: &[&str] = &["USDT", "USDC", "BUSD", "USD", "EUR", "BTC", "ETH"];

#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data")]
    data: Option<HistoData>,
}

#[derive(Debug, Deserialize)]
struct HistoData {
    #[serde(rename = "Data")]
    points: Vec<HistoPoint>,
}

#[derive(Debug, Deserialize)]
struct HistoPoint {
    /// Candle open time in epoch seconds.
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volumefrom: f64,
}

pub struct CryptoCompareProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl CryptoCompareProvider {
    pub fn new() -> Result<Self, FeedError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

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

    /// Split "BTCUSDT" into ("BTC", "USDT") by recognized quote suffix.
    fn split_pair(symbol: &str) -> Result<(&str, &str), FeedError> {
        for quote in KNOWN_QUOTES {
            if let Some(base) = symbol.strip_suffix(quote) {
                if !base.is_empty() {
                    return Ok((base, quote));
                }
            }
        }
        Err(FeedError::Format(format!(
            "cannot split pair '{symbol}' into base/quote"
        )))
    }

    /// Endpoint and aggregate for an interval: minutes use histominute,
    /// whole hours use histohour.
    fn endpoint_for(interval: &str) -> Result<(&'static str, i64), FeedError> {
        let ms = interval_ms(interval)?;
        if ms % 3_600_000 == 0 {
            Ok(("histohour", ms / 3_600_000))
        } else if ms % 60_000 == 0 {
            Ok(("histominute", ms / 60_000))
        } else {
            Err(FeedError::Interval(interval.to_string()))
        }
    }
}

impl BarProvider for CryptoCompareProvider {
    fn name(&self) -> &str {
        "cryptocompare"
    }

    fn fetch_latest(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<FetchOutcome, FeedError> {
        let (fsym, tsym) = Self::split_pair(symbol)?;
        let (endpoint, aggregate) = Self::endpoint_for(interval)?;
        let candle_ms = interval_ms(interval)?;

        let url = format!(
            "{}/data/v2/{endpoint}?fsym={fsym}&tsym={tsym}&limit={limit}&aggregate={aggregate}",
            self.base_url
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(FeedError::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                provider: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        let parsed: HistoResponse = resp
            .json()
            .map_err(|e| FeedError::Format(format!("histo payload: {e}")))?;
        if parsed.response != "Success" {
            return Err(FeedError::Format(format!(
                "cryptocompare error: {}",
                parsed.message
            )));
        }
        let points = parsed
            .data
            .ok_or_else(|| FeedError::Format("missing Data".into()))?
            .points;

        // The API includes the currently-forming candle as the last point.
        let now_ms = Utc::now().timestamp_millis();
        let mut outcome = FetchOutcome::default();
        for p in points {
            let open_time_ms = p.time * 1_000;
            let kline = RawKline {
                open_time_ms,
                open: p.open,
                high: p.high,
                low: p.low,
                close: p.close,
                volume: p.volumefrom,
                close_time_ms: open_time_ms + candle_ms - 1,
            };
            if kline.close_time_ms > now_ms {
                outcome.current = Some(kline);
            } else {
                outcome.closed.push(kline);
            }
        }
        Ok(outcome)
    }
}
